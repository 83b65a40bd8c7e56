//! Audio analysis over a bounded duration window.
//!
//! Reads PCM16 WAV directly (no codec crate in the stack covers audio),
//! mixes down to mono, and derives windowed statistics: RMS consistency,
//! zero-crossing spread, energy variance, dynamic range, and silence
//! segmentation. Analysis is capped at 30 seconds of samples.

use signals::{Anomaly, DetectionSignal, MediaKind, Severity, SignalSource};
use tracing::debug;

use crate::{DetectError, Detector, Result};

const MODEL_ID: &str = "lightweight-dsp/1.0";

/// Samples per analysis window (64 ms at 16 kHz).
const WINDOW_SAMPLES: usize = 1024;
const MAX_SECONDS: u32 = 30;

const ZCR_STD_ROBOTIC: f64 = 0.005;
const RMS_STD_FLAT: f64 = 0.02;
const ENERGY_VAR_FLAT: f64 = 1e-4;
const DYNAMIC_RANGE_COMPRESSED: f64 = 0.1;

/// Windows quieter than this fraction of the mean RMS count as silence.
const SILENCE_FRACTION: f64 = 0.1;

pub struct AudioDetector;

impl AudioDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AudioDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for AudioDetector {
    fn kind(&self) -> MediaKind {
        MediaKind::Audio
    }

    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn analyze(&self, bytes: &[u8]) -> Result<DetectionSignal> {
        let pcm = decode_wav_pcm16(bytes)?;
        let samples = &pcm.samples;
        if samples.len() < WINDOW_SAMPLES {
            return Err(DetectError::UnsupportedMedia {
                kind: MediaKind::Audio,
                reason: "audio too short to analyze".to_string(),
            });
        }

        let windows: Vec<&[f64]> = samples.chunks_exact(WINDOW_SAMPLES).collect();
        let rms: Vec<f64> = windows.iter().map(|w| rms_of(w)).collect();
        let zcr: Vec<f64> = windows.iter().map(|w| zcr_of(w)).collect();
        let energy: Vec<f64> = rms.iter().map(|r| r * r).collect();

        let (rms_mean, rms_var) = mean_and_variance(&rms);
        let rms_std = rms_var.sqrt();
        let (_, zcr_var) = mean_and_variance(&zcr);
        let zcr_std = zcr_var.sqrt();
        let (_, energy_var) = mean_and_variance(&energy);

        let max = samples.iter().cloned().fold(f64::MIN, f64::max);
        let min = samples.iter().cloned().fold(f64::MAX, f64::min);
        let dynamic_range = max - min;

        let silence_threshold = rms_mean * SILENCE_FRACTION;
        let mut silence_segments = 0usize;
        let mut in_silence = false;
        for r in &rms {
            let silent = *r < silence_threshold;
            if silent && !in_silence {
                silence_segments += 1;
            }
            in_silence = silent;
        }

        debug!(
            windows = windows.len(),
            rms_std, zcr_std, energy_var, dynamic_range, silence_segments, "audio features"
        );

        let mut suspicion: f64 = 0.0;
        let mut anomalies = Vec::new();

        if zcr_std < ZCR_STD_ROBOTIC {
            suspicion += 0.2;
            anomalies.push(Anomaly::new(
                "unnatural voice consistency",
                Severity::Medium,
                "waveform periodicity too consistent for natural speech",
            ));
        }

        if rms_std < RMS_STD_FLAT {
            suspicion += 0.15;
            anomalies.push(Anomaly::new(
                "volume consistency",
                Severity::Medium,
                "audio volume artificially consistent",
            ));
        }

        if energy_var < ENERGY_VAR_FLAT {
            suspicion += 0.15;
            anomalies.push(Anomaly::new(
                "spectral consistency",
                Severity::Medium,
                "energy distribution too consistent, possibly synthesized",
            ));
        }

        if dynamic_range < DYNAMIC_RANGE_COMPRESSED {
            suspicion += 0.15;
            anomalies.push(Anomaly::new(
                "limited dynamic range",
                Severity::Medium,
                "dynamic range suggests artificial processing",
            ));
        }

        // Natural speech pauses; only meaningful past a few seconds.
        let seconds = samples.len() as f64 / pcm.sample_rate as f64;
        if seconds >= 4.0 && silence_segments < 2 {
            suspicion += 0.1;
            anomalies.push(Anomaly::new(
                "unnatural silence pattern",
                Severity::Medium,
                "missing natural speech pauses",
            ));
        }

        let score = (1.0 - suspicion).clamp(0.0, 1.0);
        Ok(DetectionSignal::available(SignalSource::LocalDetector, score, MODEL_ID)
            .with_anomalies(anomalies))
    }
}

struct PcmAudio {
    samples: Vec<f64>,
    sample_rate: u32,
}

/// Minimal RIFF/WAVE reader for PCM16. Anything else is unsupported media.
fn decode_wav_pcm16(bytes: &[u8]) -> Result<PcmAudio> {
    let unsupported = |reason: &str| DetectError::UnsupportedMedia {
        kind: MediaKind::Audio,
        reason: reason.to_string(),
    };

    if bytes.len() < 44 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(unsupported("not a RIFF/WAVE stream"));
    }

    let mut pos = 12;
    let mut format: Option<(u16, u16, u32, u16)> = None;
    let mut data: Option<&[u8]> = None;

    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_end = (pos + 8).saturating_add(size).min(bytes.len());
        let body = &bytes[pos + 8..body_end];

        match id {
            b"fmt " if body.len() >= 16 => {
                let audio_format = u16::from_le_bytes(body[0..2].try_into().unwrap());
                let channels = u16::from_le_bytes(body[2..4].try_into().unwrap());
                let sample_rate = u32::from_le_bytes(body[4..8].try_into().unwrap());
                let bits = u16::from_le_bytes(body[14..16].try_into().unwrap());
                format = Some((audio_format, channels, sample_rate, bits));
            }
            b"data" => {
                data = Some(body);
            }
            _ => {}
        }
        // Chunks are word-aligned.
        pos = body_end + (size % 2);
    }

    let (audio_format, channels, sample_rate, bits) =
        format.ok_or_else(|| unsupported("missing fmt chunk"))?;
    if audio_format != 1 || bits != 16 {
        return Err(unsupported("only PCM16 WAV is supported"));
    }
    if channels == 0 || sample_rate == 0 {
        return Err(unsupported("invalid fmt chunk"));
    }
    let data = data.ok_or_else(|| unsupported("missing data chunk"))?;

    let channels = channels as usize;
    let frame_bytes = channels * 2;
    let max_frames = (sample_rate as usize) * MAX_SECONDS as usize;
    let frames = (data.len() / frame_bytes).min(max_frames);

    let mut samples = Vec::with_capacity(frames);
    for frame in 0..frames {
        let mut acc = 0.0;
        for ch in 0..channels {
            let off = frame * frame_bytes + ch * 2;
            let v = i16::from_le_bytes(data[off..off + 2].try_into().unwrap());
            acc += v as f64 / i16::MAX as f64;
        }
        samples.push(acc / channels as f64);
    }

    Ok(PcmAudio {
        samples,
        sample_rate,
    })
}

fn rms_of(window: &[f64]) -> f64 {
    (window.iter().map(|s| s * s).sum::<f64>() / window.len() as f64).sqrt()
}

fn zcr_of(window: &[f64]) -> f64 {
    let crossings = window
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f64 / window.len() as f64
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 16_000;

    fn wav_from_samples(samples: &[i16], channels: u16) -> Vec<u8> {
        let data_len = samples.len() * 2;
        let mut out = Vec::with_capacity(44 + data_len);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&RATE.to_le_bytes());
        let byte_rate = RATE * channels as u32 * 2;
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&((channels * 2) as u16).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data_len as u32).to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    /// Speech-like: bursts of varying tone separated by near-silence.
    fn speechlike_samples(seconds: usize) -> Vec<i16> {
        let total = RATE as usize * seconds;
        let mut samples = Vec::with_capacity(total);
        let mut noise: u32 = 0x1234_5678;
        for i in 0..total {
            // ~0.8 s voiced bursts with ~0.2 s gaps.
            let phase = i % RATE as usize;
            let voiced = phase < (RATE as usize * 4) / 5;
            if voiced {
                let t = i as f64 / RATE as f64;
                let f = 120.0 + 60.0 * ((i / (RATE as usize / 2)) % 4) as f64;
                noise ^= noise << 13;
                noise ^= noise >> 17;
                noise ^= noise << 5;
                let jitter = ((noise >> 16) as i32 - 32768) as f64 / 32768.0;
                let amp = 0.4 + 0.3 * ((i / (RATE as usize / 4)) % 3) as f64 / 2.0;
                let v = amp * (2.0 * std::f64::consts::PI * f * t).sin() + 0.05 * jitter;
                samples.push((v.clamp(-1.0, 1.0) * i16::MAX as f64) as i16);
            } else {
                samples.push(0);
            }
        }
        samples
    }

    /// Constant low-amplitude tone: flat volume, flat periodicity.
    fn robotic_samples(seconds: usize) -> Vec<i16> {
        let total = RATE as usize * seconds;
        (0..total)
            .map(|i| {
                let t = i as f64 / RATE as f64;
                let v = 0.02 * (2.0 * std::f64::consts::PI * 200.0 * t).sin();
                (v * i16::MAX as f64) as i16
            })
            .collect()
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let err = AudioDetector::new().analyze(b"definitely not wav").unwrap_err();
        assert!(matches!(
            err,
            DetectError::UnsupportedMedia {
                kind: MediaKind::Audio,
                ..
            }
        ));
    }

    #[test]
    fn float_wav_is_unsupported() {
        let mut bytes = wav_from_samples(&vec![0i16; RATE as usize], 1);
        // Patch the format tag to IEEE float.
        bytes[20] = 3;
        assert!(AudioDetector::new().analyze(&bytes).is_err());
    }

    #[test]
    fn robotic_tone_flags_consistency() {
        let bytes = wav_from_samples(&robotic_samples(6), 1);
        let signal = AudioDetector::new().analyze(&bytes).unwrap();
        let kinds: Vec<&str> = signal.anomalies.iter().map(|a| a.kind.as_str()).collect();
        assert!(kinds.contains(&"volume consistency"));
        assert!(kinds.contains(&"limited dynamic range"));
        assert!(kinds.contains(&"unnatural silence pattern"));
        assert!(signal.score.unwrap() < 0.7);
    }

    #[test]
    fn speechlike_audio_outranks_robotic_tone() {
        let detector = AudioDetector::new();
        let speech = detector
            .analyze(&wav_from_samples(&speechlike_samples(6), 1))
            .unwrap();
        let robotic = detector
            .analyze(&wav_from_samples(&robotic_samples(6), 1))
            .unwrap();
        assert!(speech.score.unwrap() > robotic.score.unwrap());
    }

    #[test]
    fn stereo_downmix_is_accepted() {
        let mono = speechlike_samples(5);
        let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
        let signal = AudioDetector::new().analyze(&wav_from_samples(&stereo, 2)).unwrap();
        assert!(signal.available);
    }

    #[test]
    fn analysis_window_is_bounded() {
        // 35 s of audio; only the first 30 s are read.
        let bytes = wav_from_samples(&speechlike_samples(35), 1);
        let signal = AudioDetector::new().analyze(&bytes).unwrap();
        assert!(signal.available);
    }
}
