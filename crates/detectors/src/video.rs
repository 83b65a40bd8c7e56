//! Video stream analysis over a bounded frame sample.
//!
//! There is no full container demuxer here: the detector sniffs the
//! container magic, then scores up to `max_frames` evenly spaced windows of
//! the stream as frame proxies. Per-window statistics (entropy, byte
//! spread, histogram shape) stand in for the structural features a decoded
//! frame would give, and inter-window histogram distance stands in for
//! frame-to-frame continuity. The whole file is never read more than once
//! and never more than the sampled windows are analyzed.

use signals::{Anomaly, DetectionSignal, MediaKind, Severity, SignalSource};
use tracing::debug;

use crate::{DetectError, Detector, Result};

const MODEL_ID: &str = "lightweight-cv-video/1.0";

/// Bytes assumed to be container header/index, skipped before sampling.
const HEADER_SKIP: usize = 1024;
const WINDOW_BYTES: usize = 4096;
const MIN_WINDOWS: usize = 4;

/// Flagged-frame ratio above which the sample is temporally inconsistent.
const FLAGGED_RATIO_THRESHOLD: f64 = 0.5;

/// Per-window suspicion above which the window counts as flagged.
const WINDOW_FLAG_THRESHOLD: f64 = 0.4;

/// Normalized entropy below this reads as over-smoothed content.
const ENTROPY_SMOOTH: f64 = 0.55;
const BYTE_SPREAD_FLAT: f64 = 32.0;
const DOMINANT_BYTE_RATIO: f64 = 0.4;

/// Histogram L1 distance (max 2.0) thresholds for continuity checks.
const SUDDEN_CHANGE_DISTANCE: f64 = 0.8;
const STATIC_DISTANCE: f64 = 0.02;

pub struct VideoDetector {
    max_frames: usize,
}

impl VideoDetector {
    pub fn new(max_frames: usize) -> Self {
        Self {
            max_frames: max_frames.max(MIN_WINDOWS),
        }
    }
}

impl Default for VideoDetector {
    fn default() -> Self {
        Self::new(30)
    }
}

impl Detector for VideoDetector {
    fn kind(&self) -> MediaKind {
        MediaKind::Video
    }

    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn analyze(&self, bytes: &[u8]) -> Result<DetectionSignal> {
        sniff_container(bytes)?;

        let payload = &bytes[HEADER_SKIP.min(bytes.len())..];
        let window_count = (payload.len() / WINDOW_BYTES).min(self.max_frames);
        if window_count < MIN_WINDOWS {
            return Err(DetectError::UnsupportedMedia {
                kind: MediaKind::Video,
                reason: "video stream too short to sample".to_string(),
            });
        }

        // Evenly spaced sample across the payload; never the entire file.
        let stride = payload.len() / window_count;
        let windows: Vec<WindowStats> = (0..window_count)
            .map(|i| {
                let start = i * stride;
                WindowStats::from_bytes(&payload[start..start + WINDOW_BYTES])
            })
            .collect();

        let mut flagged = 0usize;
        let mut trust_sum = 0.0;
        for w in &windows {
            let suspicion = w.suspicion();
            if suspicion > WINDOW_FLAG_THRESHOLD {
                flagged += 1;
            }
            trust_sum += (1.0 - suspicion).clamp(0.0, 1.0);
        }
        let base_score = trust_sum / window_count as f64;
        let flagged_ratio = flagged as f64 / window_count as f64;

        let mut sudden_changes = 0usize;
        let mut static_pairs = 0usize;
        for pair in windows.windows(2) {
            let dist = pair[0].histogram_distance(&pair[1]);
            if dist > SUDDEN_CHANGE_DISTANCE {
                sudden_changes += 1;
            } else if dist < STATIC_DISTANCE {
                static_pairs += 1;
            }
        }

        debug!(
            window_count,
            flagged, sudden_changes, static_pairs, base_score, "video windows scored"
        );

        let mut anomalies = Vec::new();
        let mut continuity_penalty = 0.0;
        if flagged_ratio > FLAGGED_RATIO_THRESHOLD {
            anomalies.push(Anomaly::new(
                "temporal inconsistency",
                Severity::High,
                format!(
                    "{flagged} of {window_count} sampled frames look synthetic (ratio {flagged_ratio:.2})"
                ),
            ));
        }
        if sudden_changes > 2 {
            continuity_penalty += 0.05;
            anomalies.push(Anomaly::new(
                "sudden change",
                Severity::High,
                format!("{sudden_changes} abrupt discontinuities between sampled frames"),
            ));
        }
        if static_pairs * 2 > window_count {
            continuity_penalty += 0.05;
            anomalies.push(Anomaly::new(
                "static content",
                Severity::Medium,
                format!("{static_pairs} of {} frame transitions show no change", window_count - 1),
            ));
        }

        let score = (base_score - continuity_penalty).clamp(0.0, 1.0);

        Ok(DetectionSignal::available(SignalSource::LocalDetector, score, MODEL_ID)
            .with_anomalies(anomalies))
    }
}

fn sniff_container(bytes: &[u8]) -> Result<()> {
    let known = (bytes.len() >= 12 && &bytes[4..8] == b"ftyp")
        || (bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"AVI ")
        || (bytes.len() >= 4 && bytes[0..4] == [0x1A, 0x45, 0xDF, 0xA3]);
    if known {
        Ok(())
    } else {
        Err(DetectError::UnsupportedMedia {
            kind: MediaKind::Video,
            reason: "unrecognized video container".to_string(),
        })
    }
}

struct WindowStats {
    histogram: [f64; 256],
    entropy_norm: f64,
    byte_spread: f64,
    dominant_ratio: f64,
}

impl WindowStats {
    fn from_bytes(window: &[u8]) -> Self {
        let mut counts = [0u32; 256];
        for &b in window {
            counts[b as usize] += 1;
        }
        let n = window.len() as f64;

        let mut histogram = [0.0; 256];
        let mut entropy = 0.0;
        let mut dominant = 0.0f64;
        for (i, &c) in counts.iter().enumerate() {
            if c == 0 {
                continue;
            }
            let p = c as f64 / n;
            histogram[i] = p;
            entropy -= p * p.log2();
            dominant = dominant.max(p);
        }

        let mean = window.iter().map(|&b| b as f64).sum::<f64>() / n;
        let var = window
            .iter()
            .map(|&b| (b as f64 - mean) * (b as f64 - mean))
            .sum::<f64>()
            / n;

        Self {
            histogram,
            entropy_norm: entropy / 8.0,
            byte_spread: var.sqrt(),
            dominant_ratio: dominant,
        }
    }

    fn suspicion(&self) -> f64 {
        let mut suspicion = 0.0;
        if self.entropy_norm < ENTROPY_SMOOTH {
            suspicion += 0.3;
        }
        if self.byte_spread < BYTE_SPREAD_FLAT {
            suspicion += 0.2;
        }
        if self.dominant_ratio > DOMINANT_BYTE_RATIO {
            suspicion += 0.2;
        }
        suspicion
    }

    fn histogram_distance(&self, other: &Self) -> f64 {
        self.histogram
            .iter()
            .zip(other.histogram.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp4_header() -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_SKIP];
        bytes[4..8].copy_from_slice(b"ftyp");
        bytes[8..12].copy_from_slice(b"isom");
        bytes
    }

    /// Deterministic pseudo-noise, full byte range.
    fn noisy_payload(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x2545_f491;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 8) as u8
            })
            .collect()
    }

    #[test]
    fn unrecognized_container_is_unsupported() {
        let err = VideoDetector::default().analyze(&[0u8; 65536]).unwrap_err();
        assert!(matches!(
            err,
            DetectError::UnsupportedMedia {
                kind: MediaKind::Video,
                ..
            }
        ));
    }

    #[test]
    fn short_stream_is_unsupported() {
        let mut bytes = mp4_header();
        bytes.extend_from_slice(&noisy_payload(WINDOW_BYTES));
        let err = VideoDetector::default().analyze(&bytes).unwrap_err();
        assert!(matches!(err, DetectError::UnsupportedMedia { .. }));
    }

    #[test]
    fn noisy_stream_scores_high_without_flags() {
        let mut bytes = mp4_header();
        bytes.extend_from_slice(&noisy_payload(WINDOW_BYTES * 40));
        let signal = VideoDetector::default().analyze(&bytes).unwrap();
        let score = signal.score.unwrap();
        assert!(score > 0.9, "noisy stream scored {score}");
        assert!(!signal
            .anomalies
            .iter()
            .any(|a| a.kind == "temporal inconsistency"));
    }

    #[test]
    fn constant_stream_flags_temporal_inconsistency() {
        let mut bytes = mp4_header();
        bytes.extend_from_slice(&vec![0x41u8; WINDOW_BYTES * 40]);
        let signal = VideoDetector::default().analyze(&bytes).unwrap();

        let temporal = signal
            .anomalies
            .iter()
            .find(|a| a.kind == "temporal inconsistency")
            .expect("constant stream must flag every sampled frame");
        assert_eq!(temporal.severity, Severity::High);
        assert!(signal.score.unwrap() < 0.5);
        assert!(signal.anomalies.iter().any(|a| a.kind == "static content"));
    }

    #[test]
    fn sample_is_bounded_by_max_frames() {
        let mut bytes = mp4_header();
        bytes.extend_from_slice(&noisy_payload(WINDOW_BYTES * 400));
        // A tiny cap still works and never errors on a long stream.
        let signal = VideoDetector::new(8).analyze(&bytes).unwrap();
        assert!(signal.available);
    }
}
