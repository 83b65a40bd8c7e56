//! Analysis demo: the full pipeline in-process, no network, no database.
//!
//! Shows:
//! 1. Local detector scores a natural-sounding clip and a robotic one
//! 2. Aggregation renormalizes over the available sources
//! 3. A Real verdict registers the content hash
//! 4. Re-uploading the same bytes surfaces the first registration

use detectors::DetectorRegistry;
use ledger::{content_hash, MemoryLedger};
use signals::{DetectionSignal, MediaKind, SignalSource};
use verdict::{aggregate, assemble, ScorePolicy};

#[tokio::main]
async fn main() {
    println!("=== truthscan: in-process analysis demo ===\n");

    let registry = DetectorRegistry::with_defaults();
    let store = MemoryLedger::new();
    let policy = ScorePolicy::default();

    // 1. Two synthetic clips: natural-sounding speech vs a flat tone.
    let natural = wav_clip(6, ClipShape::Speechlike);
    let robotic = wav_clip(6, ClipShape::FlatTone);

    for (label, bytes, uploader) in [
        ("natural clip", &natural, "alice"),
        ("robotic clip", &robotic, "mallory"),
    ] {
        println!("-- analyzing {label} ({} bytes) --", bytes.len());

        let local = registry
            .analyze(bytes, MediaKind::Audio)
            .expect("clip decodes");
        println!("   local score: {:.3}", local.score.unwrap());
        for anomaly in &local.anomalies {
            println!("   anomaly [{:?}] {}: {}", anomaly.severity, anomaly.kind, anomaly.description);
        }

        // Adapters are offline in this demo; aggregation degrades
        // gracefully and the local detector alone decides.
        let signals = vec![
            local,
            DetectionSignal::unavailable(SignalSource::CloudVision, "offline demo"),
            DetectionSignal::unavailable(SignalSource::NewsSearch, "offline demo"),
        ];
        let result = aggregate(signals, &policy).expect("local signal available");
        println!("   trust score: {} -> {}", result.trust_score, result.verdict);

        let hash = content_hash(bytes);
        let report = assemble(result, hash, uploader, &store)
            .await
            .expect("memory ledger");
        println!(
            "   dedup: hash={}.. newly_registered={}",
            &report.dedup.hash[..16],
            report.dedup.newly_registered
        );
        println!();
    }

    // 2. Duplicate upload of the natural clip by someone else.
    println!("-- re-uploading the natural clip as bob --");
    let local = registry.analyze(&natural, MediaKind::Audio).unwrap();
    let result = aggregate(
        vec![local],
        &policy,
    )
    .unwrap();
    let report = assemble(result, content_hash(&natural), "bob", &store)
        .await
        .unwrap();
    println!(
        "   newly_registered={} first_seen_by={}",
        report.dedup.newly_registered,
        report.dedup.first_seen_by.as_deref().unwrap_or("-")
    );

    println!("\nfull report:\n{}", serde_json::to_string_pretty(&report).unwrap());
    println!("\nledger entries: {}", store.len());
}

enum ClipShape {
    Speechlike,
    FlatTone,
}

/// PCM16 WAV built in memory: voiced bursts with pauses, or one flat tone.
fn wav_clip(seconds: usize, shape: ClipShape) -> Vec<u8> {
    const RATE: u32 = 16_000;
    let total = RATE as usize * seconds;
    let mut noise: u32 = 0x9e37_79b9;

    let samples: Vec<i16> = (0..total)
        .map(|i| {
            let t = i as f64 / RATE as f64;
            let v = match shape {
                ClipShape::FlatTone => 0.02 * (2.0 * std::f64::consts::PI * 200.0 * t).sin(),
                ClipShape::Speechlike => {
                    let phase = i % RATE as usize;
                    if phase >= (RATE as usize * 4) / 5 {
                        0.0
                    } else {
                        noise ^= noise << 13;
                        noise ^= noise >> 17;
                        noise ^= noise << 5;
                        let jitter = ((noise >> 16) as i32 - 32768) as f64 / 32768.0;
                        let f = 120.0 + 60.0 * ((i / (RATE as usize / 2)) % 4) as f64;
                        let amp = 0.4 + 0.15 * ((i / (RATE as usize / 4)) % 3) as f64;
                        amp * (2.0 * std::f64::consts::PI * f * t).sin() + 0.05 * jitter
                    }
                }
            };
            (v.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
        })
        .collect();

    let data_len = samples.len() * 2;
    let mut out = Vec::with_capacity(44 + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_len) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&RATE.to_le_bytes());
    out.extend_from_slice(&(RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_len as u32).to_le_bytes());
    for s in &samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
