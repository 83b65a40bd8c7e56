//! Weighted aggregation of detection signals.

use serde::{Deserialize, Serialize};
use signals::{Anomaly, DetectionSignal};
use tracing::debug;

use crate::{AggregateError, ScorePolicy, Verdict};

/// One source's raw contribution, kept for the externally visible record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub name: String,
    pub available: bool,
    pub score: Option<f64>,
    pub model: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregateResult {
    pub trust_score: u8,
    pub verdict: Verdict,
    pub sources: Vec<SourceBreakdown>,
    pub anomalies: Vec<Anomaly>,
}

/// Combine available signals into one trust score and verdict.
///
/// The weighted sum is renormalized over the weights of available sources
/// only, so a degraded request is never penalized for the sources that
/// could not run: with only the local detector present the trust score is
/// exactly `round(local_score * 100)`. When nothing is available this
/// fails with [`AggregateError::NoSignal`] instead of fabricating a score.
pub fn aggregate(
    signals: Vec<DetectionSignal>,
    policy: &ScorePolicy,
) -> Result<AggregateResult, AggregateError> {
    // Source-priority order drives both the breakdown and the merged
    // anomaly list: local first, then cloud, then news.
    let mut signals = signals;
    signals.sort_by_key(|s| s.source);

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for signal in signals.iter().filter(|s| s.available) {
        if let Some(score) = signal.score {
            let weight = policy.weights.for_source(signal.source);
            weighted_sum += score * weight;
            weight_total += weight;
        }
    }

    if weight_total <= 0.0 {
        return Err(AggregateError::NoSignal);
    }

    let average = weighted_sum / weight_total;
    let trust_score = (average * 100.0).round().clamp(0.0, 100.0) as u8;
    let verdict = policy.thresholds.classify(trust_score);

    debug!(trust_score, %verdict, sources = signals.len(), "aggregated signals");

    let sources = signals
        .iter()
        .map(|s| SourceBreakdown {
            name: s.source.name().to_string(),
            available: s.available,
            score: s.score,
            model: s.model.clone(),
        })
        .collect();

    // Concatenation only; sources describe different failure modes even
    // when they overlap, so nothing is deduplicated.
    let anomalies = signals
        .into_iter()
        .filter(|s| s.available)
        .flat_map(|s| s.anomalies)
        .collect();

    Ok(AggregateResult {
        trust_score,
        verdict,
        sources,
        anomalies,
    })
}
