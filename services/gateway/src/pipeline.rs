//! The per-request analysis pipeline.
//!
//! The local detector runs on the blocking pool while both adapter checks
//! run concurrently under their own timeouts; aggregation starts only after
//! all three have settled. Nothing here holds state beyond the request: the
//! ledger is the only shared mutable resource and it serializes its own
//! inserts.

use std::sync::Arc;

use detectors::DetectError;
use ledger::{content_hash, LedgerError};
use signals::{DetectionSignal, MediaSubmission, SignalSource};
use thiserror::Error;
use tracing::warn;
use verdict::{aggregate, assemble, AggregateError, AnalysisReport};

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The media could not be parsed as its declared kind and no other
    /// source could stand in for the local detector.
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error(transparent)]
    NoSignal(#[from] AggregateError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub async fn run_analysis(
    state: &AppState,
    submission: MediaSubmission,
) -> Result<AnalysisReport, AnalyzeError> {
    let hash = content_hash(&submission.bytes);
    let uploader = submission.uploader.clone();
    let submission = Arc::new(submission);

    let registry = state.detectors.clone();
    let for_detector = submission.clone();
    let local_task =
        tokio::task::spawn_blocking(move || registry.analyze(&for_detector.bytes, for_detector.kind));

    let (local_join, cloud_signal, news_signal) = tokio::join!(
        local_task,
        check_source(state, &submission, SignalSource::CloudVision),
        check_source(state, &submission, SignalSource::NewsSearch),
    );

    let mut local_failure: Option<DetectError> = None;
    let local_signal = match local_join {
        Ok(Ok(signal)) => signal,
        Ok(Err(e)) => {
            warn!(error = %e, "local detector degraded");
            let signal = DetectionSignal::unavailable(SignalSource::LocalDetector, e.to_string());
            local_failure = Some(e);
            signal
        }
        Err(e) => {
            warn!(error = %e, "local detector task aborted");
            DetectionSignal::unavailable(SignalSource::LocalDetector, "detector task aborted")
        }
    };

    let result = match aggregate(
        vec![local_signal, cloud_signal, news_signal],
        &state.cfg.policy,
    ) {
        Ok(result) => result,
        Err(AggregateError::NoSignal) => {
            // With every source down, a malformed upload is the caller's
            // problem; anything else is ours.
            return Err(match local_failure {
                Some(DetectError::UnsupportedMedia { reason, .. }) => {
                    AnalyzeError::UnsupportedMedia(reason)
                }
                _ => AnalyzeError::NoSignal(AggregateError::NoSignal),
            });
        }
    };

    let report = assemble(result, hash, &uploader, state.ledger.as_ref()).await?;
    Ok(report)
}

/// Run one optional source. A missing adapter, a timeout, and an in-adapter
/// failure all collapse to an unavailable signal for that source alone.
async fn check_source(
    state: &AppState,
    submission: &Arc<MediaSubmission>,
    source: SignalSource,
) -> DetectionSignal {
    let Some(adapter) = state.adapters.iter().find(|a| a.source() == source) else {
        return DetectionSignal::unavailable(source, "not configured");
    };

    match tokio::time::timeout(state.cfg.adapter_timeout, adapter.check(submission)).await {
        Ok(outcome) => outcome.into_signal(source),
        Err(_) => {
            warn!(source = source.name(), "adapter check timed out");
            DetectionSignal::unavailable(
                source,
                format!("timed out after {}s", state.cfg.adapter_timeout.as_secs()),
            )
        }
    }
}
