//! Signal aggregation and verdict engine.
//!
//! Combines the local detector signal with whatever external signals are
//! available into one 0-100 trust score and a Real/Fake/Uncertain verdict,
//! then shapes the externally visible report including the dedup registry
//! outcome.

mod aggregate;
mod policy;
mod report;

pub use aggregate::{aggregate, AggregateResult, SourceBreakdown};
pub use policy::{ScorePolicy, SignalWeights, Verdict, VerdictThresholds};
pub use report::{assemble, AnalysisReport, DedupRecord};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregateError {
    /// Every source was unavailable. Surfaced to the caller as a request
    /// failure; never converted into a fabricated score.
    #[error("no signal sources available")]
    NoSignal,
}
