use async_trait::async_trait;
use signals::{DetectionSignal, MediaSubmission, SignalSource};

/// What an adapter check produced: a usable signal, or a declaration that
/// the source could not run. Unavailability is a normal outcome, never an
/// error that escapes the adapter boundary.
#[derive(Debug)]
pub enum AdapterOutcome {
    Signal(DetectionSignal),
    Unavailable { reason: String },
}

impl AdapterOutcome {
    /// Collapse into a signal for the aggregation step.
    pub fn into_signal(self, source: SignalSource) -> DetectionSignal {
        match self {
            AdapterOutcome::Signal(signal) => signal,
            AdapterOutcome::Unavailable { reason } => {
                DetectionSignal::unavailable(source, reason)
            }
        }
    }
}

/// An optional external signal source. Adapters are independent: one
/// failing or being disabled must never block or alter another's run.
#[async_trait]
pub trait SignalAdapter: Send + Sync {
    fn source(&self) -> SignalSource;

    async fn check(&self, submission: &MediaSubmission) -> AdapterOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_outcome_collapses_to_unavailable_signal() {
        let outcome = AdapterOutcome::Unavailable {
            reason: "quota exhausted".to_string(),
        };
        let signal = outcome.into_signal(SignalSource::CloudVision);
        assert!(!signal.available);
        assert_eq!(signal.score, None);
        assert_eq!(signal.unavailable_reason.as_deref(), Some("quota exhausted"));
    }

    #[test]
    fn signal_outcome_passes_through() {
        let inner = DetectionSignal::available(SignalSource::NewsSearch, 0.8, "news-search/1.0");
        let signal = AdapterOutcome::Signal(inner).into_signal(SignalSource::NewsSearch);
        assert!(signal.available);
        assert_eq!(signal.score, Some(0.8));
    }
}
