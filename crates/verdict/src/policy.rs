//! Scoring policy: weight table and verdict thresholds.
//!
//! These are policy constants, not mechanism. Defaults match the documented
//! split; both are overridable through configuration so behavior stays
//! reproducible for tests while remaining tunable.

use serde::{Deserialize, Serialize};
use signals::SignalSource;

/// Fixed per-source weights. Local outweighs cloud outweighs news; the
/// three sum to 1.0 when all sources are present.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub local: f64,
    pub cloud: f64,
    pub news: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            local: 0.5,
            cloud: 0.3,
            news: 0.2,
        }
    }
}

impl SignalWeights {
    pub fn for_source(&self, source: SignalSource) -> f64 {
        match source {
            SignalSource::LocalDetector => self.local,
            SignalSource::CloudVision => self.cloud,
            SignalSource::NewsSearch => self.news,
        }
    }
}

/// Trust-score cutoffs for the verdict mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerdictThresholds {
    /// Scores at or above this are Real.
    pub real_min: u8,
    /// Scores at or below this are Fake.
    pub fake_max: u8,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self {
            real_min: 70,
            fake_max: 40,
        }
    }
}

impl VerdictThresholds {
    pub fn classify(&self, trust_score: u8) -> Verdict {
        if trust_score >= self.real_min {
            Verdict::Real
        } else if trust_score <= self.fake_max {
            Verdict::Fake
        } else {
            Verdict::Uncertain
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    Fake,
    Uncertain,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Verdict::Real => "Real",
            Verdict::Fake => "Fake",
            Verdict::Uncertain => "Uncertain",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePolicy {
    pub weights: SignalWeights,
    pub thresholds: VerdictThresholds,
}
