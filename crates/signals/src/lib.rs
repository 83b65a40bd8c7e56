//! Shared data model for media trust analysis.

use serde::{Deserialize, Serialize};

/// Declared kind of a submitted media file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted media file, owned by the request that created it.
#[derive(Clone, Debug)]
pub struct MediaSubmission {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    pub size: u64,
    pub uploader: String,
    /// Free text describing the content, used by the news cross-reference.
    pub metadata_text: Option<String>,
}

impl MediaSubmission {
    pub fn new(bytes: Vec<u8>, kind: MediaKind, uploader: impl Into<String>) -> Self {
        let size = bytes.len() as u64;
        Self {
            bytes,
            kind,
            size,
            uploader: uploader.into(),
            metadata_text: None,
        }
    }

    pub fn with_metadata_text(mut self, text: impl Into<String>) -> Self {
        self.metadata_text = Some(text.into());
        self
    }
}

/// Which component produced a signal. Variant order is the source-priority
/// order used when merging anomaly lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    LocalDetector,
    CloudVision,
    NewsSearch,
}

impl SignalSource {
    pub fn name(&self) -> &'static str {
        match self {
            SignalSource::LocalDetector => "local_detector",
            SignalSource::CloudVision => "cloud_vision",
            SignalSource::NewsSearch => "news_search",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A discrete, typed finding describing one irregularity in the media.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub description: String,
}

impl Anomaly {
    pub fn new(kind: impl Into<String>, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            severity,
            description: description.into(),
        }
    }
}

/// One source's contribution to the aggregate: a bounded trust score in
/// [0, 1] (higher = more trustworthy) plus any anomalies it found.
///
/// An unavailable signal carries no score and no anomalies; it must not
/// contribute to the weighted sum or its denominator. The constructors
/// below are the only way this crate builds signals, so the invariant
/// holds by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionSignal {
    pub source: SignalSource,
    pub available: bool,
    pub score: Option<f64>,
    /// Identifier of the model/heuristic that produced the score.
    pub model: Option<String>,
    pub anomalies: Vec<Anomaly>,
    /// Provider-specific raw metadata (article refs, provider payloads).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Reason the source was skipped, set only when unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

impl DetectionSignal {
    pub fn available(source: SignalSource, score: f64, model: impl Into<String>) -> Self {
        Self {
            source,
            available: true,
            score: Some(score.clamp(0.0, 1.0)),
            model: Some(model.into()),
            anomalies: Vec::new(),
            metadata: None,
            unavailable_reason: None,
        }
    }

    pub fn unavailable(source: SignalSource, reason: impl Into<String>) -> Self {
        Self {
            source,
            available: false,
            score: None,
            model: None,
            anomalies: Vec::new(),
            metadata: None,
            unavailable_reason: Some(reason.into()),
        }
    }

    pub fn with_anomalies(mut self, anomalies: Vec<Anomaly>) -> Self {
        debug_assert!(self.available, "unavailable signals carry no anomalies");
        self.anomalies = anomalies;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_roundtrip() {
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Audio] {
            assert_eq!(MediaKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MediaKind::parse("IMAGE"), Some(MediaKind::Image));
        assert_eq!(MediaKind::parse("document"), None);
    }

    #[test]
    fn available_signal_clamps_score() {
        let s = DetectionSignal::available(SignalSource::LocalDetector, 1.7, "m");
        assert_eq!(s.score, Some(1.0));
        let s = DetectionSignal::available(SignalSource::LocalDetector, -0.2, "m");
        assert_eq!(s.score, Some(0.0));
    }

    #[test]
    fn unavailable_signal_carries_no_score() {
        let s = DetectionSignal::unavailable(SignalSource::CloudVision, "timeout");
        assert!(!s.available);
        assert_eq!(s.score, None);
        assert!(s.anomalies.is_empty());
        assert_eq!(s.unavailable_reason.as_deref(), Some("timeout"));
    }

    #[test]
    fn source_priority_order() {
        let mut sources = vec![
            SignalSource::NewsSearch,
            SignalSource::LocalDetector,
            SignalSource::CloudVision,
        ];
        sources.sort();
        assert_eq!(
            sources,
            vec![
                SignalSource::LocalDetector,
                SignalSource::CloudVision,
                SignalSource::NewsSearch,
            ]
        );
    }

    #[test]
    fn anomaly_serializes_with_type_tag() {
        let a = Anomaly::new("edge smoothing", Severity::High, "over-smoothed");
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "edge smoothing");
        assert_eq!(json["severity"], "high");
    }
}
