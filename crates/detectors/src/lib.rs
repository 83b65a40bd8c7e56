//! Local heuristic media detectors.
//!
//! Each detector derives structural or statistical features from the raw
//! bytes and maps them through fixed thresholds into a trust score in
//! [0, 1] plus a list of anomalies. No external dependency, no network:
//! a detector either completes or fails deterministically.

mod audio;
mod image_cv;
mod video;

pub use audio::AudioDetector;
pub use image_cv::ImageDetector;
pub use video::VideoDetector;

use std::collections::HashMap;

use signals::{DetectionSignal, MediaKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    /// The bytes could not be parsed as the declared kind. The caller must
    /// treat this as a missing local signal, never as a zero score.
    #[error("unsupported {kind} media: {reason}")]
    UnsupportedMedia { kind: MediaKind, reason: String },

    #[error("no detector registered for kind {0}")]
    NoDetector(MediaKind),
}

pub type Result<T> = std::result::Result<T, DetectError>;

/// A pluggable local analyzer for one media kind. Swapping a heuristic for
/// a learned model means registering a different implementation; nothing
/// downstream changes.
pub trait Detector: Send + Sync {
    fn kind(&self) -> MediaKind;

    /// Identifier reported as the signal's model name.
    fn model_id(&self) -> &'static str;

    fn analyze(&self, bytes: &[u8]) -> Result<DetectionSignal>;
}

/// Detector lookup keyed on media kind.
pub struct DetectorRegistry {
    detectors: HashMap<MediaKind, Box<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: HashMap::new(),
        }
    }

    /// Registry with the built-in image, video, and audio detectors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ImageDetector::new()));
        registry.register(Box::new(VideoDetector::default()));
        registry.register(Box::new(AudioDetector::new()));
        registry
    }

    /// Register a detector, replacing any previous one for the same kind.
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.insert(detector.kind(), detector);
    }

    pub fn analyze(&self, bytes: &[u8], kind: MediaKind) -> Result<DetectionSignal> {
        let detector = self
            .detectors
            .get(&kind)
            .ok_or(DetectError::NoDetector(kind))?;
        detector.analyze(bytes)
    }

    pub fn supported_kinds(&self) -> Vec<MediaKind> {
        let mut kinds: Vec<MediaKind> = self.detectors.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
