//! Whole-image structural analysis.
//!
//! Decodes the image and derives edge density, texture variance, color
//! uniformity, brightness statistics, and blockwise detail ratios. Each
//! feature outside its natural band adds a fixed amount of suspicion and an
//! anomaly; features squarely inside their natural bands offset suspicion
//! at half weight.

use image::GrayImage;
use signals::{Anomaly, DetectionSignal, MediaKind, Severity, SignalSource};
use tracing::debug;

use crate::{DetectError, Detector, Result};

const MODEL_ID: &str = "lightweight-cv/1.1";

// Suspicion thresholds.
const EDGE_DENSITY_SMOOTH: f64 = 0.03;
const TEXTURE_VARIANCE_FLAT: f64 = 80.0;
const COLOR_UNIFORMITY_FLAT: f64 = 10.0;
const BLOCK_DETAIL_EXCESSIVE: f64 = 0.22;
const BLOCK_DETAIL_VAR_EXCESSIVE: f64 = 0.012;

// Gradient magnitude above which a pixel counts as an edge.
const EDGE_MAGNITUDE: i32 = 96;

pub struct ImageDetector;

impl ImageDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ImageDetector {
    fn kind(&self) -> MediaKind {
        MediaKind::Image
    }

    fn model_id(&self) -> &'static str {
        MODEL_ID
    }

    fn analyze(&self, bytes: &[u8]) -> Result<DetectionSignal> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| DetectError::UnsupportedMedia {
                kind: MediaKind::Image,
                reason: e.to_string(),
            })?;

        let gray = decoded.to_luma8();
        let rgb = decoded.to_rgb8();
        if gray.width() < 16 || gray.height() < 16 {
            return Err(DetectError::UnsupportedMedia {
                kind: MediaKind::Image,
                reason: format!("image too small: {}x{}", gray.width(), gray.height()),
            });
        }

        let features = ImageFeatures::extract(&gray, &rgb);
        debug!(
            edge_density = features.edge_density,
            texture_variance = features.texture_variance,
            color_uniformity = features.color_uniformity,
            avg_block_detail = features.avg_block_detail,
            "image features"
        );

        let mut suspicion = 0.0;
        let mut anomalies = Vec::new();

        if features.edge_density < EDGE_DENSITY_SMOOTH {
            suspicion += 0.18;
            anomalies.push(Anomaly::new(
                "edge smoothing",
                Severity::High,
                "image appears over-smoothed, typical of synthetic generation",
            ));
        }

        if features.texture_variance < TEXTURE_VARIANCE_FLAT {
            suspicion += 0.15;
            anomalies.push(Anomaly::new(
                "low texture variance",
                Severity::Medium,
                "texture patterns appear artificially uniform",
            ));
        }

        if features.color_uniformity < COLOR_UNIFORMITY_FLAT {
            suspicion += 0.10;
            anomalies.push(Anomaly::new(
                "color uniformity",
                Severity::Medium,
                "colors appear artificially uniform",
            ));
        }

        if features.avg_block_detail > BLOCK_DETAIL_EXCESSIVE
            || features.block_detail_var > BLOCK_DETAIL_VAR_EXCESSIVE
        {
            suspicion += 0.12;
            anomalies.push(Anomaly::new(
                "compression artifacts",
                Severity::High,
                "unusual compression patterns suggesting manipulation",
            ));
        }

        let green = features.counter_indicators();
        let adjusted = (suspicion - 0.5 * green).max(0.0);
        let score = (1.0 - adjusted).clamp(0.0, 1.0);

        Ok(DetectionSignal::available(SignalSource::LocalDetector, score, MODEL_ID)
            .with_anomalies(anomalies))
    }
}

struct ImageFeatures {
    edge_density: f64,
    texture_variance: f64,
    color_uniformity: f64,
    brightness_std: f64,
    avg_block_detail: f64,
    block_detail_var: f64,
    pixels: u64,
}

impl ImageFeatures {
    fn extract(gray: &GrayImage, rgb: &image::RgbImage) -> Self {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        let luma = gray.as_raw();
        let at = |x: usize, y: usize| -> i32 { luma[y * w + x] as i32 };

        // Edge density over the interior via a central-difference gradient,
        // and texture variance via the Laplacian response.
        let mut edges: u64 = 0;
        let mut lap_sum = 0.0;
        let mut lap_sq_sum = 0.0;
        let interior = ((w - 2) * (h - 2)) as f64;
        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let gx = (at(x + 1, y) - at(x - 1, y)).abs();
                let gy = (at(x, y + 1) - at(x, y - 1)).abs();
                if gx + gy > EDGE_MAGNITUDE {
                    edges += 1;
                }
                let lap = (4 * at(x, y) - at(x - 1, y) - at(x + 1, y) - at(x, y - 1)
                    - at(x, y + 1)) as f64;
                lap_sum += lap;
                lap_sq_sum += lap * lap;
            }
        }
        let edge_density = edges as f64 / interior;
        let lap_mean = lap_sum / interior;
        let texture_variance = lap_sq_sum / interior - lap_mean * lap_mean;

        // Per-channel standard deviation, averaged.
        let n = (w * h) as f64;
        let mut sums = [0.0f64; 3];
        let mut sq_sums = [0.0f64; 3];
        for px in rgb.pixels() {
            for c in 0..3 {
                let v = px.0[c] as f64;
                sums[c] += v;
                sq_sums[c] += v * v;
            }
        }
        let color_uniformity = (0..3)
            .map(|c| {
                let mean = sums[c] / n;
                (sq_sums[c] / n - mean * mean).max(0.0).sqrt()
            })
            .sum::<f64>()
            / 3.0;

        // Brightness statistics.
        let b_sum: f64 = luma.iter().map(|&v| v as f64).sum();
        let b_mean = b_sum / n;
        let b_sq_sum: f64 = luma.iter().map(|&v| (v as f64) * (v as f64)).sum();
        let brightness_std = (b_sq_sum / n - b_mean * b_mean).max(0.0).sqrt();

        // 8x8 blocks: mean absolute neighbor delta as a high-frequency
        // detail proxy, normalized to [0, 1].
        let mut details = Vec::new();
        let block = 8;
        for by in (0..h.saturating_sub(block)).step_by(block) {
            for bx in (0..w.saturating_sub(block)).step_by(block) {
                let mut delta_sum = 0.0;
                let mut count = 0u32;
                for y in by..by + block {
                    for x in bx..bx + block - 1 {
                        delta_sum += (at(x + 1, y) - at(x, y)).abs() as f64;
                        count += 1;
                    }
                }
                for y in by..by + block - 1 {
                    for x in bx..bx + block {
                        delta_sum += (at(x, y + 1) - at(x, y)).abs() as f64;
                        count += 1;
                    }
                }
                details.push(delta_sum / (count as f64 * 255.0));
            }
        }
        let (avg_block_detail, block_detail_var) = mean_and_variance(&details);

        Self {
            edge_density,
            texture_variance,
            color_uniformity,
            brightness_std,
            avg_block_detail,
            block_detail_var,
            pixels: (w * h) as u64,
        }
    }

    /// Cues supporting natural imagery; capped so strong naturalness can
    /// offset but never erase heavy suspicion.
    fn counter_indicators(&self) -> f64 {
        let mut green: f64 = 0.0;
        if (0.04..=0.25).contains(&self.edge_density) {
            green += 0.25;
        }
        if self.texture_variance >= 250.0 {
            green += 0.25;
        }
        if (15.0..=60.0).contains(&self.color_uniformity) {
            green += 0.15;
        }
        if (0.03..=0.18).contains(&self.avg_block_detail) && self.block_detail_var < 0.006 {
            green += 0.15;
        }
        if self.brightness_std >= 20.0 {
            green += 0.1;
        }
        if self.pixels >= 640 * 480 {
            green += 0.05;
        }
        green.min(0.8)
    }
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
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn flat_image() -> Vec<u8> {
        let img = GrayImage::from_pixel(640, 480, image::Luma([128u8]));
        encode_png(DynamicImage::ImageLuma8(img))
    }

    fn textured_image() -> Vec<u8> {
        // Vertical contrast lines plus mild per-pixel texture: edges in the
        // natural band, healthy variance.
        let img = GrayImage::from_fn(640, 480, |x, y| {
            if x % 9 == 0 {
                image::Luma([16u8])
            } else {
                let t = ((x * 31 + y * 17) % 13) as u8 * 4;
                image::Luma([180u8.saturating_add(t)])
            }
        });
        encode_png(DynamicImage::ImageLuma8(img))
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let err = ImageDetector::new().analyze(b"not an image").unwrap_err();
        assert!(matches!(
            err,
            DetectError::UnsupportedMedia {
                kind: MediaKind::Image,
                ..
            }
        ));
    }

    #[test]
    fn flat_image_flags_smoothing_and_uniformity() {
        let signal = ImageDetector::new().analyze(&flat_image()).unwrap();
        assert!(signal.available);
        let kinds: Vec<&str> = signal.anomalies.iter().map(|a| a.kind.as_str()).collect();
        assert!(kinds.contains(&"edge smoothing"));
        assert!(kinds.contains(&"low texture variance"));
        assert!(kinds.contains(&"color uniformity"));
    }

    #[test]
    fn textured_image_outranks_flat_image() {
        let detector = ImageDetector::new();
        let flat = detector.analyze(&flat_image()).unwrap();
        let textured = detector.analyze(&textured_image()).unwrap();
        let (flat_score, textured_score) = (flat.score.unwrap(), textured.score.unwrap());
        assert!(
            textured_score > flat_score,
            "expected textured {textured_score} > flat {flat_score}"
        );
        assert!((0.0..=1.0).contains(&textured_score));
    }

    #[test]
    fn tiny_image_is_unsupported() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([10u8]));
        let bytes = encode_png(DynamicImage::ImageLuma8(img));
        assert!(ImageDetector::new().analyze(&bytes).is_err());
    }
}
