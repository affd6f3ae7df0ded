//! Contract of the head detector consumed next to the merged dataset.
//!
//! The detector itself (a pre-trained network behind a model runtime) lives
//! outside this crate. What is defined here is its result shape, the
//! confidence filtering applied to raw outputs, and the padded pixel
//! regions a privacy blur should cover.

use std::path::Path;

use crate::annotation::BoundingBox;
use crate::error::Result;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.4;
pub const DEFAULT_BLUR_PADDING: f64 = 0.1;

/// Parallel label, box and score sequences for one image.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Detections {
    pub labels: Vec<i64>,
    pub boxes: Vec<BoundingBox>,
    pub scores: Vec<f32>,
}

impl Detections {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Keep detections scoring strictly above `threshold`.
    pub fn filter_by_confidence(self, threshold: f32) -> Self {
        let mut kept = Detections::default();
        for ((label, bbox), score) in self
            .labels
            .into_iter()
            .zip(self.boxes)
            .zip(self.scores)
        {
            if score > threshold {
                kept.labels.push(label);
                kept.boxes.push(bbox);
                kept.scores.push(score);
            }
        }
        kept
    }
}

/// Anything that turns an image into detections.
pub trait Detector {
    /// Threshold used when the caller does not pass one.
    fn confidence_threshold(&self) -> f32 {
        DEFAULT_CONFIDENCE_THRESHOLD
    }

    /// Raw, unfiltered model output for the image at `image`.
    fn infer(&self, image: &Path) -> Result<Detections>;

    fn detect(&self, image: &Path, threshold: Option<f32>) -> Result<Detections> {
        let threshold = threshold.unwrap_or_else(|| self.confidence_threshold());
        Ok(self.infer(image)?.filter_by_confidence(threshold))
    }
}

/// Integer pixel rectangle, right and bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub left: u32,
    pub upper: u32,
    pub right: u32,
    pub lower: u32,
}

/// Grow `bbox` by `padding` times its size on every side, clamp it to a
/// `width` x `height` image and truncate to pixels. Returns `None` when
/// nothing is left to cover.
pub fn blur_region(bbox: &BoundingBox, padding: f64, width: u32, height: u32) -> Option<PixelRegion> {
    let pad_w = padding * bbox.width();
    let pad_h = padding * bbox.height();

    let left = (bbox.xmin - pad_w).max(0.0) as u32;
    let upper = (bbox.ymin - pad_h).max(0.0) as u32;
    let right = (bbox.xmax + pad_w).min(width as f64).max(0.0) as u32;
    let lower = (bbox.ymax + pad_h).min(height as f64).max(0.0) as u32;

    if left >= right || upper >= lower {
        return None;
    }
    Some(PixelRegion {
        left,
        upper,
        right,
        lower,
    })
}
