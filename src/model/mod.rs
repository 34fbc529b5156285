/// Detector boundary: a decoded image goes in, plain numeric detections come out.
mod yolo;

pub use yolo::YoloDetector;

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbImage;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DetectorError {
    #[error("model file not found: {0}")]
    ModelNotFound(PathBuf),
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("failed to prepare input: {0}")]
    Preprocess(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("unexpected model output: {0}")]
    InvalidOutput(String),
    #[error("detection worker stopped: {0}")]
    Worker(String),
}

/// One model output record, in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: u32,
}

impl Detection {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn intersection_area(&self, other: &Detection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        }
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Anything that can turn an RGB image into detections.
///
/// Implementations are created once and shared, so `detect` takes `&self`.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, DetectorError>;
}

/// Run `detector` on the blocking pool so the UI loop keeps running.
pub async fn detect_in_background(
    detector: Arc<dyn Detector>,
    image: Arc<RgbImage>,
) -> Result<Vec<Detection>, DetectorError> {
    tokio::task::spawn_blocking(move || detector.detect(&image))
        .await
        .unwrap_or_else(|e| Err(DetectorError::Worker(e.to_string())))
}
