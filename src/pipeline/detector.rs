use crate::pipeline::types::{Detection, DetectionResult};
use anyhow::Result;
use clap::ValueEnum;
use opencv::core::Mat;

/// Compute device for model inference, fixed at construction time. The frame
/// loop never consults the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComputeDevice {
    Cpu,
    #[value(name = "coreml")]
    CoreMl,
}

/// Configuration handed to a detector once, at startup.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: String,
    /// Detections below this confidence are discarded.
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression.
    pub iou_threshold: f32,
    /// When set, only these class ids survive filtering.
    pub allowed_classes: Option<Vec<usize>>,
    pub device: ComputeDevice,
}

/// The external-model contract: one frame in, one ordered set of normalized
/// detections out. Implementations block; no timeout is imposed.
pub trait Detector {
    fn infer(&mut self, frame: &Mat) -> Result<DetectionResult>;
}

/// Apply the configured confidence and class filters. Runs after the model
/// call so the same rules hold for every backend.
pub fn apply_filters(detections: Vec<Detection>, config: &DetectorConfig) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= config.confidence_threshold)
        .filter(|d| match &config.allowed_classes {
            Some(classes) => classes.contains(&d.class_id),
            None => true,
        })
        .collect()
}
