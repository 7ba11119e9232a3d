use crate::pipeline::detector::ComputeDevice;
use crate::video::opencv_writer::DEFAULT_OUTPUT_FPS;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input video path or URL
    pub input: String,

    /// Output video path (Motion-JPEG AVI)
    pub output: String,

    /// ONNX model file
    #[arg(long, env = "COUNTING_BOXES_MODEL")]
    pub model: String,

    /// Minimum detection confidence, 0.0-1.0
    #[arg(long, default_value_t = 0.5)]
    pub confidence: f32,

    /// IoU threshold for suppressing overlapping boxes
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Comma-separated class ids to keep (default: all)
    #[arg(long, value_delimiter = ',')]
    pub classes: Option<Vec<usize>>,

    /// Compute device for inference
    #[arg(long, value_enum, default_value_t = ComputeDevice::Cpu)]
    pub device: ComputeDevice,

    /// Output frame rate
    #[arg(long, default_value_t = DEFAULT_OUTPUT_FPS)]
    pub fps: f64,

    /// Write a JSON run summary to this path after a successful run
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Stream per-frame detections as JSON lines to this path
    #[arg(long)]
    pub detections_json: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
