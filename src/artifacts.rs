// Optional sidecar artifacts persisted as JSON next to the output video.
// Neither file changes what gets drawn or written to the video itself.

use crate::pipeline::types::Detection;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Whole-run summary written once, after a successful run.
#[derive(Serialize, Debug, Clone)]
pub struct RunSummary {
    pub input: String,
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub frames_read: usize,
    pub frames_written: usize,
    pub total_detections: usize,
    pub mean_fps: f64,
}

impl RunSummary {
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
        Ok(())
    }
}

#[derive(Serialize)]
struct FrameRecord<'a> {
    frame: usize,
    detections: &'a [PixelDetection],
}

/// Detection echoed in pixel space so downstream tooling does not need the
/// frame dimensions to interpret it.
#[derive(Serialize)]
pub struct PixelDetection {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub class_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub confidence: f32,
}

impl PixelDetection {
    pub fn from_detection(det: &Detection, frame_width: i32, frame_height: i32) -> Self {
        let rect = det.bbox.to_pixel_rect(frame_width, frame_height);
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.width,
            h: rect.height,
            class_id: det.class_id,
            class_name: det.class_name.clone(),
            confidence: det.confidence,
        }
    }
}

/// One JSON object per line, one line per frame.
pub struct DetectionLog {
    writer: BufWriter<File>,
}

impl DetectionLog {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn log_frame(&mut self, frame: usize, detections: &[PixelDetection]) -> Result<()> {
        let record = FrameRecord { frame, detections };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
