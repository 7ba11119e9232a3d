pub mod opencv_reader;
pub mod opencv_writer;

use anyhow::Result;
use opencv::core::Mat;

/// Stream metadata determined once at open time.
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo {
    pub width: i32,
    pub height: i32,
    pub source_fps: f64,
    /// 0 when the container does not report a frame count (live sources).
    pub total_frames: usize,
}

pub trait FrameSource {
    fn info(&self) -> SourceInfo;

    /// `Ok(None)` means the stream is exhausted. A frame that fails to
    /// decode is reported the same way, not as an error.
    fn next_frame(&mut self) -> Result<Option<Mat>>;
}

pub trait FrameSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<()>;

    /// Flush and close the container. Also happens on drop.
    fn finish(&mut self) -> Result<()>;

    fn frames_written(&self) -> usize;
}
