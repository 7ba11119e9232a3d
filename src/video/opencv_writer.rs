use super::FrameSink;
use crate::error::VideoError;
use anyhow::Result;
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};

/// Default output frame rate, matching the original tool's fixed writer rate.
pub const DEFAULT_OUTPUT_FPS: f64 = 20.0;

/// Motion-JPEG-in-AVI sink at a fixed frame rate and the input's resolution.
pub struct OpencvSink {
    writer: VideoWriter,
    path: String,
    frames_written: usize,
    finished: bool,
}

impl OpencvSink {
    pub fn create(path: &str, width: i32, height: i32, fps: f64) -> Result<Self> {
        let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
        let writer = match VideoWriter::new(path, fourcc, fps, Size::new(width, height), true) {
            Ok(writer) => writer,
            Err(err) => {
                tracing::warn!("VideoWriter rejected {}: {}", path, err);
                return Err(VideoError::SinkUnavailable {
                    path: path.to_string(),
                }
                .into());
            }
        };
        if !writer.is_opened()? {
            return Err(VideoError::SinkUnavailable {
                path: path.to_string(),
            }
            .into());
        }

        tracing::info!("writing {}, {}x{} at {:.1} fps", path, width, height, fps);

        Ok(Self {
            writer,
            path: path.to_string(),
            frames_written: 0,
            finished: false,
        })
    }
}

impl FrameSink for OpencvSink {
    fn write_frame(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if !self.finished {
            self.writer.release()?;
            self.finished = true;
            tracing::info!("released {} ({} frames)", self.path, self.frames_written);
        }
        Ok(())
    }

    fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl Drop for OpencvSink {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.writer.release() {
                tracing::warn!("failed to release {}: {}", self.path, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    #[test]
    fn writes_frames_and_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.avi");
        let path = path.to_str().unwrap();

        let mut sink = OpencvSink::create(path, 64, 48, DEFAULT_OUTPUT_FPS).unwrap();
        let frame =
            Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(127.0)).unwrap();
        for _ in 0..3 {
            sink.write_frame(&frame).unwrap();
        }
        sink.finish().unwrap();

        assert_eq!(sink.frames_written(), 3);
        assert!(std::fs::metadata(path).unwrap().len() > 0);
    }
}
