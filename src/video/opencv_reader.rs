use super::{FrameSource, SourceInfo};
use crate::error::VideoError;
use anyhow::Result;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH,
    },
};

/// File- or URL-backed video source. The capture handle is released when the
/// source is dropped, whichever way the read loop exits.
pub struct OpencvSource {
    capture: VideoCapture,
    info: SourceInfo,
}

impl OpencvSource {
    pub fn open(path: &str) -> Result<Self> {
        let capture = match VideoCapture::from_file(path, CAP_ANY) {
            Ok(capture) => capture,
            Err(err) => {
                tracing::warn!("VideoCapture rejected {}: {}", path, err);
                return Err(VideoError::SourceUnavailable {
                    path: path.to_string(),
                }
                .into());
            }
        };
        if !capture.is_opened()? {
            return Err(VideoError::SourceUnavailable {
                path: path.to_string(),
            }
            .into());
        }

        let width = capture.get(CAP_PROP_FRAME_WIDTH)? as i32;
        let height = capture.get(CAP_PROP_FRAME_HEIGHT)? as i32;
        let mut source_fps = capture.get(CAP_PROP_FPS)?;
        if source_fps <= 0.0 {
            tracing::warn!("no FPS in metadata for {}, assuming 30.0", path);
            source_fps = 30.0;
        }
        let total_frames = capture.get(CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;

        tracing::info!(
            "opened {}, {}x{}, fps={:.2}, stream_frames={}",
            path,
            width,
            height,
            source_fps,
            total_frames
        );

        Ok(Self {
            capture,
            info: SourceInfo {
                width,
                height,
                source_fps,
                total_frames,
            },
        })
    }
}

impl FrameSource for OpencvSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        // An undecodable frame and a genuine end-of-file both come back as
        // "no frame"; they are deliberately not told apart.
        let ok = self.capture.read(&mut frame)?;
        if !ok || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = OpencvSource::open("/definitely/not/here.mp4").unwrap_err();
        match err.downcast_ref::<VideoError>() {
            Some(VideoError::SourceUnavailable { path }) => {
                assert!(path.contains("not/here.mp4"));
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }
}
