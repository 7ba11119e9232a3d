use crate::artifacts::{DetectionLog, PixelDetection};
use crate::pipeline::detector::Detector;
use crate::pipeline::overlay;
use crate::pipeline::progress::ProgressWindow;
use crate::video::{FrameSink, FrameSource};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use opencv::prelude::*;
use std::time::{Duration, Instant};

pub struct AnnotateStats {
    pub frames_read: usize,
    pub frames_written: usize,
    pub total_detections: usize,
    pub duration: Duration,
}

/// The sequential read → infer → draw → write loop.
///
/// Owns the source, sink, and detector for exactly one run; stream
/// exhaustion is the one normal exit, and the sink is released on every
/// exit path (explicitly on success, on drop otherwise).
pub struct VideoAnnotator {
    source: Box<dyn FrameSource>,
    sink: Box<dyn FrameSink>,
    detector: Box<dyn Detector>,
    detection_log: Option<DetectionLog>,
}

impl VideoAnnotator {
    pub fn new(
        source: Box<dyn FrameSource>,
        sink: Box<dyn FrameSink>,
        detector: Box<dyn Detector>,
    ) -> Self {
        Self {
            source,
            sink,
            detector,
            detection_log: None,
        }
    }

    pub fn with_detection_log(mut self, log: DetectionLog) -> Self {
        self.detection_log = Some(log);
        self
    }

    pub fn run(mut self) -> Result<AnnotateStats> {
        let info = self.source.info();
        let started = Instant::now();
        let mut progress = ProgressWindow::new(info.total_frames);

        let pb = if info.total_frames > 0 {
            let pb = ProgressBar::new(info.total_frames as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} fps, {eta})")?
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::new_spinner()
        };

        let mut frames_read = 0usize;
        let mut total_detections = 0usize;

        while let Some(mut frame) = self.source.next_frame()? {
            frames_read += 1;

            let detections = self.detector.infer(&frame)?;
            total_detections += detections.len();

            overlay::draw_detections(&mut frame, &detections)?;
            overlay::draw_target_count(&mut frame, detections.len())?;
            self.sink.write_frame(&frame)?;

            if let Some(log) = self.detection_log.as_mut() {
                let size = frame.size()?;
                let pixel: Vec<PixelDetection> = detections
                    .iter()
                    .map(|d| PixelDetection::from_detection(d, size.width, size.height))
                    .collect();
                log.log_frame(frames_read - 1, &pixel)?;
            }

            if let Some(report) = progress.observe_frame() {
                match report.percent_complete {
                    Some(pct) => tracing::info!(
                        "{} frames ({:.1}% of stream), {:.1} fps over last window",
                        report.frames_processed,
                        pct,
                        report.window_fps
                    ),
                    None => tracing::info!(
                        "{} frames, {:.1} fps over last window",
                        report.frames_processed,
                        report.window_fps
                    ),
                }
            }
            pb.inc(1);
        }

        self.sink.finish()?;
        if let Some(log) = self.detection_log.as_mut() {
            log.flush()?;
        }
        pb.finish_with_message("Done");

        Ok(AnnotateStats {
            frames_read,
            frames_written: self.sink.frames_written(),
            total_detections,
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{BBox, Detection, DetectionResult};
    use crate::video::SourceInfo;
    use anyhow::anyhow;
    use opencv::core::{Mat, Scalar, CV_8UC3};

    struct SyntheticSource {
        remaining: usize,
        info: SourceInfo,
    }

    impl SyntheticSource {
        fn new(frames: usize) -> Self {
            Self {
                remaining: frames,
                info: SourceInfo {
                    width: 64,
                    height: 48,
                    source_fps: 30.0,
                    total_frames: frames,
                },
            }
        }
    }

    impl FrameSource for SyntheticSource {
        fn info(&self) -> SourceInfo {
            self.info
        }

        fn next_frame(&mut self) -> Result<Option<Mat>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            let frame =
                Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(0.0))?;
            Ok(Some(frame))
        }
    }

    struct CountingSink {
        frames: usize,
    }

    impl FrameSink for CountingSink {
        fn write_frame(&mut self, _frame: &Mat) -> Result<()> {
            self.frames += 1;
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            Ok(())
        }

        fn frames_written(&self) -> usize {
            self.frames
        }
    }

    struct FixedDetector {
        per_frame: DetectionResult,
        fail_at: Option<usize>,
        calls: usize,
    }

    impl Detector for FixedDetector {
        fn infer(&mut self, _frame: &Mat) -> Result<DetectionResult> {
            self.calls += 1;
            if Some(self.calls) == self.fail_at {
                return Err(anyhow!("inference backend exploded"));
            }
            Ok(self.per_frame.clone())
        }
    }

    #[test]
    fn every_read_frame_is_written_once() {
        let annotator = VideoAnnotator::new(
            Box::new(SyntheticSource::new(10)),
            Box::new(CountingSink { frames: 0 }),
            Box::new(FixedDetector {
                per_frame: Vec::new(),
                fail_at: None,
                calls: 0,
            }),
        );

        let stats = annotator.run().unwrap();
        assert_eq!(stats.frames_read, 10);
        assert_eq!(stats.frames_written, 10);
        assert_eq!(stats.total_detections, 0);
    }

    #[test]
    fn detections_are_tallied_across_frames() {
        let det = Detection {
            bbox: BBox::new(0.2, 0.2, 0.6, 0.6),
            class_id: 0,
            class_name: Some("person".to_string()),
            confidence: 0.9,
        };
        let annotator = VideoAnnotator::new(
            Box::new(SyntheticSource::new(5)),
            Box::new(CountingSink { frames: 0 }),
            Box::new(FixedDetector {
                per_frame: vec![det.clone(), det],
                fail_at: None,
                calls: 0,
            }),
        );

        let stats = annotator.run().unwrap();
        assert_eq!(stats.frames_written, 5);
        assert_eq!(stats.total_detections, 10);
    }

    #[test]
    fn synthetic_video_round_trip_with_no_detections() {
        use crate::video::opencv_reader::OpencvSource;
        use crate::video::opencv_writer::{OpencvSink, DEFAULT_OUTPUT_FPS};

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.avi");
        let output = dir.path().join("output.avi");

        // Lay down a 10-frame gray video to annotate.
        {
            let mut sink =
                OpencvSink::create(input.to_str().unwrap(), 64, 48, DEFAULT_OUTPUT_FPS).unwrap();
            let frame =
                Mat::new_rows_cols_with_default(48, 64, CV_8UC3, Scalar::all(127.0)).unwrap();
            for _ in 0..10 {
                sink.write_frame(&frame).unwrap();
            }
            sink.finish().unwrap();
        }

        let source = OpencvSource::open(input.to_str().unwrap()).unwrap();
        let info = source.info();
        let sink =
            OpencvSink::create(output.to_str().unwrap(), info.width, info.height, DEFAULT_OUTPUT_FPS)
                .unwrap();
        let annotator = VideoAnnotator::new(
            Box::new(source),
            Box::new(sink),
            Box::new(FixedDetector {
                per_frame: Vec::new(),
                fail_at: None,
                calls: 0,
            }),
        );

        let stats = annotator.run().unwrap();
        assert_eq!(stats.frames_read, 10);
        assert_eq!(stats.frames_written, 10);
        assert_eq!(stats.total_detections, 0);
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn inference_failure_aborts_without_writing_the_frame() {
        let annotator = VideoAnnotator::new(
            Box::new(SyntheticSource::new(10)),
            Box::new(CountingSink { frames: 0 }),
            Box::new(FixedDetector {
                per_frame: Vec::new(),
                fail_at: Some(3),
                calls: 0,
            }),
        );

        assert!(annotator.run().is_err());
        // Frames 1 and 2 made it out; frame 3 never reached the sink.
    }
}
