mod artifacts;
mod cli;
mod error;
mod pipeline;
mod video;

use anyhow::Result;
use artifacts::{DetectionLog, RunSummary};
use chrono::Utc;
use cli::Args;
use pipeline::annotate::VideoAnnotator;
use pipeline::detector::DetectorConfig;
use pipeline::model::OnnxDetector;
use video::opencv_reader::OpencvSource;
use video::opencv_writer::OpencvSink;
use video::FrameSource;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    run(args)
}

fn run(args: Args) -> Result<()> {
    let started_at = Utc::now();

    let detector = OnnxDetector::new(DetectorConfig {
        model_path: args.model.clone(),
        confidence_threshold: args.confidence,
        iou_threshold: args.iou,
        allowed_classes: args.classes.clone(),
        device: args.device,
    })?;

    // The source must open before any output file exists on disk.
    let source = OpencvSource::open(&args.input)?;
    let info = source.info();
    let sink = OpencvSink::create(&args.output, info.width, info.height, args.fps)?;

    let mut annotator =
        VideoAnnotator::new(Box::new(source), Box::new(sink), Box::new(detector));
    if let Some(path) = &args.detections_json {
        annotator = annotator.with_detection_log(DetectionLog::create(path)?);
    }

    let stats = annotator.run()?;

    let elapsed = stats.duration.as_secs_f64();
    let mean_fps = if elapsed > 0.0 {
        stats.frames_written as f64 / elapsed
    } else {
        0.0
    };
    tracing::info!(
        "wrote {} frames ({} read, {} detections) in {:.1}s, {:.1} fps mean",
        stats.frames_written,
        stats.frames_read,
        stats.total_detections,
        elapsed,
        mean_fps
    );

    if let Some(path) = &args.summary {
        RunSummary {
            input: args.input.clone(),
            output: args.output.clone(),
            started_at,
            elapsed_secs: elapsed,
            frames_read: stats.frames_read,
            frames_written: stats.frames_written,
            total_detections: stats.total_detections,
            mean_fps,
        }
        .write(path)?;
    }

    Ok(())
}
