use crate::pipeline::detector::{apply_filters, ComputeDevice, Detector, DetectorConfig};
use crate::pipeline::types::{nms, BBox, Detection, DetectionResult};
use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageBuffer, Rgb};
use opencv::core::Mat;
use opencv::prelude::*;
use usls::models::RTDETR;
use usls::{Config, Image};

/// ONNX Runtime detector behind the `Detector` seam.
///
/// Handles BGR-to-RGB conversion, runs the model, then normalizes box
/// coordinates against the inferred frame's own dimensions. Confidence,
/// class filtering, and NMS happen here rather than in model config so the
/// thresholds behave identically for any model file.
pub struct OnnxDetector {
    model: RTDETR,
    config: DetectorConfig,
}

impl OnnxDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let mut model_config = Config::default()
            .with_model_file(&config.model_path)
            .with_class_names(&usls::NAMES_COCO_80);

        if config.device == ComputeDevice::CoreMl {
            model_config = model_config.with_model_device(usls::Device::CoreMl);
        }

        let model = RTDETR::new(model_config.commit()?)
            .with_context(|| format!("failed to load model: {}", config.model_path))?;

        tracing::info!(
            "loaded model {} (device: {:?})",
            config.model_path,
            config.device
        );

        Ok(Self { model, config })
    }
}

impl Detector for OnnxDetector {
    fn infer(&mut self, frame: &Mat) -> Result<DetectionResult> {
        let size = frame.size()?;
        let (img_w, img_h) = (size.width as f32, size.height as f32);
        if img_w <= 0.0 || img_h <= 0.0 {
            return Err(anyhow!("cannot infer on an empty frame"));
        }

        let dynamic_image = mat_to_dynamic_image(frame)?;
        let images = [Image::from(dynamic_image)];
        let results = self.model.forward(&images)?;

        let detections: Vec<Detection> = results
            .into_iter()
            .next()
            .map(|y| {
                y.hbbs
                    .into_iter()
                    .map(|hbb| Detection {
                        bbox: BBox::new(
                            hbb.xmin() / img_w,
                            hbb.ymin() / img_h,
                            (hbb.xmin() + hbb.width()) / img_w,
                            (hbb.ymin() + hbb.height()) / img_h,
                        ),
                        class_id: hbb.id().unwrap_or(0),
                        class_name: hbb.name().map(|s| s.to_string()),
                        confidence: hbb.confidence().unwrap_or(0.0),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let detections = apply_filters(detections, &self.config);
        Ok(nms(detections, self.config.iou_threshold))
    }
}

/// Convert an OpenCV Mat (BGR) to an image::DynamicImage (RGB).
fn mat_to_dynamic_image(mat: &Mat) -> Result<DynamicImage> {
    let mut rgb_mat = Mat::default();
    opencv::imgproc::cvt_color_def(mat, &mut rgb_mat, opencv::imgproc::COLOR_BGR2RGB)?;

    let size = rgb_mat.size()?;
    let width = size.width as u32;
    let height = size.height as u32;

    if !rgb_mat.is_continuous() {
        return Err(anyhow!("Mat is not continuous"));
    }

    let buffer = rgb_mat.data_bytes()?.to_vec();
    let img_buffer = ImageBuffer::<Rgb<u8>, _>::from_vec(width, height, buffer)
        .ok_or_else(|| anyhow!("failed to create ImageBuffer from Mat data"))?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}
