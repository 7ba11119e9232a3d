use opencv::core::Rect;
use serde::Serialize;

/// Axis-aligned box normalized to [0, 1] in both axes.
///
/// Detections stay normalized until they are drawn, so a box is always
/// denormalized against the dimensions of the frame it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Map into pixel space for a frame of the given size, clamped so the
    /// rectangle never leaves the frame.
    pub fn to_pixel_rect(&self, frame_width: i32, frame_height: i32) -> Rect {
        let w = frame_width as f32;
        let h = frame_height as f32;

        let x1 = (self.x1 * w).clamp(0.0, w);
        let y1 = (self.y1 * h).clamp(0.0, h);
        let x2 = (self.x2 * w).clamp(0.0, w);
        let y2 = (self.y2 * h).clamp(0.0, h);

        Rect::new(
            x1 as i32,
            y1 as i32,
            (x2 - x1).max(0.0) as i32,
            (y2 - y1).max(0.0) as i32,
        )
    }
}

/// One detected object instance within a frame.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub bbox: BBox,
    pub class_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub confidence: f32,
}

/// Ordered detections for one frame; lives for one loop iteration.
pub type DetectionResult = Vec<Detection>;

/// Greedy non-maximum suppression, highest confidence first.
pub fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        if keep
            .iter()
            .all(|kept| det.bbox.iou(&kept.bbox) <= iou_threshold)
        {
            keep.push(det);
        }
    }
    keep
}
