use crate::pipeline::types::Detection;
use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8};
use opencv::prelude::*;

fn box_color() -> Scalar {
    // BGR green
    Scalar::new(0.0, 255.0, 0.0, 0.0)
}

/// Draw every detection: rectangle plus a percent-confidence label anchored
/// at the box's top-left corner. Boxes are denormalized against the frame
/// being drawn on, never cached dimensions.
pub fn draw_detections(frame: &mut Mat, detections: &[Detection]) -> Result<()> {
    let size = frame.size()?;

    for det in detections {
        let rect = det.bbox.to_pixel_rect(size.width, size.height);
        imgproc::rectangle(frame, rect, box_color(), 2, LINE_8, 0)?;

        let label = match &det.class_name {
            Some(name) => format!("{} {:.0}%", name, det.confidence * 100.0),
            None => format!("{:.0}%", det.confidence * 100.0),
        };
        // Sit the label just above the corner, nudged down when the box
        // touches the top edge.
        let origin = Point::new(rect.x, (rect.y - 6).max(14));
        imgproc::put_text(
            frame,
            &label,
            origin,
            FONT_HERSHEY_SIMPLEX,
            0.5,
            box_color(),
            1,
            LINE_8,
            false,
        )?;
    }

    Ok(())
}

/// Running per-frame counter at a fixed screen position.
pub fn draw_target_count(frame: &mut Mat, count: usize) -> Result<()> {
    let text = format!("Total Targets: {}", count);
    imgproc::put_text(
        frame,
        &text,
        Point::new(10, 30),
        FONT_HERSHEY_SIMPLEX,
        0.7,
        box_color(),
        2,
        LINE_8,
        false,
    )?;
    Ok(())
}
