//! Text-line orientation estimation

use crate::error::{MrzError, Result};
use crate::geometry::Point;

/// Angle in degrees that turns the text line running from `corner0` to
/// `corner1` (top-left to top-right of a detected block) horizontal and
/// left-to-right when passed to [`crate::geometry::Transform::rotation`].
pub fn estimate_angle(corner0: Point, corner1: Point) -> Result<f32> {
    if corner0 == corner1 {
        return Err(MrzError::DegenerateGeometry(format!(
            "text block corners coincide at ({}, {})",
            corner0.x, corner0.y
        )));
    }

    let dx = (corner1.x - corner0.x) as f32;
    // Image y grows downwards
    let dy = (corner0.y - corner1.y) as f32;
    let raw = dy.atan2(dx).to_degrees();

    let adjusted = if raw > 90.0 { 450.0 - raw } else { 90.0 - raw };
    Ok(90.0 - adjusted)
}
