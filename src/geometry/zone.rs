//! Crop rectangle for the MRZ block
//!
//! OCR engines tend to report only the most confident line of the two-line
//! zone, or a block whose width does not match the printed MRZ. The zone is
//! therefore grown around the detected block: one line height of margin on
//! each side, and a height derived from the expected width/height ratio of a
//! full MRZ. Both constants are empirical and exposed through [`ZoneParams`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{canvas_offset, Point, Rect, Size, Transform};

/// Tunable constants for [`calculate_zone`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneParams {
    /// Characters on one MRZ line
    pub chars_in_line: usize,
    /// Expected width / height ratio of the full MRZ block
    pub box_density: f32,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            chars_in_line: 44,
            box_density: 10.0,
        }
    }
}

/// Prefix of the first TD3 line on passport booklets
const PASSPORT_PREFIX: &str = "P<";

/// Compute the MRZ crop rectangle in the coordinate space of the rotated image.
///
/// `transform` is the rotation about the center of the `source` image,
/// `rotated` the canvas the rotated image was drawn on, `corners` the block
/// corners reported by OCR on the source (clockwise from top-left) and `text`
/// the block's recognized text. The result always lies inside `rotated`.
pub fn calculate_zone(
    transform: &Transform,
    source: Size,
    rotated: Size,
    corners: &[Point; 4],
    text: &str,
    params: &ZoneParams,
) -> Rect {
    let (dx, dy) = canvas_offset(source, rotated);
    let convert = |point: Point| {
        let (x, y) = transform.map_point(point);
        Point::new(x as i32 + dx, y as i32 + dy)
    };
    let top_left = convert(corners[0]);
    let bottom_right = convert(corners[2]);

    let text_len = text.chars().count();
    let line_height = bottom_right.y - top_left.y;
    let width_rate = if text_len == 0 {
        1.0
    } else {
        (params.chars_in_line as f32 / text_len as f32).min(1.0)
    };
    let text_width = (bottom_right.x - top_left.x) as f32 * width_rate;
    let width = (text_width + 2.0 * line_height as f32) as i32;

    let mut x = (top_left.x - line_height).max(0);
    if !text.starts_with(PASSPORT_PREFIX) && width_rate < 1.0 {
        // Only part of the zone was read: recenter on the presumed full block
        x = (x as f32 - (line_height as f32 * text_len as f32) / 2.0) as i32;
    }
    let max_x = rotated.width as i32;
    if x + width >= max_x {
        x = max_x - width;
    }

    let y = (top_left.y - line_height).max(0);
    let height = (line_height as f32 + width as f32 / params.box_density) as i32;

    let zone = Rect::new(x, y, x + width, y + height).clamp_to(rotated);
    debug!(
        "MRZ zone {:?} from block {:?}..{:?} (width rate {:.2})",
        zone, top_left, bottom_right, width_rate
    );
    zone
}
