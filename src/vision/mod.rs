//! Vision collaborators
//!
//! The scanner does not recognize text itself. It talks to an OCR backend
//! through [`TextRecognizer`] and to a raster backend through
//! [`ImageTransform`]; this module defines both seams and the MRZ block
//! detection performed on OCR output.

pub mod transform;

pub use transform::{apply_grayscale, ImageTransform, RasterTransform};

use anyhow::Result;
use async_trait::async_trait;
use image::RgbaImage;
use tracing::debug;

use crate::error::MrzError;
use crate::geometry::{estimate_angle, Point};

/// Minimum run of filler characters that marks a block as MRZ-bearing
const MRZ_MARKER: &str = "<<<<<<";

/// Text block reported by an OCR backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Recognized text, lines separated by `\n`
    pub text: String,
    /// Corner points, clockwise from top-left, in image pixels
    pub corner_points: [Point; 4],
}

impl TextBlock {
    pub fn new(text: impl Into<String>, corner_points: [Point; 4]) -> Self {
        Self {
            text: text.into(),
            corner_points,
        }
    }

    /// Whether the block carries the MRZ filler marker
    pub fn is_mrz(&self) -> bool {
        self.text.contains(MRZ_MARKER)
    }
}

/// OCR backend
///
/// Implementations may be non-deterministic and are free to fail; failures
/// surface as [`MrzError::OcrFailure`].
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &RgbaImage) -> Result<Vec<TextBlock>>;
}

/// Location and orientation of the MRZ block found in one OCR pass
#[derive(Debug, Clone, PartialEq)]
pub struct MrzTextBlockInfo {
    /// Corner points of the block, clockwise from top-left
    pub corners: [Point; 4],
    /// Rotation in degrees that levels the block
    pub angle: f32,
    /// Recognized text of the block
    pub text: String,
}

/// Pick the first MRZ-bearing block and estimate its orientation
pub fn find_mrz_block(blocks: &[TextBlock]) -> crate::error::Result<MrzTextBlockInfo> {
    let Some(block) = blocks.iter().find(|b| b.is_mrz()) else {
        debug!("No MRZ marker among {} text blocks", blocks.len());
        return Err(MrzError::NoMrzDetected { attempts: 1 });
    };

    let [top_left, top_right, ..] = block.corner_points;
    let angle = estimate_angle(top_left, top_right)?;

    Ok(MrzTextBlockInfo {
        corners: block.corner_points,
        angle,
        text: block.text.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_corners(left: i32, top: i32, right: i32, bottom: i32) -> [Point; 4] {
        [
            Point::new(left, top),
            Point::new(right, top),
            Point::new(right, bottom),
            Point::new(left, bottom),
        ]
    }

    #[test]
    fn test_marker_detection() {
        assert!(TextBlock::new("P<UTOERIKSSON<<ANNA<<<<<<", rect_corners(0, 0, 1, 1)).is_mrz());
        assert!(!TextBlock::new("P<UTO<<<<<", rect_corners(0, 0, 1, 1)).is_mrz());
        assert!(!TextBlock::new("PASSPORT", rect_corners(0, 0, 1, 1)).is_mrz());
    }

    #[test]
    fn test_first_mrz_block_wins() {
        let blocks = vec![
            TextBlock::new("REPUBLIC OF UTOPIA", rect_corners(0, 0, 100, 10)),
            TextBlock::new("P<UTOERIKSSON<<ANNA<<<<<<<<", rect_corners(10, 300, 410, 320)),
            TextBlock::new("L898902C36UTO<<<<<<<<", rect_corners(10, 330, 410, 350)),
        ];
        let info = find_mrz_block(&blocks).unwrap();
        assert_eq!(info.text, "P<UTOERIKSSON<<ANNA<<<<<<<<");
        assert_eq!(info.corners, rect_corners(10, 300, 410, 320));
        assert!(info.angle.abs() < 1e-3);
    }

    #[test]
    fn test_no_marker() {
        let blocks = vec![TextBlock::new("NAME", rect_corners(0, 0, 10, 10))];
        assert!(matches!(find_mrz_block(&blocks), Err(MrzError::NoMrzDetected { .. })));
        assert!(matches!(find_mrz_block(&[]), Err(MrzError::NoMrzDetected { .. })));
    }

    #[test]
    fn test_degenerate_block() {
        let p = Point::new(5, 5);
        let blocks = vec![TextBlock::new("<<<<<<<<", [p, p, p, p])];
        assert!(matches!(find_mrz_block(&blocks), Err(MrzError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_block_info_equality() {
        let a = MrzTextBlockInfo {
            corners: rect_corners(0, 0, 4, 4),
            angle: 1.5,
            text: "X".into(),
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.angle = 2.0;
        assert_ne!(a, b);
    }
}
