//! Raster operations needed by the scanner: rotate, crop and grayscale

use image::{imageops, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use crate::geometry::{canvas_offset, Rect, Size, Transform};

/// Raster backend
pub trait ImageTransform: Send + Sync {
    /// Rotate clockwise by `degrees` about the image center. The output canvas
    /// is the bounding box of the rotated source, so nothing is clipped.
    fn rotate(&self, image: &RgbaImage, degrees: f32) -> RgbaImage;

    /// Copy the pixels inside `rect`; the rectangle is clamped to the image first
    fn crop(&self, image: &RgbaImage, rect: Rect) -> RgbaImage;
}

/// [`ImageTransform`] backed by `image` and `imageproc`
#[derive(Debug, Clone, Copy)]
pub struct RasterTransform {
    nearest: bool,
}

impl RasterTransform {
    /// Bilinear sampling
    pub fn new() -> Self {
        Self { nearest: false }
    }

    /// Nearest-neighbour sampling (exact pixels at right angles)
    pub fn nearest() -> Self {
        Self { nearest: true }
    }

    fn interpolation(&self) -> Interpolation {
        if self.nearest {
            Interpolation::Nearest
        } else {
            Interpolation::Bilinear
        }
    }
}

impl Default for RasterTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageTransform for RasterTransform {
    fn rotate(&self, image: &RgbaImage, degrees: f32) -> RgbaImage {
        let source = Size::from(image.dimensions());
        let rotated = Transform::rotation_about_center(degrees, source).bounding_size(source);
        let (dx, dy) = canvas_offset(source, rotated);

        let cx = source.width as f32 / 2.0;
        let cy = source.height as f32 / 2.0;
        let projection = Projection::translate(-cx, -cy)
            .and_then(Projection::rotate(degrees.to_radians()))
            .and_then(Projection::translate(cx + dx as f32, cy + dy as f32));

        let mut out = RgbaImage::new(rotated.width, rotated.height);
        warp_into(image, &projection, self.interpolation(), Rgba([0, 0, 0, 0]), &mut out);

        debug!(
            "Rotated {}x{} by {}° onto {}x{}",
            source.width, source.height, degrees, rotated.width, rotated.height
        );
        out
    }

    fn crop(&self, image: &RgbaImage, rect: Rect) -> RgbaImage {
        let rect = rect.clamp_to(Size::from(image.dimensions()));
        imageops::crop_imm(
            image,
            rect.left as u32,
            rect.top as u32,
            rect.width() as u32,
            rect.height() as u32,
        )
        .to_image()
    }
}

/// Convert to grayscale in place, keeping the RGBA layout
pub fn apply_grayscale(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        // Standard luminance weights
        let gray = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;
        pixel.0[0] = gray;
        pixel.0[1] = gray;
        pixel.0[2] = gray;
    }
}
