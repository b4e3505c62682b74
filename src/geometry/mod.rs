//! Pixel geometry used to locate the MRZ inside a photo
//!
//! All coordinates are image coordinates: origin at the top-left corner,
//! y growing downwards.

pub mod orientation;
pub mod zone;

pub use orientation::estimate_angle;
pub use zone::{calculate_zone, ZoneParams};

use serde::{Deserialize, Serialize};

/// Integer pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle, `left..right` x `top..bottom`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Restrict the rectangle to `[0, width] x [0, height]`
    pub fn clamp_to(&self, size: Size) -> Rect {
        let max_x = size.width as i32;
        let max_y = size.height as i32;
        let left = self.left.clamp(0, max_x);
        let top = self.top.clamp(0, max_y);
        Rect {
            left,
            top,
            right: self.right.clamp(left, max_x),
            bottom: self.bottom.clamp(top, max_y),
        }
    }

    /// Whether the rectangle lies entirely inside an image of `size`
    pub fn is_within(&self, size: Size) -> bool {
        self.left >= 0
            && self.top >= 0
            && self.left <= self.right
            && self.top <= self.bottom
            && self.right <= size.width as i32
            && self.bottom <= size.height as i32
    }
}

/// 2D affine transform
///
/// Maps `(x, y)` to `(a*x + b*y + c, d*x + e*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    /// Rotation by `degrees` around `(cx, cy)`; positive angles turn clockwise on screen
    pub fn rotation(degrees: f32, cx: f32, cy: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: cx - cos * cx + sin * cy,
            d: sin,
            e: cos,
            f: cy - sin * cx - cos * cy,
        }
    }

    /// Rotation around the center of an image of `size`
    pub fn rotation_about_center(degrees: f32, size: Size) -> Self {
        Self::rotation(degrees, size.width as f32 / 2.0, size.height as f32 / 2.0)
    }

    pub fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    pub fn map_point(&self, point: Point) -> (f32, f32) {
        self.map(point.x as f32, point.y as f32)
    }

    /// Size of the smallest canvas holding an image of `size` after this transform
    pub fn bounding_size(&self, size: Size) -> Size {
        let (w, h) = (size.width as f32, size.height as f32);
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(x, y)| self.map(x, y));

        let min_x = corners.iter().map(|p| p.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|p| p.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max);

        Size::new((max_x - min_x).round() as u32, (max_y - min_y).round() as u32)
    }
}

/// Offset that re-centers content rotated about the source center on the expanded canvas
pub fn canvas_offset(source: Size, rotated: Size) -> (i32, i32) {
    (
        (rotated.width as i32 - source.width as i32) / 2,
        (rotated.height as i32 - source.height as i32) / 2,
    )
}
