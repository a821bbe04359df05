use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size { width: 0, height: 0 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect { x: 0, y: 0, size: Size::ZERO };

    /// Rectangle anchored at the origin
    pub const fn with_size(size: Size) -> Self {
        Self { x: 0, y: 0, size }
    }
}

/// 2D affine transform in the `[a b; c d] + (tx, ty)` convention used by
/// container display matrices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    /// Clockwise rotation snapped to the nearest quarter turn.
    pub fn rotation(degrees: i32) -> Self {
        let (sin, cos) = match degrees.rem_euclid(360) {
            90 => (1.0, 0.0),
            180 => (0.0, -1.0),
            270 => (-1.0, 0.0),
            _ => (0.0, 1.0),
        };
        Self { a: cos, b: sin, c: -sin, d: cos, tx: 0.0, ty: 0.0 }
    }

    /// Clockwise rotation in quarter turns (0, 90, 180 or 270).
    pub fn rotation_degrees(&self) -> i32 {
        let degrees = self.b.atan2(self.a).to_degrees().round() as i32;
        let quarter = ((degrees as f64 / 90.0).round() as i32) * 90;
        quarter.rem_euclid(360)
    }

    /// Size of a frame after the transform is applied
    pub fn apply_to_size(&self, size: Size) -> Size {
        match self.rotation_degrees() {
            90 | 270 => Size::new(size.height, size.width),
            _ => size,
        }
    }
}
