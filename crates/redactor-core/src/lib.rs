//! Redactor Core - pixel pipeline for the photo editor
//!
//! This crate holds everything that touches pixels: decoding picked photos,
//! the sepia/invert filters, freehand ink and text rasterization, and the
//! compositor that flattens an editing session into one bitmap.

pub mod compose;
pub mod decode;
pub mod encode;
pub mod filter;
pub mod ink;
pub mod text;
pub mod transform;

pub use compose::Compositor;
pub use decode::{decode_image, Bitmap, DecodeError};
pub use filter::{apply_filter, apply_filter_with, preview, FilterKind, FilterPreviews};
pub use ink::{InkLayer, InkStroke, StrokeStyle};
pub use text::{FontRasterizer, GlyphRasterizer, TextAnnotation, TextMask};
pub use transform::TransformState;

use serde::{Deserialize, Serialize};

/// A point in canvas space (pixels, y pointing down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Size of the visible editing canvas in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area canvas renders to an empty bitmap.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clamp a point into `[0, width] x [0, height]`.
    pub fn clamp_point(&self, point: Point) -> Point {
        let x = if point.x.is_nan() { 0.0 } else { point.x };
        let y = if point.y.is_nan() { 0.0 } else { point.y };
        Point {
            x: x.clamp(0.0, self.width as f32),
            y: y.clamp(0.0, self.height as f32),
        }
    }
}

/// An 8-bit RGBA color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}
