//! Text annotation and glyph rasterization.
//!
//! The annotation is a single line of text drawn with its top-left corner at
//! `position` in canvas space. Glyph coverage comes from a `GlyphRasterizer`;
//! `FontRasterizer` provides one backed by `ab_glyph`.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CanvasSize, Color, Point};

/// Errors from loading a font.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("Invalid font data: {0}")]
    InvalidFont(String),
}

/// A user-placed text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub content: String,
    pub color: Color,
    /// Font size in pixels (UI range 10 to 60)
    pub font_size: f32,
    /// Top-left corner of the text in canvas space
    pub position: Point,
}

impl Default for TextAnnotation {
    fn default() -> Self {
        Self {
            content: String::new(),
            color: Color::WHITE,
            font_size: 24.0,
            position: Point::new(0.0, 0.0),
        }
    }
}

impl TextAnnotation {
    pub const MIN_FONT_SIZE: f32 = 10.0;
    pub const MAX_FONT_SIZE: f32 = 60.0;

    /// Default annotation placed horizontally centered near the top.
    pub fn centered_in(canvas: CanvasSize) -> Self {
        Self {
            position: canvas.clamp_point(Point::new(canvas.width as f32 / 2.0, 150.0)),
            ..Self::default()
        }
    }

    /// Only non-empty text is ever drawn.
    pub fn is_visible(&self) -> bool {
        !self.content.is_empty()
    }

    /// Move the text to `point`, clamped into the canvas bounds.
    pub fn drag_to(&mut self, point: Point, canvas: CanvasSize) {
        self.position = canvas.clamp_point(point);
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = if size.is_nan() {
            Self::default().font_size
        } else {
            size.clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE).round()
        };
    }
}

/// Per-pixel coverage of rasterized text, row-major, 0 to 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<u8>,
}

impl TextMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0; width as usize * height as usize],
        }
    }

    /// Coverage at `(x, y)`; 0 outside the mask or past a short buffer.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.coverage.get(idx).copied().unwrap_or(0)
    }

    /// Keep the larger coverage where glyphs overlap.
    #[inline]
    fn accumulate(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            if let Some(c) = self.coverage.get_mut(idx) {
                *c = (*c).max(value);
            }
        }
    }
}

/// Turns a string into a coverage mask.
pub trait GlyphRasterizer: Send + Sync {
    /// Rasterize `text` at `font_size` pixels. `None` when nothing would be
    /// drawn.
    fn rasterize(&self, text: &str, font_size: f32) -> Option<TextMask>;
}

/// Glyph rasterizer backed by an outline font.
#[derive(Clone)]
pub struct FontRasterizer {
    font: FontArc,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer").finish_non_exhaustive()
    }
}

impl FontRasterizer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load a TrueType/OpenType font from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TextError> {
        FontArc::try_from_vec(bytes)
            .map(Self::new)
            .map_err(|e| TextError::InvalidFont(e.to_string()))
    }

    /// Lay out a single line; returns glyph ids with their pen x, the line
    /// width and the ascent/descent.
    fn layout(&self, text: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32, f32, f32) {
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor_x = 0.0f32;
        let mut last: Option<GlyphId> = None;

        for ch in text.chars().filter(|c| !c.is_control()) {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = last {
                cursor_x += scaled.kern(prev, id);
            }
            glyphs.push((id, cursor_x));
            cursor_x += scaled.h_advance(id);
            last = Some(id);
        }

        (glyphs, cursor_x, scaled.ascent(), scaled.descent())
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&self, text: &str, font_size: f32) -> Option<TextMask> {
        if text.is_empty() || font_size.is_nan() || font_size <= 0.0 {
            return None;
        }

        let scale = PxScale::from(font_size);
        let (glyphs, line_width, ascent, descent) = self.layout(text, scale);

        let width = line_width.ceil().max(1.0) as u32;
        let height = (ascent - descent).ceil().max(1.0) as u32;
        let mut mask = TextMask::new(width, height);

        for (id, x) in glyphs {
            let glyph = id.with_scale_and_position(scale, point(x, ascent));
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, cov| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px >= 0 && py >= 0 {
                    let value = (cov.clamp(0.0, 1.0) * 255.0).round() as u8;
                    mask.accumulate(px as u32, py as u32, value);
                }
            });
        }

        Some(mask)
    }
}
