//! Final image compositor.
//!
//! Flattens an editing session into one bitmap the size of the visible
//! canvas. Layers, bottom to top:
//!
//! 1. The base photo, stretched to the canvas rect, then scaled and rotated
//!    around the canvas center
//! 2. The ink overlay, in canvas space (it does not follow the photo)
//! 3. The text annotation at its canvas position, if it has content
//!
//! Rendering is a single synchronous pass with no hidden state. Rows of the
//! base layer are computed in parallel, so the call is safe to run on a
//! worker thread for large canvases.

use std::sync::Arc;

use rayon::prelude::*;

use crate::decode::{Bitmap, CHANNELS};
use crate::ink::InkLayer;
use crate::text::{GlyphRasterizer, TextAnnotation};
use crate::transform::{sample, InterpolationFilter, TransformState};
use crate::CanvasSize;

/// Renders the final composite.
#[derive(Clone, Default)]
pub struct Compositor {
    glyphs: Option<Arc<dyn GlyphRasterizer>>,
    filter: InterpolationFilter,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("has_glyphs", &self.glyphs.is_some())
            .field("filter", &self.filter)
            .finish()
    }
}

impl Compositor {
    /// A compositor that draws text with `glyphs`.
    pub fn new(glyphs: Arc<dyn GlyphRasterizer>) -> Self {
        Self {
            glyphs: Some(glyphs),
            filter: InterpolationFilter::default(),
        }
    }

    /// A compositor without a font; text annotations are skipped.
    pub fn without_text() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: InterpolationFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Render the session into a new bitmap of `canvas` size.
    ///
    /// A zero-area canvas yields an empty bitmap.
    pub fn render(
        &self,
        base: &Bitmap,
        transform: TransformState,
        ink: &InkLayer,
        text: &TextAnnotation,
        canvas: CanvasSize,
    ) -> Bitmap {
        if canvas.is_empty() {
            return Bitmap::transparent(canvas.width, canvas.height);
        }

        let _span = tracing::debug_span!(
            "render",
            width = canvas.width,
            height = canvas.height,
            scale = transform.scale,
            rotation = transform.rotation_degrees,
        )
        .entered();

        let mut surface = self.draw_base(base, transform, canvas);

        if !ink.is_empty() {
            let overlay = ink.rasterize(canvas);
            blend_bitmap(&mut surface, &overlay);
        }

        if text.is_visible() {
            self.draw_text(&mut surface, text);
        }

        tracing::debug!(strokes = ink.strokes().len(), "composite rendered");
        surface
    }

    fn draw_base(&self, base: &Bitmap, transform: TransformState, canvas: CanvasSize) -> Bitmap {
        let mut surface = Bitmap::transparent(canvas.width, canvas.height);

        if base.is_empty() || !base.is_well_formed() {
            tracing::warn!("base image unusable, rendering overlays only");
            return surface;
        }

        let Some(inverse) = transform.to_affine(canvas).invert() else {
            // Zero scale collapses the photo to nothing.
            return surface;
        };

        // Canvas units to source pixels (the photo is stretched to the canvas).
        let sx = base.width as f64 / canvas.width as f64;
        let sy = base.height as f64 / canvas.height as f64;
        let row_bytes = canvas.width as usize * CHANNELS;
        let filter = self.filter;

        surface
            .pixels
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                let cy = y as f64 + 0.5;
                for (x, dst) in row.chunks_exact_mut(CHANNELS).enumerate() {
                    let (qx, qy) = inverse.apply(x as f64 + 0.5, cy);
                    if let Some(px) = sample(base, qx * sx - 0.5, qy * sy - 0.5, filter) {
                        dst.copy_from_slice(&px);
                    }
                }
            });

        surface
    }

    fn draw_text(&self, surface: &mut Bitmap, text: &TextAnnotation) {
        let Some(glyphs) = &self.glyphs else {
            tracing::warn!("no font configured, skipping text annotation");
            return;
        };
        let Some(mask) = glyphs.rasterize(&text.content, text.font_size) else {
            return;
        };

        let origin_x = text.position.x.round() as i64;
        let origin_y = text.position.y.round() as i64;
        let color = text.color;

        for my in 0..mask.height {
            let y = origin_y + my as i64;
            if y < 0 || y >= surface.height as i64 {
                continue;
            }
            for mx in 0..mask.width {
                let x = origin_x + mx as i64;
                if x < 0 || x >= surface.width as i64 {
                    continue;
                }
                let coverage = mask.get(mx, my);
                if coverage == 0 {
                    continue;
                }
                let alpha = (color.a as u32 * coverage as u32 + 127) / 255;
                let idx = (y as usize * surface.width as usize + x as usize) * CHANNELS;
                blend_over(
                    &mut surface.pixels[idx..idx + CHANNELS],
                    [color.r, color.g, color.b, alpha as u8],
                );
            }
        }
    }
}

/// Source-over composite of an equally sized overlay onto `dst`.
fn blend_bitmap(dst: &mut Bitmap, overlay: &Bitmap) {
    if dst.width != overlay.width || dst.height != overlay.height {
        tracing::warn!("overlay size mismatch, skipping");
        return;
    }
    dst.pixels
        .par_chunks_exact_mut(CHANNELS)
        .zip(overlay.pixels.par_chunks_exact(CHANNELS))
        .for_each(|(d, s)| {
            if s[3] != 0 {
                blend_over(d, [s[0], s[1], s[2], s[3]]);
            }
        });
}

/// Straight-alpha source-over for one pixel.
#[inline]
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        dst.copy_from_slice(&src);
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let c = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        dst[i] = c.clamp(0.0, 255.0).round() as u8;
    }
    dst[3] = (out_a * 255.0).clamp(0.0, 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::StrokeStyle;
    use crate::text::TextMask;
    use crate::{Color, Point};

    /// Draws every character as a solid `size/2 x size` box.
    struct BlockGlyphs;

    impl GlyphRasterizer for BlockGlyphs {
        fn rasterize(&self, text: &str, font_size: f32) -> Option<TextMask> {
            let h = font_size as u32;
            let w = (h / 2).max(1) * text.chars().count() as u32;
            let mut mask = TextMask::new(w, h);
            mask.coverage.iter_mut().for_each(|c| *c = 255);
            Some(mask)
        }
    }

    fn pattern(width: u32, height: u32) -> Bitmap {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[
                    (x * 11 % 256) as u8,
                    (y * 13 % 256) as u8,
                    ((x ^ y) % 256) as u8,
                    255,
                ]);
            }
        }
        Bitmap::new(width, height, pixels)
    }

    fn opaque_bounds(img: &Bitmap) -> Option<(u32, u32, u32, u32)> {
        let mut b: Option<(u32, u32, u32, u32)> = None;
        for y in 0..img.height {
            for x in 0..img.width {
                if img.pixel(x, y).map(|p| p[3]).unwrap_or(0) > 127 {
                    b = Some(match b {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        b
    }

    #[test]
    fn test_identity_reproduces_base() {
        let base = pattern(64, 48);
        let out = Compositor::without_text().render(
            &base,
            TransformState::default(),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(64, 48),
        );
        assert_eq!(out, base);
    }

    #[test]
    fn test_full_turn_reproduces_base() {
        let base = pattern(32, 32);
        let out = Compositor::without_text().render(
            &base,
            TransformState::new(1.0, 360.0),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(32, 32),
        );
        assert_eq!(out, base);
    }

    #[test]
    fn test_empty_canvas_yields_empty_bitmap() {
        let out = Compositor::without_text().render(
            &pattern(10, 10),
            TransformState::default(),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(0, 0),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_output_matches_canvas_not_base() {
        let out = Compositor::without_text().render(
            &pattern(400, 300),
            TransformState::default(),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(100, 80),
        );
        assert_eq!((out.width, out.height), (100, 80));
        assert!(out.pixels.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn test_half_scale_leaves_transparent_border() {
        let base = Bitmap::filled(100, 100, [200, 10, 10, 255]);
        let out = Compositor::without_text().render(
            &base,
            TransformState::new(0.5, 0.0),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(100, 100),
        );
        assert_eq!(out.pixel(5, 5), Some([0, 0, 0, 0]));
        assert_eq!(out.pixel(50, 50), Some([200, 10, 10, 255]));
        assert_eq!(opaque_bounds(&out), Some((25, 25, 74, 74)));
    }

    #[test]
    fn test_rotation_turns_clockwise() {
        // Left half red, right half blue; after +90 the red half is on top.
        let mut base = Bitmap::filled(40, 40, [0, 0, 255, 255]);
        for y in 0..40 {
            for x in 0..20 {
                let idx = ((y * 40 + x) * 4) as usize;
                base.pixels[idx..idx + 4].copy_from_slice(&[255, 0, 0, 255]);
            }
        }
        let out = Compositor::without_text().render(
            &base,
            TransformState::new(1.0, 90.0),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(40, 40),
        );
        assert_eq!(out.pixel(20, 5), Some([255, 0, 0, 255]));
        assert_eq!(out.pixel(20, 34), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_zero_scale_draws_nothing_of_base() {
        let out = Compositor::without_text().render(
            &pattern(20, 20),
            TransformState::new(0.0, 0.0),
            &InkLayer::new(),
            &TextAnnotation::default(),
            CanvasSize::new(20, 20),
        );
        assert!(out.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_ink_is_not_rotated_with_base() {
        let mut ink = InkLayer::new();
        ink.begin_stroke(
            Point::new(5.0, 10.0),
            StrokeStyle {
                color: Color::rgb(0, 255, 0),
                line_width: 4.0,
            },
        );
        ink.extend_stroke(Point::new(35.0, 10.0));
        ink.end_stroke();

        let out = Compositor::without_text().render(
            &Bitmap::filled(40, 40, [50, 50, 50, 255]),
            TransformState::new(1.0, 90.0),
            &ink,
            &TextAnnotation::default(),
            CanvasSize::new(40, 40),
        );
        // Still a horizontal line at y = 10.
        assert_eq!(out.pixel(30, 10), Some([0, 255, 0, 255]));
        assert_eq!(out.pixel(10, 30), Some([50, 50, 50, 255]));
    }

    #[test]
    fn test_text_drawn_at_position() {
        let text = TextAnnotation {
            content: "AB".to_string(),
            color: Color::rgb(255, 255, 0),
            font_size: 10.0,
            position: Point::new(20.0, 30.0),
        };
        let out = Compositor::new(Arc::new(BlockGlyphs)).render(
            &Bitmap::filled(64, 64, [0, 0, 0, 255]),
            TransformState::new(1.3, 45.0),
            &InkLayer::new(),
            &text,
            CanvasSize::new(64, 64),
        );
        // Two 5x10 blocks starting at (20, 30).
        assert_eq!(out.pixel(20, 30), Some([255, 255, 0, 255]));
        assert_eq!(out.pixel(29, 39), Some([255, 255, 0, 255]));
        assert_ne!(out.pixel(30, 30), Some([255, 255, 0, 255]));
        assert_ne!(out.pixel(19, 30), Some([255, 255, 0, 255]));
    }

    #[test]
    fn test_font_text_drawn_near_position() {
        let font = crate::text::FontRasterizer::from_bytes(
            include_bytes!("../tests/fixtures/DejaVuSansMono.ttf").to_vec(),
        )
        .unwrap();
        let text = TextAnnotation {
            content: "HI".to_string(),
            color: Color::rgb(255, 0, 255),
            font_size: 30.0,
            position: Point::new(20.0, 25.0),
        };
        let out = Compositor::new(Arc::new(font)).render(
            &Bitmap::filled(120, 100, [0, 0, 0, 255]),
            TransformState::default(),
            &InkLayer::new(),
            &text,
            CanvasSize::new(120, 100),
        );

        let mut tinted = Vec::new();
        for y in 0..100 {
            for x in 0..120 {
                let [r, g, b, _] = out.pixel(x, y).unwrap();
                if r > 0 && r == b && g == 0 {
                    tinted.push((x, y));
                }
            }
        }
        assert!(!tinted.is_empty());
        // Two 18px advances and a 30px line box below and right of the anchor.
        assert!(tinted.iter().all(|&(x, y)| (20..57).contains(&x) && (25..61).contains(&y)));
    }

    #[test]
    fn test_empty_text_never_drawn() {
        let text = TextAnnotation {
            content: String::new(),
            color: Color::rgb(255, 255, 0),
            font_size: 60.0,
            position: Point::new(0.0, 0.0),
        };
        let base = pattern(32, 32);
        let out = Compositor::new(Arc::new(BlockGlyphs)).render(
            &base,
            TransformState::default(),
            &InkLayer::new(),
            &text,
            CanvasSize::new(32, 32),
        );
        assert_eq!(out, base);
    }

    #[test]
    fn test_text_partially_off_canvas_is_clipped() {
        let text = TextAnnotation {
            content: "ABCDEFGH".to_string(),
            color: Color::WHITE,
            font_size: 20.0,
            position: Point::new(30.0, 30.0),
        };
        let out = Compositor::new(Arc::new(BlockGlyphs)).render(
            &Bitmap::filled(32, 32, [0, 0, 0, 255]),
            TransformState::default(),
            &InkLayer::new(),
            &text,
            CanvasSize::new(32, 32),
        );
        assert_eq!(out.pixel(31, 31), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_text_without_font_is_skipped() {
        let text = TextAnnotation {
            content: "hello".to_string(),
            ..TextAnnotation::default()
        };
        let base = pattern(16, 16);
        let out = Compositor::without_text().render(
            &base,
            TransformState::default(),
            &InkLayer::new(),
            &text,
            CanvasSize::new(16, 16),
        );
        assert_eq!(out, base);
    }

    #[test]
    fn test_blend_over_half_alpha() {
        let mut dst = [0u8, 0, 0, 255];
        blend_over(&mut dst, [255, 255, 255, 128]);
        assert_eq!(dst, [128, 128, 128, 255]);

        let mut dst = [0u8, 0, 0, 0];
        blend_over(&mut dst, [10, 20, 30, 0]);
        assert_eq!(dst, [0, 0, 0, 0]);
    }
}
