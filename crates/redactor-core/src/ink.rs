//! Freehand ink layer.
//!
//! Strokes are recorded in canvas space from pointer input and flattened
//! into a transparent overlay with `tiny-skia`. The overlay is composited
//! above the transformed photo without being transformed itself.

use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::decode::Bitmap;
use crate::{CanvasSize, Color, Point};

/// Pen settings applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    /// Line width in canvas pixels (UI range 1 to 15)
    pub line_width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            line_width: 5.0,
        }
    }
}

impl StrokeStyle {
    pub const MIN_LINE_WIDTH: f32 = 1.0;
    pub const MAX_LINE_WIDTH: f32 = 15.0;

    /// Clamp the width into the UI range, snapping to whole pixels.
    pub fn clamped(self) -> Self {
        let width = if self.line_width.is_nan() {
            Self::default().line_width
        } else {
            self.line_width
                .clamp(Self::MIN_LINE_WIDTH, Self::MAX_LINE_WIDTH)
                .round()
        };
        Self {
            color: self.color,
            line_width: width,
        }
    }
}

/// One continuous pen stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkStroke {
    pub style: StrokeStyle,
    pub points: Vec<Point>,
}

/// Ordered strokes, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InkLayer {
    strokes: Vec<InkStroke>,
    drawing: bool,
}

impl InkLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[InkStroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Start a new stroke at `point`. An unfinished stroke is closed first.
    pub fn begin_stroke(&mut self, point: Point, style: StrokeStyle) {
        self.strokes.push(InkStroke {
            style: style.clamped(),
            points: vec![point],
        });
        self.drawing = true;
    }

    /// Append a point to the stroke in progress. Ignored between strokes.
    pub fn extend_stroke(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            if stroke.points.last() != Some(&point) {
                stroke.points.push(point);
            }
        }
    }

    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    /// Flatten every stroke into an RGBA overlay of the canvas size.
    ///
    /// Uncovered pixels are fully transparent. An empty canvas yields an
    /// empty bitmap.
    pub fn rasterize(&self, canvas: CanvasSize) -> Bitmap {
        let Some(mut pixmap) = Pixmap::new(canvas.width, canvas.height) else {
            return Bitmap::transparent(canvas.width, canvas.height);
        };

        for stroke in &self.strokes {
            draw_stroke(&mut pixmap, stroke);
        }

        let mut pixels = Vec::with_capacity(pixmap.pixels().len() * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Bitmap::new(canvas.width, canvas.height, pixels)
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &InkStroke) {
    let Some(first) = stroke.points.first() else {
        return;
    };

    let mut paint = Paint::default();
    let c = stroke.style.color;
    paint.set_color_rgba8(c.r, c.g, c.b, c.a);
    paint.anti_alias = true;

    let width = stroke.style.line_width;

    // A tap without movement leaves a round dot.
    if stroke.points.len() == 1 {
        if let Some(dot) = PathBuilder::from_circle(first.x, first.y, width / 2.0) {
            pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in &stroke.points[1..] {
        pb.line_to(p.x, p.y);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let pen = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &pen, Transform::identity(), None);
}
