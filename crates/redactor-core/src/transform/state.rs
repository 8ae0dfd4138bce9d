//! User-controlled transform values.

use serde::{Deserialize, Serialize};

use super::Affine;
use crate::CanvasSize;

/// Axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Uniform scale and rotation applied to the base image around the canvas
/// center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    /// Uniform scale factor (UI range 0.5 to 2.0)
    pub scale: f32,
    /// Rotation in degrees, clockwise (UI range 0 to 360)
    pub rotation_degrees: f32,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }
}

impl TransformState {
    pub const MIN_SCALE: f32 = 0.5;
    pub const MAX_SCALE: f32 = 2.0;
    pub const MAX_ROTATION: f32 = 360.0;

    pub fn new(scale: f32, rotation_degrees: f32) -> Self {
        Self {
            scale,
            rotation_degrees,
        }
    }

    /// Check if rendering with this transform leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        (self.scale - 1.0).abs() < f32::EPSILON && self.normalized_rotation() == 0.0
    }

    /// Clamp both values into the ranges the editor exposes.
    pub fn clamped(self) -> Self {
        Self {
            scale: clamp_or(self.scale, Self::MIN_SCALE, Self::MAX_SCALE, 1.0),
            rotation_degrees: clamp_or(self.rotation_degrees, 0.0, Self::MAX_ROTATION, 0.0),
        }
    }

    /// Rotation folded into `[0, 360)`, so a full turn is exactly zero.
    pub fn normalized_rotation(&self) -> f64 {
        let r = (self.rotation_degrees as f64).rem_euclid(360.0);
        if r.is_finite() {
            r
        } else {
            0.0
        }
    }

    /// The forward transform for a canvas of the given size.
    pub fn to_affine(&self, canvas: CanvasSize) -> Affine {
        let scale = if self.scale.is_finite() {
            self.scale.max(0.0) as f64
        } else {
            1.0
        };
        Affine::about_center(
            canvas.width as f64 / 2.0,
            canvas.height as f64 / 2.0,
            scale,
            self.normalized_rotation(),
        )
    }

    /// Where the transformed base image lands on the canvas, clipped to the
    /// canvas. `None` when nothing is visible.
    pub fn content_bounds(&self, canvas: CanvasSize) -> Option<Bounds> {
        if canvas.is_empty() {
            return None;
        }

        let t = self.to_affine(canvas);
        t.invert()?;

        let (w, h) = (canvas.width as f64, canvas.height as f64);
        let corners = [
            t.apply(0.0, 0.0),
            t.apply(w, 0.0),
            t.apply(0.0, h),
            t.apply(w, h),
        ];

        let mut bounds = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for (x, y) in corners {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }

        Some(Bounds {
            min_x: bounds.min_x.clamp(0.0, w),
            min_y: bounds.min_y.clamp(0.0, h),
            max_x: bounds.max_x.clamp(0.0, w),
            max_y: bounds.max_y.clamp(0.0, h),
        })
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}
