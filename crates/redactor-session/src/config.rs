//! Editor configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration. Values are checked on load; ranges must stay inside
//! the limits the pixel pipeline enforces.

use std::path::Path;

use redactor_core::filter::{PREVIEW_EDGE, SEPIA_INTENSITY};
use redactor_core::{CanvasSize, StrokeStyle, TextAnnotation, TransformState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating an [`EditorConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// An inclusive `[min, max]` range for a slider value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range; NaN becomes `fallback`.
    pub fn clamp(self, value: f32, fallback: f32) -> f32 {
        if value.is_nan() {
            fallback
        } else {
            value.clamp(self.min, self.max)
        }
    }

    fn is_within(self, outer: Range) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min <= self.max
            && self.min >= outer.min
            && self.max <= outer.max
    }
}

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Size of the visible canvas the final image is rendered at
    pub canvas: CanvasSize,
    /// Sepia blend strength, 0 to 1
    pub sepia_intensity: f32,
    /// Edge length of the square filter previews
    pub preview_edge: u32,
    pub scale_range: Range,
    pub line_width_range: Range,
    pub font_size_range: Range,
    /// Quality for JPEG sharing, 1 to 100
    pub jpeg_quality: u8,
    /// Buffered session events per subscriber
    pub event_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::new(1080, 1440),
            sepia_intensity: SEPIA_INTENSITY,
            preview_edge: PREVIEW_EDGE,
            scale_range: Range::new(TransformState::MIN_SCALE, TransformState::MAX_SCALE),
            line_width_range: Range::new(StrokeStyle::MIN_LINE_WIDTH, StrokeStyle::MAX_LINE_WIDTH),
            font_size_range: Range::new(TextAnnotation::MIN_FONT_SIZE, TextAnnotation::MAX_FONT_SIZE),
            jpeg_quality: 90,
            event_capacity: 100,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), "editor config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.is_empty() {
            return Err(invalid("canvas", "width and height must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.sepia_intensity) {
            return Err(invalid("sepia_intensity", "must be between 0 and 1"));
        }
        if self.preview_edge == 0 {
            return Err(invalid("preview_edge", "must be non-zero"));
        }
        let scale_limits = Range::new(TransformState::MIN_SCALE, TransformState::MAX_SCALE);
        if !self.scale_range.is_within(scale_limits) {
            return Err(invalid("scale_range", "must lie within 0.5 to 2"));
        }
        let line_limits = Range::new(StrokeStyle::MIN_LINE_WIDTH, StrokeStyle::MAX_LINE_WIDTH);
        if !self.line_width_range.is_within(line_limits) {
            return Err(invalid("line_width_range", "must lie within 1 to 15"));
        }
        let font_limits = Range::new(TextAnnotation::MIN_FONT_SIZE, TextAnnotation::MAX_FONT_SIZE);
        if !self.font_size_range.is_within(font_limits) {
            return Err(invalid("font_size_range", "must lie within 10 to 60"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(invalid("jpeg_quality", "must be between 1 and 100"));
        }
        if self.event_capacity == 0 {
            return Err(invalid("event_capacity", "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
