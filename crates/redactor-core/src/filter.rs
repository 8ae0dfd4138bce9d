//! Built-in color filters
//!
//! Two fixed filters are offered in the picker strip:
//!
//! - **Sepia**: the classic sepia matrix, blended with the source at a fixed
//!   intensity of 0.8
//! - **Invert**: `255 - c` per color channel
//!
//! Alpha is never touched. Both are pure: the same input always yields the
//! same output, and a malformed bitmap yields `None` instead of an error.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::decode::{resize, Bitmap, FilterType, CHANNELS};

/// Intensity the editor uses for the sepia filter.
pub const SEPIA_INTENSITY: f32 = 0.8;

/// Edge length of the square picker previews.
pub const PREVIEW_EDGE: u32 = 60;

/// Sepia tone matrix (rows produce R, G, B from input R, G, B).
const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// The filters offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    Sepia,
    Invert,
}

impl FilterKind {
    pub const ALL: [FilterKind; 2] = [FilterKind::Sepia, FilterKind::Invert];

    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Sepia => "Sepia",
            FilterKind::Invert => "Invert",
        }
    }
}

/// Apply a filter to a full-resolution image.
///
/// Returns `None` if the image is empty or its buffer does not match its
/// dimensions.
pub fn apply_filter(image: &Bitmap, kind: FilterKind) -> Option<Bitmap> {
    apply_filter_with(image, kind, SEPIA_INTENSITY)
}

/// [`apply_filter`] with a configurable sepia intensity.
pub fn apply_filter_with(image: &Bitmap, kind: FilterKind, sepia_intensity: f32) -> Option<Bitmap> {
    match kind {
        FilterKind::Sepia => sepia_tone(image, sepia_intensity),
        FilterKind::Invert => invert(image),
    }
}

/// A `PREVIEW_EDGE` square thumbnail of the filter applied to `image`.
pub fn preview(image: &Bitmap, kind: FilterKind) -> Option<Bitmap> {
    preview_sized(image, kind, PREVIEW_EDGE, SEPIA_INTENSITY)
}

/// Like [`preview`] with a custom edge length and sepia intensity.
///
/// The thumbnail is squashed to a square, matching the picker tile.
pub fn preview_sized(
    image: &Bitmap,
    kind: FilterKind,
    edge: u32,
    sepia_intensity: f32,
) -> Option<Bitmap> {
    // Shrink first so the per-pixel filter only touches edge x edge pixels.
    // Both filters are per-pixel, so the order only moves values by rounding.
    let thumb = resize(image, edge, edge, FilterType::Bilinear).ok()?;
    apply_filter_with(&thumb, kind, sepia_intensity)
}

/// Blend the sepia matrix result with the source by `intensity` (0 to 1).
///
/// Intensity 0 returns an identical copy.
pub fn sepia_tone(image: &Bitmap, intensity: f32) -> Option<Bitmap> {
    let intensity = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };
    map_pixels(image, |px| {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        for (channel, row) in SEPIA_MATRIX.iter().enumerate() {
            let toned = (row[0] * r + row[1] * g + row[2] * b).min(255.0);
            let source = px[channel] as f32;
            let blended = source * (1.0 - intensity) + toned * intensity;
            px[channel] = blended.clamp(0.0, 255.0).round() as u8;
        }
    })
}

/// Invert every color channel, keeping alpha.
pub fn invert(image: &Bitmap) -> Option<Bitmap> {
    map_pixels(image, |px| {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    })
}

fn map_pixels<F>(image: &Bitmap, op: F) -> Option<Bitmap>
where
    F: Fn(&mut [u8]) + Sync + Send,
{
    if image.is_empty() || !image.is_well_formed() {
        tracing::warn!(
            width = image.width,
            height = image.height,
            bytes = image.pixels.len(),
            "skipping filter on unusable bitmap"
        );
        return None;
    }

    let mut pixels = image.pixels.clone();
    pixels.par_chunks_exact_mut(CHANNELS).for_each(&op);
    Some(Bitmap::new(image.width, image.height, pixels))
}

/// Both picker previews computed from one snapshot of the working image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPreviews {
    pub sepia: Option<Bitmap>,
    pub invert: Option<Bitmap>,
}

impl FilterPreviews {
    pub fn generate(source: &Bitmap, edge: u32, sepia_intensity: f32) -> Self {
        Self {
            sepia: preview_sized(source, FilterKind::Sepia, edge, sepia_intensity),
            invert: preview_sized(source, FilterKind::Invert, edge, sepia_intensity),
        }
    }

    pub fn get(&self, kind: FilterKind) -> Option<&Bitmap> {
        match kind {
            FilterKind::Sepia => self.sepia.as_ref(),
            FilterKind::Invert => self.invert.as_ref(),
        }
    }
}
