//! Geometric transform of the base image.
//!
//! # Coordinate System
//!
//! - Canvas space, origin at the top-left corner, y pointing down
//! - Rotation angles are in degrees, positive = clockwise on screen
//! - Scale and rotation pivot around the canvas center
//!
//! The base image is first stretched to fill the canvas rect, then the
//! transform is applied. Rendering uses inverse mapping: each output pixel
//! center is mapped back into the source and sampled.

mod affine;
mod state;

pub use affine::{sample, Affine, InterpolationFilter};
pub use state::{Bounds, TransformState};
