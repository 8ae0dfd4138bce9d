//! Image decoding for the editor.
//!
//! This module provides:
//! - The `Bitmap` type every other module works on
//! - Decoding picked photos (JPEG, PNG) with EXIF orientation applied
//! - Resizing for filter previews
//!
//! All operations are synchronous; callers move them off the interaction
//! thread themselves.

mod photo;
mod resize;
mod types;

pub use photo::decode_image;
pub use resize::{resize, resize_to_fit};
pub use types::{Bitmap, DecodeError, FilterType, Orientation, CHANNELS};
