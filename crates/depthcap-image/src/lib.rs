#![deny(missing_docs)]
//! Image types used to hold reshaped sensor components.

/// image representation for decoded sensor grids.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
