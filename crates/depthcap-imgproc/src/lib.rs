#![deny(missing_docs)]
//! Image processing operations for decoded camera components.

/// color transformations module.
pub mod color;

/// utilities for parallel processing.
mod parallel;
