#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use depthcap_image as image;

#[doc(inline)]
pub use depthcap_imgproc as imgproc;

#[doc(inline)]
pub use depthcap_io as io;

#[doc(inline)]
pub use depthcap_3d as k3d;

/// Error types of the extraction and export layer.
pub mod error;

/// Typed sensor grids pulled out of decoded frames.
pub mod extract;

/// Batch conversion of recordings to point clouds and inertial tables.
pub mod export;

pub use error::{ExportError, ExtractError};
