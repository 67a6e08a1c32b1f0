#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Optional post-filter for pixels flagged as invalid by the camera.
pub mod filter;

/// Camera intrinsics of range components.
pub mod intrinsics;

/// I/O utilities for writing and reading point clouds.
pub mod io;

/// Point cloud container.
pub mod pointcloud;

/// Rigid camera-to-world pose.
pub mod pose;

/// Depth grid to 3D point projection.
pub mod projection;
