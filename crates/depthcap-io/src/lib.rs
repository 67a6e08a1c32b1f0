#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the container codec.
///
/// Defines [`error::ContainerError`] for fatal container failures and
/// [`error::FieldUnavailable`] for recoverable per-field failures.
pub mod error;

/// Self-describing values stored in a recording.
pub mod value;

/// Upstream data sources the writer evaluates its accessors against.
///
/// In-memory implementations are provided for offline use and testing.
pub mod source;

/// Typed accessors, whitelists and the per-section recovery policies.
pub mod schema;

/// Decoded frame records.
pub mod frame;

/// Sequential writer of frame recordings.
pub mod writer;

/// Sequential and random-access reader of frame recordings.
pub mod reader;

/// Fixed-layout inertial measurement sample decoder.
pub mod imu;

// on-disk slot framing shared by reader and writer
mod slot;

pub use error::{ContainerError, FieldUnavailable, ImuError};
pub use frame::{ComponentMap, Frame};
pub use imu::{ImuParser, ImuSample};
pub use reader::{FrameReader, ReaderConfig, ReaderState};
pub use schema::{ComponentCount, Schema, Whitelists};
pub use value::{SampleBuffer, Value};
pub use writer::{FrameWriter, WriterConfig};
