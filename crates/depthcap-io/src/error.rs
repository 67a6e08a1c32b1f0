/// A single field of a frame that could not be produced or restored.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("field `{field}` unavailable: {reason}")]
pub struct FieldUnavailable {
    /// Name of the field as it appears in the whitelist.
    pub field: String,
    /// Human readable cause.
    pub reason: String,
}

impl FieldUnavailable {
    /// Create a new field failure.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// An error type for the container codec.
#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    /// The whitelist block was read or written out of sequence.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A component field could not be produced while writing; the frame is dropped.
    #[error("component {index} of frame could not be written. {source}")]
    ComponentUnavailable {
        /// Index of the component inside the frame.
        index: usize,
        /// The failing field.
        source: FieldUnavailable,
    },

    /// The data ended inside the node section of a frame.
    #[error("recording ends inside a frame at byte {0}")]
    TruncatedFrame(u64),

    /// Error to manipulate the file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),

    /// Error to encode a value.
    #[error("Failed to encode value. {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// Error to decode a value.
    #[error("Failed to decode value. {0}")]
    DecodeError(#[from] bincode::error::DecodeError),
}

/// An error type for the inertial sample decoder.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImuError {
    /// Fewer bytes remain than one record needs.
    #[error("truncated IMU record at byte {offset}: {remaining} bytes left, {} needed", crate::imu::RECORD_SIZE)]
    TruncatedRecord {
        /// Offset of the incomplete record.
        offset: usize,
        /// Number of bytes left in the buffer.
        remaining: usize,
    },
}
