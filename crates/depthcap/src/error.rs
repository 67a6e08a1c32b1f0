use depthcap_3d::io::ply::PlyError;
use depthcap_3d::projection::ProjectionError;
use depthcap_image::ImageError;
use depthcap_io::{ContainerError, ImuError};

/// An error raised while pulling a typed grid out of a frame.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// No component of the frame carries the requested format tag.
    #[error("no component with data format `{0}`")]
    NotFound(String),

    /// A component lacks a field needed to reshape it.
    #[error("component `{format}` has no `{field}` field")]
    MissingField {
        /// Format tag of the component.
        format: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A component holds fewer samples than its size requires.
    #[error("component `{format}` holds {available} samples, {required} required")]
    ShortData {
        /// Format tag of the component.
        format: String,
        /// Number of samples in the component.
        available: usize,
        /// Number of samples required by its size.
        required: usize,
    },

    /// A component holds samples of the wrong width.
    #[error("component `{format}` holds {item_size}-byte samples, 8-bit samples required")]
    SampleType {
        /// Format tag of the component.
        format: String,
        /// Size of one sample in bytes.
        item_size: usize,
    },

    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// An error raised while exporting a recording.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    /// The recording could not be read.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A frame does not carry the required components.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The projected grids could not be combined.
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// The point cloud could not be written.
    #[error(transparent)]
    Ply(#[from] PlyError),

    /// An inertial byte stream ends with a partial record.
    #[error(transparent)]
    Imu(#[from] ImuError),

    /// Error to manipulate an output file.
    #[error("Failed to manipulate the file. {0}")]
    FileError(#[from] std::io::Error),
}
