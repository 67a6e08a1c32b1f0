use crate::error::{ContainerError, FieldUnavailable};
use crate::source::{BufferSource, ComponentSource, NodeKey, NodeSource};
use crate::value::Value;

/// Reads a device feature for the node section of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAccessor(pub NodeKey);

impl NodeAccessor {
    /// Evaluate the accessor against the live feature values.
    pub fn evaluate(&self, nodes: &dyn NodeSource) -> Result<Value, FieldUnavailable> {
        nodes.read(&self.0)
    }
}

/// Produces a value of the buffer-metadata section of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferAccessor {
    /// Device frame counter.
    FrameId,
    /// Capture timestamp in nanoseconds.
    TimestampNs,
    /// Number of components serialized for the frame.
    NumComponents,
    /// Per-frame chunk metadata read from the feature values.
    Chunk(NodeKey),
}

/// Everything the buffer-metadata accessors may look at.
pub struct FrameContext<'a> {
    /// The captured buffer.
    pub buffer: &'a dyn BufferSource,
    /// The live feature values.
    pub nodes: &'a dyn NodeSource,
    /// Number of components the writer serializes for this frame.
    pub num_components: usize,
}

impl BufferAccessor {
    /// Evaluate the accessor for one frame.
    pub fn evaluate(&self, ctx: &FrameContext<'_>) -> Result<Value, FieldUnavailable> {
        match self {
            BufferAccessor::FrameId => ctx.buffer.frame_id().map(Value::UInt),
            BufferAccessor::TimestampNs => ctx.buffer.timestamp_ns().map(Value::UInt),
            BufferAccessor::NumComponents => Ok(Value::from(ctx.num_components)),
            BufferAccessor::Chunk(key) => ctx.nodes.read(key),
        }
    }
}

/// Produces a value of the per-component section of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAccessor {
    /// Format tag of the samples.
    DataFormat,
    /// Width in pixels.
    Width,
    /// Height in pixels.
    Height,
    /// Number of rows actually delivered.
    DeliveredImageHeight,
    /// Flat sample array.
    Data,
}

impl MapAccessor {
    /// Evaluate the accessor for one component.
    pub fn evaluate(&self, component: &dyn ComponentSource) -> Result<Value, FieldUnavailable> {
        match self {
            MapAccessor::DataFormat => component.data_format().map(Value::Text),
            MapAccessor::Width => component.width().map(Value::from),
            MapAccessor::Height => component.height().map(Value::from),
            MapAccessor::DeliveredImageHeight => {
                component.delivered_image_height().map(Value::from)
            }
            MapAccessor::Data => component.data().map(Value::Samples),
        }
    }
}

/// Recovery policies of the three frame sections.
///
/// * node values are substituted with the `"N/A"` sentinel,
/// * buffer-metadata values are skipped,
/// * component values abort the frame.
pub trait FieldResultExt {
    /// Node section policy.
    fn or_sentinel(self) -> Value;
    /// Buffer-metadata section policy.
    fn or_skip(self) -> Option<Value>;
    /// Component section policy.
    fn or_abort(self, component: usize) -> Result<Value, ContainerError>;
}

impl FieldResultExt for Result<Value, FieldUnavailable> {
    fn or_sentinel(self) -> Value {
        self.unwrap_or_else(|err| {
            log::debug!("{err}, storing sentinel");
            Value::not_available()
        })
    }

    fn or_skip(self) -> Option<Value> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{err}, field skipped");
                None
            }
        }
    }

    fn or_abort(self, component: usize) -> Result<Value, ContainerError> {
        self.map_err(|source| ContainerError::ComponentUnavailable {
            index: component,
            source,
        })
    }
}

/// How many components a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ComponentCount {
    /// Exactly this many components per frame.
    Fixed(usize),
    /// Use the count recorded in the `numComponents` field.
    Recorded,
}

impl Default for ComponentCount {
    fn default() -> Self {
        ComponentCount::Fixed(1)
    }
}

/// Name of the buffer-metadata field holding the component count.
pub const NUM_COMPONENTS: &str = "numComponents";

/// The three ordered name lists a recording commits to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Whitelists {
    /// Node value names.
    pub nodes: Vec<String>,
    /// Buffer-metadata names.
    pub buffer: Vec<String>,
    /// Per-component names.
    pub maps: Vec<String>,
}

/// The ordered typed accessors of a recording.
///
/// The names form the [`Whitelists`] written at the start of the file; the accessors
/// are evaluated for every stored frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Node section.
    pub nodes: Vec<(String, NodeAccessor)>,
    /// Buffer-metadata section.
    pub buffer: Vec<(String, BufferAccessor)>,
    /// Per-component section.
    pub maps: Vec<(String, MapAccessor)>,
}

impl Schema {
    /// The whitelists of the schema.
    pub fn whitelists(&self) -> Whitelists {
        Whitelists {
            nodes: self.nodes.iter().map(|(n, _)| n.clone()).collect(),
            buffer: self.buffer.iter().map(|(n, _)| n.clone()).collect(),
            maps: self.maps.iter().map(|(n, _)| n.clone()).collect(),
        }
    }

    /// The schema used to record Visionary time-of-flight and stereo cameras.
    pub fn visionary() -> Self {
        const COORD_SELECTOR: &str = "ChunkScan3dCoordinateSelector";
        let node = |name: &str, key: NodeKey| (name.to_string(), NodeAccessor(key));
        let buffer = |name: &str, accessor: BufferAccessor| (name.to_string(), accessor);
        let chunk = |name: &str, feature: &str| {
            buffer(name, BufferAccessor::Chunk(NodeKey::feature(feature)))
        };
        let coordinate = |name: &str, entry: &str, feature: &str| {
            buffer(
                name,
                BufferAccessor::Chunk(NodeKey::selected(COORD_SELECTOR, entry, feature)),
            )
        };

        Self {
            nodes: vec![
                node(
                    "AcquisitionFrameRate",
                    NodeKey::feature("AcquisitionFrameRate"),
                ),
                node("ExposureTime", NodeKey::feature("ExposureTime")),
                node("ExposureAuto", NodeKey::feature("ExposureAuto")),
                node(
                    "ExposureAutoFrameRateMin",
                    NodeKey::feature("ExposureAutoFrameRateMin"),
                ),
                node("FieldOfView", NodeKey::feature("FieldOfView")),
                node("MultiSlopeMode", NodeKey::feature("MultiSlopeMode")),
                node(
                    "DataFilterEnable",
                    NodeKey::feature("Scan3dDataFilterEnable"),
                ),
                node(
                    "DepthValidationFilterLevel",
                    NodeKey::selected(
                        "Scan3dDataFilterSelector",
                        "ValidationFilter",
                        "Scan3dDepthValidationFilterLevel",
                    ),
                ),
            ],
            buffer: vec![
                buffer("frame_id", BufferAccessor::FrameId),
                buffer("timestamp_ns", BufferAccessor::TimestampNs),
                buffer(NUM_COMPONENTS, BufferAccessor::NumComponents),
                chunk("FocalLength", "ChunkScan3dFocalLength"),
                chunk("AspectRatio", "ChunkScan3dAspectRatio"),
                chunk("PrincipalPointU", "ChunkScan3dPrincipalPointU"),
                chunk("PrincipalPointV", "ChunkScan3dPrincipalPointV"),
                coordinate("CoordinateScaleA", "CoordinateA", "ChunkScan3dCoordinateScale"),
                coordinate("CoordinateOffsetA", "CoordinateA", "ChunkScan3dCoordinateOffset"),
                coordinate("CoordinateScaleB", "CoordinateB", "ChunkScan3dCoordinateScale"),
                coordinate("CoordinateOffsetB", "CoordinateB", "ChunkScan3dCoordinateOffset"),
                coordinate("CoordinateScaleC", "CoordinateC", "ChunkScan3dCoordinateScale"),
                coordinate("CoordinateOffsetC", "CoordinateC", "ChunkScan3dCoordinateOffset"),
            ],
            maps: vec![
                ("data_format".to_string(), MapAccessor::DataFormat),
                ("width".to_string(), MapAccessor::Width),
                ("height".to_string(), MapAccessor::Height),
                (
                    "delivered_image_height".to_string(),
                    MapAccessor::DeliveredImageHeight,
                ),
                ("data".to_string(), MapAccessor::Data),
            ],
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::visionary()
    }
}
