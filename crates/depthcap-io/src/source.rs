use std::collections::HashMap;

use crate::error::FieldUnavailable;
use crate::value::{SampleBuffer, Value};

/// Address of a device feature, optionally behind a selector.
///
/// Some features are multiplexed: e.g. the coordinate scale is only meaningful after
/// `ChunkScan3dCoordinateSelector` has been set to `CoordinateC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    /// Feature name, e.g. `ExposureTime`.
    pub feature: String,
    /// Optional `(selector, entry)` that must be applied before reading the feature.
    pub selector: Option<(String, String)>,
}

impl NodeKey {
    /// A plain feature.
    pub fn feature(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            selector: None,
        }
    }

    /// A feature read after setting `selector` to `entry`.
    pub fn selected(
        selector: impl Into<String>,
        entry: impl Into<String>,
        feature: impl Into<String>,
    ) -> Self {
        Self {
            feature: feature.into(),
            selector: Some((selector.into(), entry.into())),
        }
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.selector {
            Some((selector, entry)) => write!(f, "{}[{}={}]", self.feature, selector, entry),
            None => write!(f, "{}", self.feature),
        }
    }
}

/// A source of device feature values, resolvable by key.
pub trait NodeSource {
    /// Read the current value of a feature.
    fn read(&self, key: &NodeKey) -> Result<Value, FieldUnavailable>;
}

/// One physical sensor component of a captured buffer.
pub trait ComponentSource {
    /// Format tag of the samples, e.g. `Coord3D_C16`.
    fn data_format(&self) -> Result<String, FieldUnavailable>;
    /// Width in pixels.
    fn width(&self) -> Result<usize, FieldUnavailable>;
    /// Height in pixels.
    fn height(&self) -> Result<usize, FieldUnavailable>;
    /// Number of rows actually delivered.
    fn delivered_image_height(&self) -> Result<usize, FieldUnavailable>;
    /// Flat sample array.
    fn data(&self) -> Result<SampleBuffer, FieldUnavailable>;
}

/// A captured buffer holding per-frame metadata and its components.
pub trait BufferSource {
    /// Device frame counter.
    fn frame_id(&self) -> Result<u64, FieldUnavailable>;
    /// Capture timestamp in nanoseconds.
    fn timestamp_ns(&self) -> Result<u64, FieldUnavailable>;
    /// Number of components carried by the buffer.
    fn num_components(&self) -> usize;
    /// Access a component by index.
    fn component(&self, index: usize) -> Option<&dyn ComponentSource>;
}

/// In-memory feature values, keyed by [`NodeKey`].
///
/// Keys that were never inserted read as unavailable, like a feature that is locked
/// on the device at capture time.
#[derive(Debug, Clone, Default)]
pub struct NodeValues {
    values: HashMap<NodeKey, Value>,
}

impl NodeValues {
    /// Create an empty set of feature values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a feature.
    pub fn insert(&mut self, key: NodeKey, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key, value.into());
        self
    }

    /// Builder variant of [`NodeValues::insert`].
    pub fn with(mut self, key: NodeKey, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }
}

impl NodeSource for NodeValues {
    fn read(&self, key: &NodeKey) -> Result<Value, FieldUnavailable> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| FieldUnavailable::new(key.to_string(), "feature is not readable"))
    }
}

/// An in-memory component as produced by the acquisition layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Format tag of the samples.
    pub data_format: String,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Number of rows actually delivered.
    pub delivered_image_height: usize,
    /// Flat sample array.
    pub data: SampleBuffer,
}

impl Component {
    /// Create a fully delivered component.
    pub fn new(
        data_format: impl Into<String>,
        width: usize,
        height: usize,
        data: SampleBuffer,
    ) -> Self {
        Self {
            data_format: data_format.into(),
            width,
            height,
            delivered_image_height: height,
            data,
        }
    }
}

impl ComponentSource for Component {
    fn data_format(&self) -> Result<String, FieldUnavailable> {
        Ok(self.data_format.clone())
    }

    fn width(&self) -> Result<usize, FieldUnavailable> {
        Ok(self.width)
    }

    fn height(&self) -> Result<usize, FieldUnavailable> {
        Ok(self.height)
    }

    fn delivered_image_height(&self) -> Result<usize, FieldUnavailable> {
        Ok(self.delivered_image_height)
    }

    fn data(&self) -> Result<SampleBuffer, FieldUnavailable> {
        Ok(self.data.clone())
    }
}

/// An in-memory captured buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedBuffer {
    /// Device frame counter, if delivered.
    pub frame_id: Option<u64>,
    /// Capture timestamp in nanoseconds, if delivered.
    pub timestamp_ns: Option<u64>,
    /// Components of the buffer.
    pub components: Vec<Component>,
}

impl BufferSource for CapturedBuffer {
    fn frame_id(&self) -> Result<u64, FieldUnavailable> {
        self.frame_id
            .ok_or_else(|| FieldUnavailable::new("frame_id", "not delivered"))
    }

    fn timestamp_ns(&self) -> Result<u64, FieldUnavailable> {
        self.timestamp_ns
            .ok_or_else(|| FieldUnavailable::new("timestamp_ns", "not delivered"))
    }

    fn num_components(&self) -> usize {
        self.components.len()
    }

    fn component(&self, index: usize) -> Option<&dyn ComponentSource> {
        self.components
            .get(index)
            .map(|c| c as &dyn ComponentSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_values_lookup() {
        let nodes = NodeValues::new()
            .with(NodeKey::feature("ExposureTime"), 1000.0)
            .with(
                NodeKey::selected(
                    "ChunkScan3dCoordinateSelector",
                    "CoordinateC",
                    "ChunkScan3dCoordinateScale",
                ),
                0.25,
            );

        assert_eq!(
            nodes.read(&NodeKey::feature("ExposureTime")),
            Ok(Value::Float(1000.0))
        );
        // same feature behind another selector entry is a different key
        let other = NodeKey::selected(
            "ChunkScan3dCoordinateSelector",
            "CoordinateA",
            "ChunkScan3dCoordinateScale",
        );
        let err = nodes.read(&other).unwrap_err();
        assert!(err.field.contains("CoordinateA"));
    }

    #[test]
    fn test_captured_buffer() {
        let buffer = CapturedBuffer {
            frame_id: Some(4),
            timestamp_ns: None,
            components: vec![Component::new("Mono8", 2, 1, SampleBuffer::U8(vec![1, 2]))],
        };
        assert_eq!(buffer.frame_id(), Ok(4));
        assert!(buffer.timestamp_ns().is_err());
        assert_eq!(buffer.num_components(), 1);
        let component = buffer.component(0).unwrap();
        assert_eq!(component.data_format(), Ok("Mono8".to_string()));
        assert_eq!(component.delivered_image_height(), Ok(1));
        assert!(buffer.component(1).is_none());
    }
}
