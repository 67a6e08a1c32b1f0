use std::collections::HashMap;

use crate::value::{SampleBuffer, Value};

/// Format tags of the components produced by Visionary cameras.
pub mod formats {
    /// 16-bit range map.
    pub const COORD3D_C16: &str = "Coord3D_C16";
    /// 8-bit color image, BGR channel order.
    pub const BGR8: &str = "BGR8";
    /// 8-bit mono image; also carries the raw inertial byte stream.
    pub const MONO8: &str = "Mono8";
    /// 8-bit Bayer mosaic with an RGGB layout.
    pub const BAYER_RG8: &str = "BayerRG8";
    /// 16-bit confidence map.
    pub const CONFIDENCE16: &str = "Confidence16";
}

/// The restored fields of one component of a frame.
///
/// Fields that could not be restored are absent; the typed getters return `None` for
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMap {
    fields: HashMap<String, Value>,
}

impl ComponentMap {
    /// Create an empty component map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Builder variant of [`ComponentMap::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Get a raw field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Number of restored fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field was restored.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the field names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Format tag of the samples.
    pub fn data_format(&self) -> Option<&str> {
        self.get("data_format").and_then(Value::as_str)
    }

    /// Width in pixels.
    pub fn width(&self) -> Option<usize> {
        self.dimension("width")
    }

    /// Height in pixels.
    pub fn height(&self) -> Option<usize> {
        self.dimension("height")
    }

    /// Number of rows actually delivered.
    pub fn delivered_image_height(&self) -> Option<usize> {
        self.dimension("delivered_image_height")
    }

    /// Flat sample array.
    pub fn data(&self) -> Option<&SampleBuffer> {
        self.get("data").and_then(Value::as_samples)
    }

    fn dimension(&self, name: &str) -> Option<usize> {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|v| usize::try_from(v).ok())
    }
}

/// One restored frame: node values, buffer metadata and the component maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    fields: HashMap<String, Value>,
    maps: Vec<ComponentMap>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Builder variant of [`Frame::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Append a component map.
    pub fn push_map(&mut self, map: ComponentMap) {
        self.maps.push(map);
    }

    /// Builder variant of [`Frame::push_map`].
    pub fn with_map(mut self, map: ComponentMap) -> Self {
        self.push_map(map);
        self
    }

    /// Get a node value or buffer-metadata field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether a field is present.
    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over the field names (not including the maps).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The component maps, in stream order.
    pub fn maps(&self) -> &[ComponentMap] {
        &self.maps
    }

    /// Log the fields and component layout of the frame.
    pub fn log_summary(&self) {
        log::info!("##################################");
        log::info!("######## Frame Debug Info ########");
        log::info!("##################################");
        let mut names = self.fields.keys().collect::<Vec<_>>();
        names.sort();
        for name in names {
            log::info!("# {}: {}", name, self.fields[name]);
        }
        log::info!("# Contained maps:");
        for map in &self.maps {
            let (itemsize, total) = map
                .data()
                .map(|d| (d.item_size(), d.len()))
                .unwrap_or_default();
            log::info!(
                "#   Format {}, {}x{}({}), {}bpp, total items:{}",
                map.data_format().unwrap_or("?"),
                map.width().unwrap_or_default(),
                map.height().unwrap_or_default(),
                map.delivered_image_height().unwrap_or_default(),
                itemsize,
                total,
            );
        }
        log::info!("##################################");
    }
}
