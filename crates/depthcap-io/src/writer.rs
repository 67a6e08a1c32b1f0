use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ContainerError, FieldUnavailable};
use crate::schema::{ComponentCount, FieldResultExt, FrameContext, Schema};
use crate::slot;
use crate::source::{BufferSource, NodeSource};

/// Configuration of a [`FrameWriter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WriterConfig {
    /// How many components of every buffer are serialized.
    pub components: ComponentCount,
}

/// Appends frames to a recording.
///
/// The whitelist block of the [`Schema`] is written once, before the first frame.
/// Every frame is assembled in memory and appended only when complete, so a frame
/// that fails in its component section leaves the output untouched.
pub struct FrameWriter<W: Write> {
    inner: W,
    schema: Schema,
    config: WriterConfig,
    whitelists_written: bool,
    frames_written: usize,
}

impl FrameWriter<BufWriter<File>> {
    /// Create a new recording at `path`, truncating an existing file.
    pub fn create(
        path: impl AsRef<Path>,
        schema: Schema,
        config: WriterConfig,
    ) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        log::info!("Open file for writing: {}", path.display());
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), schema, config))
    }
}

impl<W: Write> FrameWriter<W> {
    /// Create a writer over an output positioned at the start of a new recording.
    pub fn new(inner: W, schema: Schema, config: WriterConfig) -> Self {
        Self {
            inner,
            schema,
            config,
            whitelists_written: false,
            frames_written: 0,
        }
    }

    /// The schema of the recording.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of frames appended so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Write the whitelist block.
    ///
    /// Called implicitly by the first [`FrameWriter::store`]. The block can only be
    /// written once per recording.
    pub fn write_whitelists(&mut self) -> Result<(), ContainerError> {
        if self.whitelists_written {
            return Err(ContainerError::ProtocolViolation(
                "the whitelist block of a recording can only be written once".to_string(),
            ));
        }
        let wl = self.schema.whitelists();
        let mut block = Vec::new();
        slot::write_slot(&mut block, &wl.nodes)?;
        slot::write_slot(&mut block, &wl.buffer)?;
        slot::write_slot(&mut block, &wl.maps)?;
        self.inner.write_all(&block)?;
        self.whitelists_written = true;
        log::debug!(
            "whitelists written: {} nodes, {} buffer fields, {} map fields",
            wl.nodes.len(),
            wl.buffer.len(),
            wl.maps.len()
        );
        Ok(())
    }

    /// Serialize one captured buffer together with the current feature values.
    ///
    /// Unreadable node values are stored as the `"N/A"` sentinel, unreadable buffer
    /// fields are stored as missing. An unreadable component field drops the whole
    /// frame and is returned as [`ContainerError::ComponentUnavailable`].
    pub fn store(
        &mut self,
        buffer: &dyn BufferSource,
        nodes: &dyn NodeSource,
    ) -> Result<(), ContainerError> {
        if !self.whitelists_written {
            self.write_whitelists()?;
        }

        let available = buffer.num_components();
        let num_components = match self.config.components {
            ComponentCount::Fixed(n) => {
                if available > n {
                    log::warn!(
                        "buffer carries {available} components, only the first {n} are stored"
                    );
                }
                n
            }
            ComponentCount::Recorded => available,
        };

        let mut record = Vec::new();

        for (_, accessor) in &self.schema.nodes {
            let value = accessor.evaluate(nodes).or_sentinel();
            slot::write_slot(&mut record, &value)?;
        }

        let ctx = FrameContext {
            buffer,
            nodes,
            num_components,
        };
        for (_, accessor) in &self.schema.buffer {
            match accessor.evaluate(&ctx).or_skip() {
                Some(value) => slot::write_slot(&mut record, &value)?,
                None => slot::write_missing(&mut record)?,
            }
        }

        for index in 0..num_components {
            let component = buffer.component(index).ok_or_else(|| {
                ContainerError::ComponentUnavailable {
                    index,
                    source: FieldUnavailable::new(
                        "maps",
                        format!("buffer carries only {available} components"),
                    ),
                }
            })?;
            for (_, accessor) in &self.schema.maps {
                let value = accessor.evaluate(component).or_abort(index)?;
                slot::write_slot(&mut record, &value)?;
            }
        }

        self.inner.write_all(&record)?;
        self.frames_written += 1;
        log::debug!(
            "frame {} stored ({} bytes)",
            self.frames_written,
            record.len()
        );
        Ok(())
    }

    /// Flush the underlying output.
    pub fn flush(&mut self) -> Result<(), ContainerError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying output.
    pub fn into_inner(mut self) -> Result<W, ContainerError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CapturedBuffer, Component, NodeKey, NodeValues};
    use crate::value::SampleBuffer;

    fn range_buffer() -> CapturedBuffer {
        CapturedBuffer {
            frame_id: Some(1),
            timestamp_ns: Some(42),
            components: vec![Component::new(
                "Coord3D_C16",
                2,
                2,
                SampleBuffer::U16(vec![1, 2, 3, 4]),
            )],
        }
    }

    #[test]
    fn test_whitelists_written_once() -> Result<(), ContainerError> {
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), WriterConfig::default());
        writer.store(&range_buffer(), &NodeValues::new())?;
        let err = writer.write_whitelists();
        assert!(matches!(err, Err(ContainerError::ProtocolViolation(_))));
        assert_eq!(writer.frames_written(), 1);
        Ok(())
    }

    #[test]
    fn test_component_failure_leaves_output_unchanged() -> Result<(), ContainerError> {
        let config = WriterConfig {
            components: ComponentCount::Fixed(2),
        };
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), config);
        writer.write_whitelists()?;
        let nodes = NodeValues::new().with(NodeKey::feature("ExposureTime"), 500.0);

        let err = writer.store(&range_buffer(), &nodes);
        assert!(matches!(
            err,
            Err(ContainerError::ComponentUnavailable { index: 1, .. })
        ));
        assert_eq!(writer.frames_written(), 0);

        let bytes = writer.into_inner()?;
        let mut block = Vec::new();
        let wl = Schema::visionary().whitelists();
        slot::write_slot(&mut block, &wl.nodes)?;
        slot::write_slot(&mut block, &wl.buffer)?;
        slot::write_slot(&mut block, &wl.maps)?;
        assert_eq!(bytes, block);
        Ok(())
    }

    #[test]
    fn test_config_serde() -> Result<(), serde_json::Error> {
        let config = WriterConfig {
            components: ComponentCount::Recorded,
        };
        let json = serde_json::to_string(&config)?;
        assert_eq!(serde_json::from_str::<WriterConfig>(&json)?, config);
        assert_eq!(
            WriterConfig::default().components,
            ComponentCount::Fixed(1)
        );
        Ok(())
    }
}
