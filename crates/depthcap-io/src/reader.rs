use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::ContainerError;
use crate::frame::{ComponentMap, Frame};
use crate::schema::{ComponentCount, Whitelists, NUM_COMPONENTS};
use crate::slot::{self, Slot};
use crate::value::Value;

/// Configuration of a [`FrameReader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReaderConfig {
    /// How many component maps are read per frame.
    pub components: ComponentCount,
}

/// Position of a [`FrameReader`] in its recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Frames are being read; the next call may yield a frame.
    FrameIterating,
    /// The end of the recording was reached. Only a rewind restarts iteration.
    Exhausted,
}

/// Reads frames back from a recording.
///
/// The whitelist block is loaded when the reader is created. Frames are then read
/// sequentially; random access rewinds to the first frame and skips forward.
pub struct FrameReader<R: Read + Seek> {
    inner: BufReader<R>,
    whitelists: Whitelists,
    config: ReaderConfig,
    state: ReaderState,
}

impl FrameReader<File> {
    /// Open a recording from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ContainerError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    /// Open a recording from disk with a custom configuration.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: ReaderConfig,
    ) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        log::info!("Open file for reading: {}", path.display());
        Self::with_config(File::open(path)?, config)
    }
}

impl<R: Read + Seek> FrameReader<R> {
    /// Create a reader over a recording positioned at its first byte.
    pub fn new(inner: R) -> Result<Self, ContainerError> {
        Self::with_config(inner, ReaderConfig::default())
    }

    /// Create a reader with a custom configuration.
    ///
    /// Fails with [`ContainerError::ProtocolViolation`] when `inner` is not positioned
    /// at the first byte of the recording.
    pub fn with_config(inner: R, config: ReaderConfig) -> Result<Self, ContainerError> {
        let mut inner = BufReader::new(inner);
        let whitelists = load_whitelists(&mut inner)?;
        Ok(Self {
            inner,
            whitelists,
            config,
            state: ReaderState::FrameIterating,
        })
    }

    /// The whitelists the recording was written with.
    pub fn whitelists(&self) -> &Whitelists {
        &self.whitelists
    }

    /// The current iteration state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Read the next frame, or `None` at the end of the recording.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ContainerError> {
        if self.state == ReaderState::Exhausted {
            return Ok(None);
        }
        if self.inner.fill_buf()?.is_empty() {
            self.state = ReaderState::Exhausted;
            return Ok(None);
        }

        let start = self.inner.stream_position()?;
        let mut frame = Frame::new();

        for name in &self.whitelists.nodes {
            let value = match slot::read_slot(&mut self.inner) {
                Ok(Slot::Payload(bytes)) => slot::decode_payload::<Value>(&bytes)?,
                Ok(Slot::Missing) => Value::not_available(),
                Err(err) if slot::is_eof(&err) => {
                    self.state = ReaderState::Exhausted;
                    return Err(ContainerError::TruncatedFrame(start));
                }
                Err(err) => return Err(err.into()),
            };
            frame.insert(name.as_str(), value);
        }

        let complete = read_tolerant(&mut self.inner, &self.whitelists.buffer, |name, value| {
            frame.insert(name, value)
        })?;
        if !complete {
            return Ok(Some(frame));
        }

        let recorded = frame
            .get(NUM_COMPONENTS)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok());
        let (num_components, surplus) = match self.config.components {
            ComponentCount::Fixed(n) => {
                if let Some(recorded) = recorded.filter(|&r| r != n) {
                    log::warn!(
                        "frame at byte {start} records {recorded} components, reading {n}"
                    );
                }
                (n, recorded.map_or(0, |r| r.saturating_sub(n)))
            }
            ComponentCount::Recorded => (recorded.unwrap_or(1), 0),
        };

        for _ in 0..num_components {
            let mut map = ComponentMap::new();
            let complete = read_tolerant(&mut self.inner, &self.whitelists.maps, |name, value| {
                map.insert(name, value)
            })?;
            if complete || !map.is_empty() {
                frame.push_map(map);
            }
            if !complete {
                return Ok(Some(frame));
            }
        }

        // components beyond the configured count are consumed so the next frame
        // starts at its own node section
        for _ in 0..surplus {
            if !read_tolerant(&mut self.inner, &self.whitelists.maps, |_, _| {})? {
                break;
            }
        }

        Ok(Some(frame))
    }

    /// Return to the first frame.
    ///
    /// The whitelist block is read again and must match the one loaded on open.
    pub fn rewind(&mut self) -> Result<(), ContainerError> {
        self.inner.seek(SeekFrom::Start(0))?;
        let whitelists = load_whitelists(&mut self.inner)?;
        if whitelists != self.whitelists {
            return Err(ContainerError::ProtocolViolation(
                "the whitelist block changed since the recording was opened".to_string(),
            ));
        }
        self.state = ReaderState::FrameIterating;
        Ok(())
    }

    /// Read the frame at `index`, counted from the first frame.
    ///
    /// Rewinds and skips forward, so the cost grows with `index`.
    pub fn seek_frame(&mut self, index: usize) -> Result<Option<Frame>, ContainerError> {
        self.rewind()?;
        if self.skip_frames(index)? < index {
            return Ok(None);
        }
        self.next_frame()
    }

    /// Read all remaining frames, then rewind.
    pub fn read_all(&mut self) -> Result<Vec<Frame>, ContainerError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        self.rewind()?;
        Ok(frames)
    }

    /// Read up to `n` frames after skipping the first `skip` frames of the recording.
    ///
    /// `n == 0` reads all remaining frames.
    pub fn read_frames(&mut self, skip: usize, n: usize) -> Result<Vec<Frame>, ContainerError> {
        let limit = if n == 0 { usize::MAX } else { n };
        self.rewind()?;
        self.skip_frames(skip)?;
        let mut frames = Vec::new();
        while frames.len() < limit {
            match self.next_frame()? {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        Ok(frames)
    }

    /// Count the frames of the recording. The reader is rewound afterwards.
    pub fn count_frames(&mut self) -> Result<usize, ContainerError> {
        self.rewind()?;
        let count = self.skip_frames(usize::MAX)?;
        self.rewind()?;
        Ok(count)
    }

    /// Iterate over all frames from the first one.
    ///
    /// The reader is rewound before the first frame and again after the last one.
    pub fn frames(&mut self) -> Frames<'_, R> {
        let pending = self.rewind().err();
        Frames {
            reader: self,
            pending,
            done: false,
        }
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    fn skip_frames(&mut self, num: usize) -> Result<usize, ContainerError> {
        let mut skipped = 0;
        while skipped < num && self.next_frame()?.is_some() {
            skipped += 1;
        }
        Ok(skipped)
    }
}

/// Iterator over the frames of a recording, see [`FrameReader::frames`].
pub struct Frames<'a, R: Read + Seek> {
    reader: &'a mut FrameReader<R>,
    pending: Option<ContainerError>,
    done: bool,
}

impl<R: Read + Seek> Iterator for Frames<'_, R> {
    type Item = Result<Frame, ContainerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(err) = self.pending.take() {
            self.done = true;
            return Some(Err(err));
        }
        match self.reader.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                self.reader.rewind().err().map(Err)
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn load_whitelists<R: BufRead + Seek>(reader: &mut R) -> Result<Whitelists, ContainerError> {
    let position = reader.stream_position()?;
    if position != 0 {
        return Err(ContainerError::ProtocolViolation(format!(
            "whitelists are only read from the beginning of a recording, position is {position}"
        )));
    }
    Ok(Whitelists {
        nodes: read_whitelist(reader, "node")?,
        buffer: read_whitelist(reader, "buffer")?,
        maps: read_whitelist(reader, "map")?,
    })
}

fn read_whitelist<R: Read>(reader: &mut R, section: &str) -> Result<Vec<String>, ContainerError> {
    match slot::read_slot(reader) {
        Ok(Slot::Payload(bytes)) => Ok(slot::decode_payload(&bytes)?),
        Ok(Slot::Missing) => Err(ContainerError::ProtocolViolation(format!(
            "{section} whitelist is empty"
        ))),
        Err(err) if slot::is_eof(&err) => Err(ContainerError::ProtocolViolation(format!(
            "recording ends before the {section} whitelist"
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Read one value per name, skipping fields that are missing or do not decode.
///
/// Returns `false` when the data ended inside the section.
fn read_tolerant<R: Read>(
    reader: &mut R,
    names: &[String],
    mut insert: impl FnMut(&str, Value),
) -> Result<bool, ContainerError> {
    for name in names {
        match slot::read_slot(reader) {
            Ok(Slot::Payload(bytes)) => match slot::decode_payload::<Value>(&bytes) {
                Ok(value) => insert(name, value),
                Err(err) => log::warn!("field `{name}` skipped: {err}"),
            },
            Ok(Slot::Missing) => log::debug!("field `{name}` was not recorded"),
            Err(err) if slot::is_eof(&err) => {
                log::warn!("recording ends inside field `{name}`");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::io::Cursor;

    use super::*;
    use crate::schema::Schema;
    use crate::source::{CapturedBuffer, Component, NodeKey, NodeValues};
    use crate::value::SampleBuffer;
    use crate::writer::{FrameWriter, WriterConfig};

    fn buffer(frame_id: u64, samples: Vec<u16>) -> CapturedBuffer {
        CapturedBuffer {
            frame_id: Some(frame_id),
            timestamp_ns: Some(frame_id * 1000),
            components: vec![Component::new(
                "Coord3D_C16",
                2,
                samples.len() / 2,
                SampleBuffer::U16(samples),
            )],
        }
    }

    fn nodes() -> NodeValues {
        NodeValues::new()
            .with(NodeKey::feature("AcquisitionFrameRate"), 30.0)
            .with(NodeKey::feature("ExposureAuto"), "Off")
            .with(NodeKey::feature("ChunkScan3dFocalLength"), 216.31)
    }

    fn record(frames: u64, config: WriterConfig) -> Result<Vec<u8>, ContainerError> {
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), config);
        for i in 0..frames {
            writer.store(&buffer(i, vec![i as u16; 4]), &nodes())?;
        }
        writer.into_inner()
    }

    #[test]
    fn test_round_trip() -> Result<(), ContainerError> {
        let bytes = record(3, WriterConfig::default())?;
        let mut reader = FrameReader::new(Cursor::new(bytes))?;
        assert_eq!(reader.whitelists(), &Schema::visionary().whitelists());

        // every node name, and the buffer names the writer could produce
        let whitelists = Schema::visionary().whitelists();
        let unreadable = [
            "AspectRatio",
            "PrincipalPointU",
            "PrincipalPointV",
            "CoordinateScaleA",
            "CoordinateOffsetA",
            "CoordinateScaleB",
            "CoordinateOffsetB",
            "CoordinateScaleC",
            "CoordinateOffsetC",
        ];
        let expected_keys = whitelists
            .nodes
            .iter()
            .chain(&whitelists.buffer)
            .map(String::as_str)
            .filter(|name| !unreadable.contains(name))
            .collect::<HashSet<_>>();
        assert_eq!(expected_keys.len(), 8 + 4);
        let expected_map_keys = whitelists
            .maps
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>();

        let frames = reader.read_all()?;
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.get("frame_id"), Some(&Value::UInt(i as u64)));
            assert_eq!(frame.get("AcquisitionFrameRate"), Some(&Value::Float(30.0)));
            assert_eq!(frame.get("ExposureAuto"), Some(&Value::from("Off")));
            // node values that could not be read come back as the sentinel
            assert!(frame
                .get("ExposureTime")
                .is_some_and(Value::is_not_available));
            // buffer fields that could not be read are absent
            assert!(frame.contains_key("FocalLength"));
            assert!(!frame.contains_key("CoordinateScaleC"));
            assert_eq!(frame.keys().collect::<HashSet<_>>(), expected_keys);
            assert_eq!(frame.maps().len(), 1);
            let map = &frame.maps()[0];
            assert_eq!(map.keys().collect::<HashSet<_>>(), expected_map_keys);
            assert_eq!(map.data_format(), Some("Coord3D_C16"));
            assert_eq!(map.data(), Some(&SampleBuffer::U16(vec![i as u16; 4])));
        }
        Ok(())
    }

    #[test]
    fn test_rewind_reproduces_sequence() -> Result<(), ContainerError> {
        let bytes = record(4, WriterConfig::default())?;
        let mut reader = FrameReader::new(Cursor::new(bytes))?;

        let first = reader.next_frame()?;
        reader.rewind()?;
        let all = reader.frames().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(all.len(), 4);
        assert_eq!(first.as_ref(), all.first());

        // the iterator rewinds when exhausted
        assert_eq!(reader.state(), ReaderState::FrameIterating);
        let again = reader.frames().collect::<Result<Vec<_>, _>>()?;
        assert_eq!(all, again);
        Ok(())
    }

    #[test]
    fn test_exhausted_until_rewind() -> Result<(), ContainerError> {
        let bytes = record(1, WriterConfig::default())?;
        let mut reader = FrameReader::new(Cursor::new(bytes))?;
        assert!(reader.next_frame()?.is_some());
        assert!(reader.next_frame()?.is_none());
        assert_eq!(reader.state(), ReaderState::Exhausted);
        assert!(reader.next_frame()?.is_none());
        reader.rewind()?;
        assert!(reader.next_frame()?.is_some());
        Ok(())
    }

    #[test]
    fn test_random_access() -> Result<(), ContainerError> {
        let bytes = record(5, WriterConfig::default())?;
        let mut reader = FrameReader::new(Cursor::new(bytes))?;

        assert_eq!(reader.count_frames()?, 5);
        let frame = reader.seek_frame(3)?.ok_or(ContainerError::TruncatedFrame(0))?;
        assert_eq!(frame.get("frame_id"), Some(&Value::UInt(3)));
        assert!(reader.seek_frame(5)?.is_none());

        let frames = reader.read_frames(1, 2)?;
        let ids = frames
            .iter()
            .map(|f| f.get("frame_id").and_then(Value::as_u64))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(reader.read_frames(2, 0)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_empty_recording() -> Result<(), ContainerError> {
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), WriterConfig::default());
        writer.write_whitelists()?;
        let mut reader = FrameReader::new(Cursor::new(writer.into_inner()?))?;
        assert_eq!(reader.count_frames()?, 0);
        assert!(reader.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn test_open_at_nonzero_offset() -> Result<(), ContainerError> {
        let bytes = record(1, WriterConfig::default())?;
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(1);
        let err = FrameReader::new(cursor);
        assert!(matches!(err, Err(ContainerError::ProtocolViolation(_))));
        Ok(())
    }

    #[test]
    fn test_missing_whitelist_block() {
        let err = FrameReader::new(Cursor::new(Vec::new()));
        assert!(matches!(err, Err(ContainerError::ProtocolViolation(_))));
    }

    #[test]
    fn test_truncated_node_section() -> Result<(), ContainerError> {
        let mut bytes = record(2, WriterConfig::default())?;
        let single = record(1, WriterConfig::default())?.len();
        // keep the first frame and a few bytes of the second one
        bytes.truncate(single + 3);

        let mut reader = FrameReader::new(Cursor::new(bytes))?;
        assert!(reader.next_frame()?.is_some());
        let err = reader.next_frame();
        assert!(matches!(err, Err(ContainerError::TruncatedFrame(_))));
        Ok(())
    }

    #[test]
    fn test_truncated_map_section() -> Result<(), ContainerError> {
        let mut bytes = record(1, WriterConfig::default())?;
        // drop the tail of the data slot
        bytes.truncate(bytes.len() - 2);

        let mut reader = FrameReader::new(Cursor::new(bytes))?;
        let frame = reader.next_frame()?.ok_or(ContainerError::TruncatedFrame(0))?;
        let map = &frame.maps()[0];
        assert_eq!(map.width(), Some(2));
        assert!(map.data().is_none());
        assert!(reader.next_frame()?.is_none());
        Ok(())
    }

    #[test]
    fn test_recorded_component_count() -> Result<(), ContainerError> {
        let config = WriterConfig {
            components: ComponentCount::Recorded,
        };
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), config);
        let mut captured = buffer(0, vec![1, 2, 3, 4]);
        captured
            .components
            .push(Component::new("Mono8", 2, 1, SampleBuffer::U8(vec![7, 8])));
        writer.store(&captured, &nodes())?;
        writer.store(&buffer(1, vec![5, 6, 7, 8]), &nodes())?;

        let reader_config = ReaderConfig {
            components: ComponentCount::Recorded,
        };
        let mut reader = FrameReader::with_config(Cursor::new(writer.into_inner()?), reader_config)?;
        let frames = reader.read_all()?;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].get(NUM_COMPONENTS), Some(&Value::UInt(2)));
        assert_eq!(frames[0].maps().len(), 2);
        assert_eq!(frames[0].maps()[1].data_format(), Some("Mono8"));
        assert_eq!(frames[1].maps().len(), 1);
        Ok(())
    }

    #[test]
    fn test_fixed_count_skips_surplus_components() -> Result<(), ContainerError> {
        let config = WriterConfig {
            components: ComponentCount::Recorded,
        };
        let mut writer = FrameWriter::new(Vec::new(), Schema::visionary(), config);
        for i in 0..3 {
            let mut captured = buffer(i, vec![i as u16; 4]);
            captured
                .components
                .push(Component::new("Mono8", 2, 1, SampleBuffer::U8(vec![7, 8])));
            writer.store(&captured, &nodes())?;
        }

        let mut reader = FrameReader::new(Cursor::new(writer.into_inner()?))?;
        let frames = reader.read_all()?;
        assert_eq!(frames.len(), 3);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.get("frame_id"), Some(&Value::UInt(i as u64)));
            assert_eq!(frame.get("AcquisitionFrameRate"), Some(&Value::Float(30.0)));
            assert_eq!(frame.get(NUM_COMPONENTS), Some(&Value::UInt(2)));
            assert_eq!(frame.maps().len(), 1);
            assert_eq!(frame.maps()[0].data_format(), Some("Coord3D_C16"));
        }
        assert_eq!(reader.count_frames()?, 3);
        Ok(())
    }

    #[test]
    fn test_on_disk() -> Result<(), ContainerError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("recording.bin");
        let mut writer = FrameWriter::create(&path, Schema::visionary(), WriterConfig::default())?;
        writer.store(&buffer(9, vec![1, 2, 3, 4]), &nodes())?;
        writer.flush()?;
        drop(writer);

        let mut reader = FrameReader::open(&path)?;
        let frame = reader.next_frame()?.ok_or(ContainerError::TruncatedFrame(0))?;
        assert_eq!(frame.get("frame_id"), Some(&Value::UInt(9)));
        Ok(())
    }
}
