use crate::error::ImuError;

/// Size in bytes of one encoded [`ImuSample`]: 13 `f64` followed by a `u64`.
pub const RECORD_SIZE: usize = 13 * 8 + 8;

/// One inertial measurement.
///
/// # Units
///
/// - Acceleration: m/s²
/// - Angular velocity: rad/s
/// - Magnetic field: tesla
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImuSample {
    /// Linear acceleration `[x, y, z]`.
    pub acceleration: [f64; 3],
    /// Angular velocity `[x, y, z]`.
    pub angular_velocity: [f64; 3],
    /// Magnetic field `[x, y, z]`.
    pub magnetic_field: [f64; 3],
    /// Orientation quaternion as delivered, not renormalized.
    pub orientation: [f64; 4],
    /// Timestamp in nanoseconds.
    pub timestamp_ns: u64,
}

impl ImuSample {
    /// Decode one record from exactly [`RECORD_SIZE`] little-endian bytes.
    pub fn from_le_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let word = |i: usize| {
            let mut w = [0u8; 8];
            w.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            w
        };
        let f = |i: usize| f64::from_le_bytes(word(i));
        Self {
            acceleration: [f(0), f(1), f(2)],
            angular_velocity: [f(3), f(4), f(5)],
            magnetic_field: [f(6), f(7), f(8)],
            orientation: [f(9), f(10), f(11), f(12)],
            timestamp_ns: u64::from_le_bytes(word(13)),
        }
    }

    /// Encode the sample into its little-endian record.
    pub fn to_le_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        let floats = self
            .acceleration
            .iter()
            .chain(&self.angular_velocity)
            .chain(&self.magnetic_field)
            .chain(&self.orientation);
        for (chunk, v) in out.chunks_exact_mut(8).zip(floats) {
            chunk.copy_from_slice(&v.to_le_bytes());
        }
        out[RECORD_SIZE - 8..].copy_from_slice(&self.timestamp_ns.to_le_bytes());
        out
    }
}

/// Decodes a flat byte buffer into consecutive [`ImuSample`] records.
///
/// Iteration stops at the end of the buffer. A trailing partial record yields one
/// [`ImuError::TruncatedRecord`], after which the iterator is fused.
///
/// # Example
///
/// ```
/// use depthcap_io::imu::{ImuParser, ImuSample, RECORD_SIZE};
///
/// let sample = ImuSample {
///     acceleration: [0.0, 0.0, 9.81],
///     angular_velocity: [0.0; 3],
///     magnetic_field: [0.0; 3],
///     orientation: [1.0, 0.0, 0.0, 0.0],
///     timestamp_ns: 17,
/// };
/// let bytes = sample.to_le_bytes();
/// let samples = ImuParser::new(&bytes).collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(samples, vec![sample]);
/// assert_eq!(bytes.len(), RECORD_SIZE);
/// ```
#[derive(Debug, Clone)]
pub struct ImuParser<'a> {
    buffer: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> ImuParser<'a> {
    /// Create a parser at the start of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the next sample, or `None` once the buffer is consumed.
    pub fn next_sample(&mut self) -> Result<Option<ImuSample>, ImuError> {
        let remaining = &self.buffer[self.offset..];
        if remaining.is_empty() {
            return Ok(None);
        }
        let record: &[u8; RECORD_SIZE] = remaining
            .get(..RECORD_SIZE)
            .and_then(|r| r.try_into().ok())
            .ok_or(ImuError::TruncatedRecord {
                offset: self.offset,
                remaining: remaining.len(),
            })?;
        self.offset += RECORD_SIZE;
        Ok(Some(ImuSample::from_le_bytes(record)))
    }
}

impl Iterator for ImuParser<'_> {
    type Item = Result<ImuSample, ImuError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_sample() {
            Ok(sample) => sample.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for ImuParser<'_> {}
