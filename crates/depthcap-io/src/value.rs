use std::borrow::Cow;
use std::fmt;

/// Literal stored for a node value that could not be read at capture time.
pub const NOT_AVAILABLE: &str = "N/A";

/// A flat array of sensor samples as delivered by a camera component.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum SampleBuffer {
    /// 8-bit samples (mono, BGR, Bayer, raw byte streams).
    U8(Vec<u8>),
    /// 16-bit samples (range maps).
    U16(Vec<u16>),
    /// 32-bit samples (intensity maps).
    U32(Vec<u32>),
    /// Single precision samples.
    F32(Vec<f32>),
    /// Double precision samples.
    F64(Vec<f64>),
}

impl SampleBuffer {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::U8(v) => v.len(),
            SampleBuffer::U16(v) => v.len(),
            SampleBuffer::U32(v) => v.len(),
            SampleBuffer::F32(v) => v.len(),
            SampleBuffer::F64(v) => v.len(),
        }
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of a single sample in bytes.
    pub fn item_size(&self) -> usize {
        match self {
            SampleBuffer::U8(_) => 1,
            SampleBuffer::U16(_) => 2,
            SampleBuffer::U32(_) | SampleBuffer::F32(_) => 4,
            SampleBuffer::F64(_) => 8,
        }
    }

    /// Borrow the samples as bytes if they already are 8-bit.
    pub fn as_u8(&self) -> Option<&[u8]> {
        match self {
            SampleBuffer::U8(v) => Some(v),
            _ => None,
        }
    }

    /// The raw little-endian byte representation of the samples.
    ///
    /// 8-bit buffers are borrowed, wider samples are serialized.
    pub fn to_le_bytes(&self) -> Cow<'_, [u8]> {
        fn collect<const N: usize, T: Copy>(v: &[T], f: impl Fn(T) -> [u8; N]) -> Vec<u8> {
            v.iter().flat_map(|&x| f(x)).collect()
        }
        match self {
            SampleBuffer::U8(v) => Cow::Borrowed(v),
            SampleBuffer::U16(v) => Cow::Owned(collect(v, u16::to_le_bytes)),
            SampleBuffer::U32(v) => Cow::Owned(collect(v, u32::to_le_bytes)),
            SampleBuffer::F32(v) => Cow::Owned(collect(v, f32::to_le_bytes)),
            SampleBuffer::F64(v) => Cow::Owned(collect(v, f64::to_le_bytes)),
        }
    }

    /// Convert the first `n` samples to `f64`, or `None` when fewer are available.
    pub fn to_f64_prefix(&self, n: usize) -> Option<Vec<f64>> {
        if self.len() < n {
            return None;
        }
        let out = match self {
            SampleBuffer::U8(v) => v[..n].iter().map(|&x| x as f64).collect(),
            SampleBuffer::U16(v) => v[..n].iter().map(|&x| x as f64).collect(),
            SampleBuffer::U32(v) => v[..n].iter().map(|&x| x as f64).collect(),
            SampleBuffer::F32(v) => v[..n].iter().map(|&x| x as f64).collect(),
            SampleBuffer::F64(v) => v[..n].to_vec(),
        };
        Some(out)
    }
}

/// A self-describing value stored for one whitelisted field.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
pub enum Value {
    /// Boolean feature value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// Unsigned integer value (frame ids, timestamps, sizes).
    UInt(u64),
    /// Floating point value.
    Float(f64),
    /// Text value (enumerations, format tags, the `"N/A"` sentinel).
    Text(String),
    /// Flat sample array of a component.
    Samples(SampleBuffer),
}

impl Value {
    /// The sentinel substituted for node values that could not be read.
    pub fn not_available() -> Self {
        Value::Text(NOT_AVAILABLE.to_string())
    }

    /// Whether this is the `"N/A"` sentinel.
    pub fn is_not_available(&self) -> bool {
        matches!(self, Value::Text(s) if s == NOT_AVAILABLE)
    }

    /// Numeric view of the value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    /// Non-negative integer view of the value.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt(v) => Some(v),
            Value::Int(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Sample array view of the value.
    pub fn as_samples(&self) -> Option<&SampleBuffer> {
        match self {
            Value::Samples(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Samples(s) => write!(f, "<{} samples, {} bytes each>", s.len(), s.item_size()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<SampleBuffer> for Value {
    fn from(v: SampleBuffer) -> Self {
        Value::Samples(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let v = Value::not_available();
        assert!(v.is_not_available());
        assert_eq!(v.as_str(), Some("N/A"));
        assert!(!Value::from("Off").is_not_available());
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Float(216.31).as_f64(), Some(216.31));
        assert_eq!(Value::UInt(7).as_f64(), Some(7.0));
        assert_eq!(Value::Int(-3).as_u64(), None);
        assert_eq!(Value::Text("1.0".into()).as_f64(), None);
    }

    #[test]
    fn test_le_bytes() {
        let buf = SampleBuffer::U16(vec![0x0102, 0x0304]);
        assert_eq!(buf.to_le_bytes().as_ref(), &[0x02, 0x01, 0x04, 0x03]);
        let buf = SampleBuffer::U8(vec![9, 8]);
        assert!(matches!(buf.to_le_bytes(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_f64_prefix() {
        let buf = SampleBuffer::U16(vec![1, 2, 3, 4]);
        assert_eq!(buf.to_f64_prefix(3), Some(vec![1.0, 2.0, 3.0]));
        assert_eq!(buf.to_f64_prefix(5), None);
    }
}
