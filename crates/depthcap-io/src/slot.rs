//! Every item of a recording is stored in a slot: a bincode byte string whose payload
//! is the bincode encoding of the item. An empty slot marks a field the writer could
//! not produce.

use std::io::Read;

use bincode::config::Config;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};

/// Upper bound of a single slot, protects against corrupt length prefixes.
const MAX_SLOT_BYTES: usize = 1 << 31;

pub(crate) fn config() -> impl Config {
    bincode::config::standard().with_limit::<MAX_SLOT_BYTES>()
}

pub(crate) enum Slot {
    Missing,
    Payload(Vec<u8>),
}

/// Append `item` as a slot to `out`.
pub(crate) fn write_slot<T: Encode>(out: &mut Vec<u8>, item: &T) -> Result<(), EncodeError> {
    let payload = bincode::encode_to_vec(item, config())?;
    bincode::encode_into_std_write(&payload, out, config())?;
    Ok(())
}

/// Append the missing-field marker to `out`.
pub(crate) fn write_missing(out: &mut Vec<u8>) -> Result<(), EncodeError> {
    bincode::encode_into_std_write(&Vec::<u8>::new(), out, config())?;
    Ok(())
}

pub(crate) fn read_slot<R: Read>(reader: &mut R) -> Result<Slot, DecodeError> {
    let bytes: Vec<u8> = bincode::decode_from_std_read(reader, config())?;
    if bytes.is_empty() {
        return Ok(Slot::Missing);
    }
    Ok(Slot::Payload(bytes))
}

pub(crate) fn decode_payload<T: Decode<()>>(bytes: &[u8]) -> Result<T, DecodeError> {
    let (item, read) = bincode::decode_from_slice(bytes, config())?;
    if read != bytes.len() {
        return Err(DecodeError::OtherString(format!(
            "{} trailing bytes in slot",
            bytes.len() - read
        )));
    }
    Ok(item)
}

/// Whether the error was caused by running out of data.
pub(crate) fn is_eof(err: &DecodeError) -> bool {
    match err {
        DecodeError::UnexpectedEnd { .. } => true,
        DecodeError::Io { inner, .. } => inner.kind() == std::io::ErrorKind::UnexpectedEof,
        _ => false,
    }
}
