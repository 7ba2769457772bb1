//! Little-endian word codecs shared by every on-disk structure.
//!
//! Serialized words are fixed to 64-bit little-endian regardless of host, so
//! images move between targets.

use crate::error::{FsError, FsResult};

/// Width of a serialized word in bytes.
pub const WORD: usize = 8;

/// On-disk representation: a size probe plus buffer-based encode/decode.
///
/// `serialize_into` expects a zero-initialized buffer of at least
/// `serialized_size()` bytes past `offset`; bit-packed encoders OR into it.
pub trait Persist: Sized {
    fn serialized_size(&self) -> usize;

    fn serialize_into(&self, buf: &mut [u8], offset: &mut usize);

    /// # Errors
    /// Returns `Corrupt` when the buffer is short or internally inconsistent.
    fn deserialize_from(buf: &[u8], offset: &mut usize) -> FsResult<Self>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.serialized_size()];
        let mut offset = 0;
        self.serialize_into(&mut buf, &mut offset);
        buf
    }

    /// # Errors
    /// Returns `Corrupt` when the buffer does not decode.
    fn from_bytes(buf: &[u8]) -> FsResult<Self> {
        let mut offset = 0;
        Self::deserialize_from(buf, &mut offset)
    }
}

pub fn put_u64(buf: &mut [u8], offset: &mut usize, value: u64) {
    buf[*offset..*offset + WORD].copy_from_slice(&value.to_le_bytes());
    *offset += WORD;
}

pub fn put_i64(buf: &mut [u8], offset: &mut usize, value: i64) {
    buf[*offset..*offset + WORD].copy_from_slice(&value.to_le_bytes());
    *offset += WORD;
}

pub fn put_u32(buf: &mut [u8], offset: &mut usize, value: u32) {
    buf[*offset..*offset + 4].copy_from_slice(&value.to_le_bytes());
    *offset += 4;
}

/// # Errors
/// Returns `Corrupt` when fewer than 8 bytes remain.
pub fn get_u64(buf: &[u8], offset: &mut usize) -> FsResult<u64> {
    let bytes = get_bytes(buf, offset, WORD)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(bytes);
    Ok(u64::from_le_bytes(word))
}

/// # Errors
/// Returns `Corrupt` when fewer than 8 bytes remain.
pub fn get_i64(buf: &[u8], offset: &mut usize) -> FsResult<i64> {
    let bytes = get_bytes(buf, offset, WORD)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(bytes);
    Ok(i64::from_le_bytes(word))
}

/// # Errors
/// Returns `Corrupt` when fewer than 4 bytes remain.
pub fn get_u32(buf: &[u8], offset: &mut usize) -> FsResult<u32> {
    let bytes = get_bytes(buf, offset, 4)?;
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    Ok(u32::from_le_bytes(word))
}

/// # Errors
/// Returns `Corrupt` when fewer than `len` bytes remain.
pub fn get_bytes<'a>(buf: &'a [u8], offset: &mut usize, len: usize) -> FsResult<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= buf.len())
        .ok_or_else(|| {
            FsError::Corrupt(format!(
                "serialized buffer too short: need {len} bytes at offset {offset}, have {}",
                buf.len()
            ))
        })?;
    let bytes = &buf[*offset..end];
    *offset = end;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_round_trip_little_endian() {
        let mut buf = [0u8; 20];
        let mut offset = 0;
        put_u64(&mut buf, &mut offset, 0x0102_0304_0506_0708);
        put_u32(&mut buf, &mut offset, 77);
        put_i64(&mut buf, &mut offset, -5);
        assert_eq!(offset, 20);
        assert_eq!(buf[0], 0x08, "least significant byte first");

        let mut offset = 0;
        assert_eq!(get_u64(&buf, &mut offset).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(get_u32(&buf, &mut offset).unwrap(), 77);
        assert_eq!(get_i64(&buf, &mut offset).unwrap(), -5);
    }

    #[test]
    fn short_buffer_is_corrupt() {
        let buf = [0u8; 4];
        let mut offset = 0;
        assert!(matches!(
            get_u64(&buf, &mut offset),
            Err(crate::error::FsError::Corrupt(_))
        ));
    }
}
