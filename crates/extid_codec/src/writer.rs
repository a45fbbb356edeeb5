//! Sequential binary writer.

use crate::error::{CodecError, CodecResult};

/// Largest text length representable by the 16-bit prefix.
pub const MAX_TEXT_LEN: usize = u16::MAX as usize;

/// Appends fixed-layout fields to a byte buffer.
///
/// Text is written as a big-endian `u16` byte length followed by UTF-8
/// bytes. Integers other than the text prefix are little-endian.
#[derive(Debug, Default, Clone)]
pub struct DataWriter {
    buf: Vec<u8>,
}

impl DataWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_text(&mut self, text: &str) -> CodecResult<()> {
        let bytes = text.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| CodecError::TextTooLong {
            len: bytes.len(),
            max: MAX_TEXT_LEN,
        })?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Writes a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a collection length as a little-endian `u32`.
    pub fn write_count(&mut self, len: usize) -> CodecResult<()> {
        let count = u32::try_from(len).map_err(|_| CodecError::CountTooLarge { len })?;
        self.write_u32(count);
        Ok(())
    }

    /// Writes raw bytes with no prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consumes the writer and returns the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
