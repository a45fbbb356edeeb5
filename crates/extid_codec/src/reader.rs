//! Sequential binary reader.

use crate::error::{CodecError, CodecResult};

/// Reads fields written by [`DataWriter`](crate::DataWriter) from a byte slice.
#[derive(Debug, Clone)]
pub struct DataReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        if remaining < len {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_text(&mut self) -> CodecResult<String> {
        let prefix = self.take(2)?;
        let len = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a little-endian `u32`.
    pub fn read_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a collection length written by `write_count`.
    pub fn read_count(&mut self) -> CodecResult<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Reads exactly `N` raw bytes.
    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(CodecError::TrailingBytes { remaining }),
        }
    }
}
