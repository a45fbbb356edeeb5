//! # extid codec
//!
//! Fixed binary layouts for the persistent identifier index.
//!
//! Layouts written with this crate are a compatibility contract between
//! processes: fields are written in a fixed order with no self-description,
//! so any change to a layout must be paired with an index version bump.
//!
//! ## Field encodings
//!
//! - text: `u16` big-endian byte length, then UTF-8 bytes
//! - `u8`: one byte
//! - `u32` and counts: four bytes, little-endian
//!
//! ## Usage
//!
//! ```
//! use extid_codec::{DataReader, DataWriter};
//!
//! let mut w = DataWriter::new();
//! w.write_text("res.groups").unwrap();
//! w.write_u8(0);
//! let bytes = w.into_bytes();
//!
//! let mut r = DataReader::new(&bytes);
//! assert_eq!(r.read_text().unwrap(), "res.groups");
//! assert_eq!(r.read_u8().unwrap(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod error;
mod reader;
mod writer;

pub use checksum::crc32;
pub use error::{CodecError, CodecResult};
pub use reader::DataReader;
pub use writer::{DataWriter, MAX_TEXT_LEN};

/// Types with a fixed binary layout.
pub trait Encode {
    /// Appends this value's layout to `out`.
    fn encode_to(&self, out: &mut DataWriter) -> CodecResult<()>;

    /// Encodes this value into a fresh buffer.
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut out = DataWriter::new();
        self.encode_to(&mut out)?;
        Ok(out.into_bytes())
    }
}

/// Types that can be read back from their fixed binary layout.
pub trait Decode: Sized {
    /// Reads one value from `input`, leaving the reader after it.
    fn decode_from(input: &mut DataReader<'_>) -> CodecResult<Self>;

    /// Decodes a value that must span all of `bytes`.
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut input = DataReader::new(bytes);
        let value = Self::decode_from(&mut input)?;
        input.finish()?;
        Ok(value)
    }
}
