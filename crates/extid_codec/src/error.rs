//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Text is too long for a 16-bit length prefix.
    #[error("text of {len} bytes exceeds the {max} byte limit")]
    TextTooLong {
        /// Encoded length of the text.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },

    /// A collection has more elements than a 32-bit count can hold.
    #[error("collection of {len} elements is too large to encode")]
    CountTooLarge {
        /// Number of elements.
        len: usize,
    },

    /// Text bytes are not valid UTF-8.
    #[error("invalid UTF-8 text")]
    InvalidUtf8,

    /// Input ended before the value was complete.
    #[error("unexpected end of input: needed {needed} more bytes at offset {offset}")]
    UnexpectedEof {
        /// Offset where the read started.
        offset: usize,
        /// Bytes missing.
        needed: usize,
    },

    /// A tag byte has no meaning in this layout.
    #[error("invalid {what} tag: {tag}")]
    InvalidTag {
        /// Name of the tagged field.
        what: &'static str,
        /// The offending byte.
        tag: u8,
    },

    /// Bytes were left over after a complete value.
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },
}

impl CodecError {
    /// Creates an invalid tag error.
    pub fn invalid_tag(what: &'static str, tag: u8) -> Self {
        Self::InvalidTag { what, tag }
    }
}
