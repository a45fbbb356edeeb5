//! Error types for byte stores.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by an [`IndexStore`](crate::IndexStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read reached past the end of the stored bytes.
    #[error("read beyond end of store: offset {offset}, len {len}, size {size}")]
    ReadPastEnd {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: usize,
        /// Current store length.
        size: u64,
    },

    /// Truncation was asked to grow the store.
    #[error("cannot truncate store of {size} bytes to {requested} bytes")]
    InvalidTruncate {
        /// Current store length.
        size: u64,
        /// Requested length.
        requested: u64,
    },

    /// The store refuses writes (injected failure or read-only medium).
    #[error("store is unavailable for writing")]
    Unavailable,
}
