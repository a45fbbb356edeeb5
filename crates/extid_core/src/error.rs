//! Error types for the identifier index.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in index and query operations.
///
/// Only engine-level failures surface here. A blank identifier, an identifier
/// declared by several files, or an anchor outside every module are all
/// handled locally and never produce an error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Byte store error.
    #[error("storage error: {0}")]
    Storage(#[from] extid_storage::StorageError),

    /// Binary layout error.
    #[error("codec error: {0}")]
    Codec(#[from] extid_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The persistent index is suspended or was interrupted mid-scan.
    #[error("persistent index unavailable")]
    IndexUnavailable,

    /// Another process holds the index directory lock.
    #[error("index locked: another process has exclusive access")]
    IndexLocked,

    /// A log frame failed validation.
    #[error("index log corruption at offset {offset}: {message}")]
    LogCorruption {
        /// Offset of the offending frame.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// A source file could not be parsed.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// The file being parsed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Invalid on-disk format or directory layout.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates a log corruption error.
    pub fn log_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::LogCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Returns true for failures the caller may retry once the index is back.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::IndexUnavailable)
    }
}
