//! # extid storage
//!
//! Byte stores backing the persistent identifier log.
//!
//! A store is an append-only sequence of bytes with random reads and
//! truncation. It knows nothing about frames, records or versions; the
//! index engine in `extid_core` owns the log format and decides when to
//! truncate a torn tail or discard the whole log.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - Shared in-memory bytes, used by tests and ephemeral indexes
//! - [`FileStore`] - A single OS file, survives process restarts
//!
//! ## Example
//!
//! ```rust
//! use extid_storage::{IndexStore, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! let offset = store.append(b"frame").unwrap();
//! assert_eq!(store.read_at(offset, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::IndexStore;
