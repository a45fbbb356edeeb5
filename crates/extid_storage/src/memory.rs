//! In-memory byte store.

use crate::error::{StorageError, StorageResult};
use crate::store::IndexStore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory byte store.
///
/// Clones share the same bytes, which lets a test drop an index and
/// "reopen" it from the same store, or corrupt the bytes in between.
///
/// ```rust
/// use extid_storage::{IndexStore, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let reopened = store.clone();
/// store.append(b"abc").unwrap();
/// assert_eq!(reopened.len().unwrap(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    bytes: Arc<RwLock<Vec<u8>>>,
    reject_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(RwLock::new(bytes)),
            reject_writes: Arc::default(),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Replaces the stored bytes.
    pub fn replace(&self, bytes: Vec<u8>) {
        *self.bytes.write() = bytes;
    }

    /// Makes every later append fail with [`StorageError::Unavailable`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }
}

impl IndexStore for MemoryStore {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let bytes = self.bytes.read();
        let size = bytes.len() as u64;
        let start = offset as usize;
        let end = start.saturating_add(len);

        if offset > size || end > bytes.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        Ok(bytes[start..end].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable);
        }
        let mut bytes = self.bytes.write();
        let offset = bytes.len() as u64;
        bytes.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.bytes.read().len() as u64)
    }

    fn truncate(&mut self, len: u64) -> StorageResult<()> {
        let mut bytes = self.bytes.write();
        let size = bytes.len() as u64;
        if len > size {
            return Err(StorageError::InvalidTruncate {
                size,
                requested: len,
            });
        }
        bytes.truncate(len as usize);
        Ok(())
    }
}
