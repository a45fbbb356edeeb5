//! The byte store trait.

use crate::error::StorageResult;

/// An append-only byte store holding the identifier log.
///
/// # Invariants
///
/// - `append` returns the offset the bytes were written at
/// - `read_at` returns exactly the bytes previously appended at that offset
/// - `truncate` only shrinks; it is how torn tails and discarded logs are dropped
/// - `sync` makes every appended byte survive process termination
pub trait IndexStore: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`](crate::StorageError::ReadPastEnd)
    /// if the range extends beyond [`IndexStore::len`].
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Reads the whole store.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let len = self.len()?;
        self.read_at(0, len as usize)
    }

    /// Appends `data` and returns the offset it was written at.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    fn flush(&mut self) -> StorageResult<()>;

    /// Makes all appended data and the store length durable.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current length in bytes.
    fn len(&self) -> StorageResult<u64>;

    /// Returns true if nothing has been appended.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Shrinks the store to `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidTruncate`](crate::StorageError::InvalidTruncate)
    /// if `len` is greater than the current length.
    fn truncate(&mut self, len: u64) -> StorageResult<()>;
}
