//! File-backed byte store.

use crate::error::{StorageError, StorageResult};
use crate::store::IndexStore;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A byte store kept in a single file.
///
/// `flush` hands data to the OS, `sync` calls `File::sync_all`. Truncation
/// is synced immediately so a discarded log never reappears after a crash.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: File,
    len: u64,
}

impl FileStore {
    /// Opens the file at `path`, creating it (and its parent directories) if missing.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(FileState { file, len }),
        })
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexStore for FileStore {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut state = self.inner.lock();
        let size = state.len;
        if offset > size || offset.saturating_add(len as u64) > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        state.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        state.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let state = self.inner.get_mut();
        let offset = state.len;
        if data.is_empty() {
            return Ok(offset);
        }
        state.file.seek(SeekFrom::End(0))?;
        state.file.write_all(data)?;
        state.len += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.get_mut().file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.inner.get_mut().file.sync_all()?;
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.inner.lock().len)
    }

    fn truncate(&mut self, len: u64) -> StorageResult<()> {
        let state = self.inner.get_mut();
        if len > state.len {
            return Err(StorageError::InvalidTruncate {
                size: state.len,
                requested: len,
            });
        }
        state.file.set_len(len)?;
        state.file.sync_all()?;
        state.len = len;
        Ok(())
    }
}
