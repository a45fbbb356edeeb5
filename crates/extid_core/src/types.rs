//! File handles shared by the index, the cache and scopes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-local identifier of a source file.
///
/// File ids are assigned by a [`FileTable`] in first-seen order and are never
/// written to disk; the persistent log stores paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl FileId {
    /// Creates a file id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file:{}", self.0)
    }
}

/// A cheap, cloneable handle to one source file.
///
/// Equality and hashing use the [`FileId`] only.
#[derive(Clone)]
pub struct SourceFile {
    id: FileId,
    path: Arc<Path>,
}

impl SourceFile {
    /// Returns the file id.
    #[must_use]
    pub fn id(&self) -> FileId {
        self.id
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialEq for SourceFile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SourceFile {}

impl Hash for SourceFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.path.display())
    }
}

/// Interns paths into [`SourceFile`] handles.
#[derive(Debug, Default)]
pub struct FileTable {
    inner: RwLock<FileTableInner>,
}

#[derive(Debug, Default)]
struct FileTableInner {
    by_path: HashMap<PathBuf, FileId>,
    files: Vec<SourceFile>,
}

impl FileTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `path`, assigning a new id on first sight.
    pub fn intern(&self, path: &Path) -> SourceFile {
        if let Some(file) = self.lookup(path) {
            return file;
        }
        let mut inner = self.inner.write();
        if let Some(&id) = inner.by_path.get(path) {
            return inner.files[id.as_u32() as usize].clone();
        }
        let id = FileId::new(inner.files.len() as u32);
        let file = SourceFile {
            id,
            path: Arc::from(path),
        };
        inner.by_path.insert(path.to_path_buf(), id);
        inner.files.push(file.clone());
        file
    }

    /// Returns the handle for `path` if it was interned before.
    #[must_use]
    pub fn lookup(&self, path: &Path) -> Option<SourceFile> {
        let inner = self.inner.read();
        let id = inner.by_path.get(path)?;
        inner.files.get(id.as_u32() as usize).cloned()
    }

    /// Returns the handle for `id`.
    #[must_use]
    pub fn get(&self, id: FileId) -> Option<SourceFile> {
        self.inner.read().files.get(id.as_u32() as usize).cloned()
    }

    /// Returns the number of interned files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().files.len()
    }

    /// Returns true if no file was interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
