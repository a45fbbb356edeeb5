//! Per-file identifier tracking.
//!
//! Remembers which identifiers each file contributed on its last reindex,
//! so that identifiers a file stops declaring can be dropped from the
//! record cache. Each file has its own mutex; holding it makes one
//! reindex of that file atomic with respect to others.

use crate::types::FileId;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

type Slot = Arc<Mutex<HashSet<String>>>;

/// Side table `file → identifiers last contributed`.
#[derive(Debug, Default)]
pub struct FileIdentifierTracker {
    files: RwLock<HashMap<FileId, Slot>>,
}

impl FileIdentifierTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, file: FileId) -> Slot {
        if let Some(slot) = self.files.read().get(&file) {
            return Arc::clone(slot);
        }
        Arc::clone(self.files.write().entry(file).or_default())
    }

    /// Runs `f` with exclusive access to the set tracked for `file`.
    pub fn with_file<R>(&self, file: FileId, f: impl FnOnce(&mut HashSet<String>) -> R) -> R {
        let slot = self.slot(file);
        let mut tracked = slot.lock();
        f(&mut tracked)
    }

    /// Records that `file` contributes `id`.
    pub fn note(&self, file: FileId, id: &str) {
        let slot = self.slot(file);
        let mut tracked = slot.lock();
        if !tracked.contains(id) {
            tracked.insert(id.to_string());
        }
    }

    /// Drops the entry for `file`, returning what it tracked.
    pub fn forget(&self, file: FileId) -> HashSet<String> {
        let Some(slot) = self.files.write().remove(&file) else {
            return HashSet::new();
        };
        let mut tracked = slot.lock();
        std::mem::take(&mut *tracked)
    }

    /// Returns a copy of the identifiers tracked for `file`.
    #[must_use]
    pub fn tracked(&self, file: FileId) -> HashSet<String> {
        let Some(slot) = self.files.read().get(&file).cloned() else {
            return HashSet::new();
        };
        let tracked = slot.lock();
        tracked.clone()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.files.write().clear();
    }
}

/// Identifiers present in `tracked` or `previous` but not in `current`,
/// sorted and deduplicated.
pub fn removed_ids<'a>(
    tracked: &'a HashSet<String>,
    previous: impl IntoIterator<Item = &'a str>,
    current: &HashSet<String>,
) -> Vec<String> {
    let removed: BTreeSet<&str> = tracked
        .iter()
        .map(String::as_str)
        .chain(previous)
        .filter(|id| !current.contains(*id))
        .collect();
    removed.into_iter().map(str::to_string).collect()
}
