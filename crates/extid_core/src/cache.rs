//! The write-through record cache.
//!
//! Maps an identifier to the located records currently known for it, one
//! per contributing file. Each entry is an immutable `Arc<[Record]>`
//! snapshot replaced on write, so readers never see a half-updated entry
//! and never hold a shard lock while calling back into user code.
//!
//! An entry is *known* once a complete scan of the persistent index marked
//! it exhaustive. Entries filled only by extractor write-through are partial:
//! files indexed by an earlier process never went through this cache.

use crate::record::Record;
use crate::scope::Scope;
use crate::types::FileId;
use parking_lot::RwLock;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Arc<[Record]>,
    exhaustive: bool,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            exhaustive: false,
        }
    }
}

type Shard = RwLock<HashMap<String, CacheEntry>>;

/// Concurrent identifier → located records cache.
#[derive(Debug)]
pub struct RecordCache {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl RecordCache {
    /// Creates a cache with `shards` independently locked shards.
    #[must_use]
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, id: &str) -> &Shard {
        let index = self.hasher.hash_one(id) as usize % self.shards.len();
        &self.shards[index]
    }

    /// Merges a located record into its identifier's entry.
    ///
    /// Replaces any record already cached for the same identifier and file.
    /// Detached records are ignored.
    pub fn add(&self, record: Record) {
        let Some(file) = record.file().map(|f| f.id()) else {
            return;
        };
        let mut shard = self.shard(record.id()).write();
        let entry = shard
            .entry(record.id().to_string())
            .or_insert_with(CacheEntry::empty);
        let mut records: Vec<Record> = entry
            .records
            .iter()
            .filter(|r| r.file().map(|f| f.id()) != Some(file))
            .cloned()
            .collect();
        records.push(record);
        entry.records = records.into();
    }

    /// Emits the cached records for `id` visible in `scope`.
    ///
    /// Returns `None` when the identifier is not known, in which case the
    /// caller has to consult the persistent index.
    pub fn process_records(
        &self,
        id: &str,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> Option<ControlFlow<()>> {
        let records = {
            let shard = self.shard(id).read();
            let entry = shard.get(id).filter(|e| e.exhaustive)?;
            Arc::clone(&entry.records)
        };
        for record in records.iter() {
            if record.file().is_some_and(|f| scope.contains(f))
                && consumer(record.clone()).is_break()
            {
                return Some(ControlFlow::Break(()));
            }
        }
        Some(ControlFlow::Continue(()))
    }

    /// Removes the record cached for `id` from `file`.
    ///
    /// Returns true if a record was removed.
    pub fn clear_cache(&self, id: &str, file: FileId) -> bool {
        let mut shard = self.shard(id).write();
        let Some(entry) = shard.get_mut(id) else {
            return false;
        };
        let before = entry.records.len();
        let records: Vec<Record> = entry
            .records
            .iter()
            .filter(|r| r.file().map(|f| f.id()) != Some(file))
            .cloned()
            .collect();
        let removed = records.len() != before;
        if records.is_empty() && !entry.exhaustive {
            shard.remove(id);
        } else if removed {
            entry.records = records.into();
        }
        if removed {
            trace!(id, %file, "cache entry invalidated");
        }
        removed
    }

    /// Marks `id` as fully known, creating an empty entry if needed.
    pub fn mark_exhaustive(&self, id: &str) {
        self.shard(id)
            .write()
            .entry(id.to_string())
            .or_insert_with(CacheEntry::empty)
            .exhaustive = true;
    }

    /// Returns true if lookups of `id` can be answered from the cache.
    #[must_use]
    pub fn is_known(&self, id: &str) -> bool {
        self.shard(id).read().get(id).is_some_and(|e| e.exhaustive)
    }

    /// Returns the current snapshot for `id`, known or not.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<Arc<[Record]>> {
        self.shard(id)
            .read()
            .get(id)
            .map(|e| Arc::clone(&e.records))
    }

    /// Drops every entry.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Returns the number of identifiers with an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    /// Returns true if the cache holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordCache {
    fn default() -> Self {
        Self::new(crate::config::Config::default().cache_shards)
    }
}
