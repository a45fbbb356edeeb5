//! Index statistics.
//!
//! Counters are atomic and can be read while indexing and queries run.
//! Tests use them to observe whether a lookup was served from the cache or
//! needed a scan of the persistent index.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for one [`ExternalIdIndex`](crate::ExternalIdIndex).
#[derive(Debug, Default)]
pub struct IndexStats {
    files_indexed: AtomicU64,
    files_unchanged: AtomicU64,
    files_removed: AtomicU64,
    records_extracted: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    index_scans: AtomicU64,
    invalidations: AtomicU64,
    implicit_records: AtomicU64,
    compactions: AtomicU64,
    errors: AtomicU64,
}

impl IndexStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_file_indexed(&self, records: usize) {
        self.files_indexed.fetch_add(1, Ordering::Relaxed);
        self.records_extracted
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_file_unchanged(&self) {
        self.files_unchanged.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_file_removed(&self) {
        self.files_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_scan(&self) {
        self.index_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidations(&self, count: usize) {
        self.invalidations
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_implicit(&self) {
        self.implicit_records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of files whose records were (re)extracted.
    pub fn files_indexed(&self) -> u64 {
        self.files_indexed.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups answered from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups that fell through to the persistent index.
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Returns the number of per-identifier scans of the persistent index.
    pub fn index_scans(&self) -> u64 {
        self.index_scans.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_indexed: self.files_indexed(),
            files_unchanged: self.files_unchanged.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            records_extracted: self.records_extracted.load(Ordering::Relaxed),
            cache_hits: self.cache_hits(),
            cache_misses: self.cache_misses(),
            index_scans: self.index_scans(),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            implicit_records: self.implicit_records.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`IndexStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Files whose records were (re)extracted.
    pub files_indexed: u64,
    /// Files skipped because their content hash was unchanged.
    pub files_unchanged: u64,
    /// Files dropped from the index.
    pub files_removed: u64,
    /// Records produced by the extractor.
    pub records_extracted: u64,
    /// Lookups answered from the cache.
    pub cache_hits: u64,
    /// Lookups that needed a persistent index scan.
    pub cache_misses: u64,
    /// Per-identifier scans of the persistent index.
    pub index_scans: u64,
    /// `(identifier, file)` pairs removed from the cache.
    pub invalidations: u64,
    /// Implicit records emitted to consumers.
    pub implicit_records: u64,
    /// Log compactions.
    pub compactions: u64,
    /// Failed index or query operations.
    pub errors: u64,
}
