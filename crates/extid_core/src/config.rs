//! Index configuration.

/// Configuration for opening an [`ExternalIdIndex`](crate::ExternalIdIndex).
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the index directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Number of independently locked shards in the record cache.
    pub cache_shards: usize,

    /// Whether to sync the log after every file update (safer but slower).
    pub sync_on_update: bool,

    /// Log size above which superseded frames are compacted away.
    pub compaction_threshold: u64,

    /// Whether a file whose content hash is unchanged skips re-extraction.
    pub skip_unchanged: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            cache_shards: 64,
            sync_on_update: false,
            compaction_threshold: 16 * 1024 * 1024, // 16 MB
            skip_unchanged: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the index directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the number of cache shards (at least one is always used).
    #[must_use]
    pub const fn cache_shards(mut self, shards: usize) -> Self {
        self.cache_shards = shards;
        self
    }

    /// Sets whether to sync the log on every update.
    #[must_use]
    pub const fn sync_on_update(mut self, value: bool) -> Self {
        self.sync_on_update = value;
        self
    }

    /// Sets the compaction threshold in bytes.
    #[must_use]
    pub const fn compaction_threshold(mut self, bytes: u64) -> Self {
        self.compaction_threshold = bytes;
        self
    }

    /// Sets whether unchanged files skip re-extraction.
    #[must_use]
    pub const fn skip_unchanged(mut self, value: bool) -> Self {
        self.skip_unchanged = value;
        self
    }
}
