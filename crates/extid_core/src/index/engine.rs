//! The persistent identifier index.
//!
//! State is the replay of an append-only log of per-file frames. Every
//! file update appends one frame holding the file's complete entry set,
//! so later frames supersede earlier ones for the same path.
//!
//! ## Invariants
//!
//! - The index is derivable from the data files; it is never the source of truth
//! - A log that fails validation is discarded and `needs_rebuild` is raised
//! - A torn tail (an incomplete last frame) is truncated silently
//! - Cache hooks run under the state write lock, so a concurrent scan never
//!   observes the new state without the matching invalidations

use super::frame::{frame_follows, read_frame, FrameRead, LogFrame};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::scope::Scope;
use crate::types::{FileId, FileTable, SourceFile};
use extid_storage::IndexStore;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Magic bytes at the start of the log: "XIDX".
pub const LOG_MAGIC: [u8; 4] = *b"XIDX";

/// Version of the log and value layout. Bump on any layout change.
pub const INDEX_VERSION: u32 = 1;

/// Size of the log header (magic + version).
pub const LOG_HEADER_SIZE: usize = 8;

fn log_header() -> [u8; LOG_HEADER_SIZE] {
    let mut header = [0u8; LOG_HEADER_SIZE];
    header[..4].copy_from_slice(&LOG_MAGIC);
    header[4..].copy_from_slice(&INDEX_VERSION.to_le_bytes());
    header
}

#[derive(Debug)]
struct FileEntry {
    file: SourceFile,
    hash: [u8; 32],
    keys: Vec<String>,
}

struct IndexState {
    store: Box<dyn IndexStore>,
    keys: BTreeMap<String, BTreeMap<FileId, Record>>,
    files: HashMap<FileId, FileEntry>,
    log_len: u64,
    /// Log length right after the last rewrite.
    compacted_len: u64,
}

impl IndexState {
    fn detach(&mut self, file: FileId) -> Option<FileEntry> {
        let entry = self.files.remove(&file)?;
        for key in &entry.keys {
            if let Some(values) = self.keys.get_mut(key) {
                values.remove(&file);
                if values.is_empty() {
                    self.keys.remove(key);
                }
            }
        }
        Some(entry)
    }

    fn attach(&mut self, file: SourceFile, hash: [u8; 32], entries: Vec<Record>) {
        let mut keys = Vec::with_capacity(entries.len());
        for record in entries {
            keys.push(record.id().to_string());
            self.keys
                .entry(record.id().to_string())
                .or_default()
                .insert(file.id(), record);
        }
        self.files.insert(
            file.id(),
            FileEntry { file, hash, keys },
        );
    }

    fn reset_log(&mut self) -> CoreResult<()> {
        self.store.truncate(0)?;
        self.store.append(&log_header())?;
        self.store.sync()?;
        self.log_len = LOG_HEADER_SIZE as u64;
        self.compacted_len = self.log_len;
        self.keys.clear();
        self.files.clear();
        Ok(())
    }
}

/// Durable mapping identifier → one detached record per contributing file.
pub struct PersistentIndex {
    state: RwLock<IndexState>,
    files: Arc<FileTable>,
    available: AtomicBool,
    needs_rebuild: AtomicBool,
    sync_on_update: bool,
    compaction_threshold: u64,
}

impl std::fmt::Debug for PersistentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PersistentIndex")
            .field("keys", &state.keys.len())
            .field("files", &state.files.len())
            .field("log_len", &state.log_len)
            .field("available", &self.is_available())
            .finish()
    }
}

impl PersistentIndex {
    /// Opens the index over `store`, replaying its log.
    ///
    /// A log that fails validation is discarded; check
    /// [`PersistentIndex::needs_rebuild`] afterwards.
    pub fn open(store: Box<dyn IndexStore>, files: Arc<FileTable>, config: &Config) -> CoreResult<Self> {
        let index = Self {
            state: RwLock::new(IndexState {
                store,
                keys: BTreeMap::new(),
                files: HashMap::new(),
                log_len: 0,
                compacted_len: 0,
            }),
            files,
            available: AtomicBool::new(true),
            needs_rebuild: AtomicBool::new(false),
            sync_on_update: config.sync_on_update,
            compaction_threshold: config.compaction_threshold,
        };
        index.replay()?;
        Ok(index)
    }

    fn replay(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        let bytes = state.store.read_all()?;

        if bytes.len() < LOG_HEADER_SIZE {
            if !log_header().starts_with(&bytes) {
                warn!(len = bytes.len(), "index log header is invalid, discarding");
                self.needs_rebuild.store(true, Ordering::Release);
            }
            return state.reset_log();
        }
        if bytes[..4] != LOG_MAGIC {
            warn!("index log has bad magic, discarding");
            self.needs_rebuild.store(true, Ordering::Release);
            return state.reset_log();
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != INDEX_VERSION {
            info!(
                found = version,
                expected = INDEX_VERSION,
                "index version changed, discarding log"
            );
            self.needs_rebuild.store(true, Ordering::Release);
            return state.reset_log();
        }

        let mut offset = LOG_HEADER_SIZE;
        let mut frames = 0usize;
        while offset < bytes.len() {
            match read_frame(&bytes[offset..]) {
                FrameRead::Complete(frame, len) => {
                    self.apply(&mut state, frame);
                    offset += len;
                    frames += 1;
                }
                FrameRead::Torn if frame_follows(&bytes[offset..]) => {
                    let err = CoreError::log_corruption(
                        offset as u64,
                        "frame length runs past later frames",
                    );
                    warn!(error = %err, "discarding index log");
                    self.needs_rebuild.store(true, Ordering::Release);
                    return state.reset_log();
                }
                FrameRead::Torn => {
                    info!(offset, dropped = bytes.len() - offset, "truncating torn log tail");
                    state.store.truncate(offset as u64)?;
                    state.store.sync()?;
                    break;
                }
                FrameRead::Corrupt(message) => {
                    let err = CoreError::log_corruption(offset as u64, message);
                    warn!(error = %err, "discarding index log");
                    self.needs_rebuild.store(true, Ordering::Release);
                    return state.reset_log();
                }
            }
        }
        state.log_len = offset as u64;
        debug!(
            frames,
            files = state.files.len(),
            keys = state.keys.len(),
            "index log replayed"
        );
        Ok(())
    }

    fn apply(&self, state: &mut IndexState, frame: LogFrame) -> Vec<String> {
        let file = self.files.intern(Path::new(frame.path()));
        let previous = state.detach(file.id()).map(|e| e.keys).unwrap_or_default();
        if let LogFrame::FileIndexed { hash, entries, .. } = frame {
            state.attach(file, hash, entries);
        }
        previous
    }

    fn append(&self, state: &mut IndexState, frame: &LogFrame) -> CoreResult<()> {
        let bytes = frame.to_bytes()?;
        state.store.append(&bytes)?;
        if self.sync_on_update {
            state.store.sync()?;
        } else {
            state.store.flush()?;
        }
        state.log_len += bytes.len() as u64;
        Ok(())
    }

    fn ensure_available(&self) -> CoreResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(CoreError::IndexUnavailable)
        }
    }

    /// Replaces the entries of `file` with `entries`.
    ///
    /// `hook` receives the keys the file held before the update and runs
    /// while the state write lock is held.
    pub fn update_file(
        &self,
        file: &SourceFile,
        hash: [u8; 32],
        entries: Vec<Record>,
        hook: &mut dyn FnMut(&[String]),
    ) -> CoreResult<()> {
        let frame = LogFrame::FileIndexed {
            path: path_text(file.path())?,
            hash,
            entries,
        };
        let mut state = self.state.write();
        self.append(&mut state, &frame)?;
        let previous = self.apply(&mut state, frame);
        hook(&previous);
        self.maybe_compact(&mut state)?;
        Ok(())
    }

    /// Drops every entry of `file`.
    ///
    /// Returns false (and writes nothing) if the file was not indexed.
    pub fn remove_file(&self, file: &SourceFile, hook: &mut dyn FnMut(&[String])) -> CoreResult<bool> {
        let mut state = self.state.write();
        if !state.files.contains_key(&file.id()) {
            return Ok(false);
        }
        let frame = LogFrame::FileRemoved {
            path: path_text(file.path())?,
        };
        self.append(&mut state, &frame)?;
        let previous = self.apply(&mut state, frame);
        hook(&previous);
        self.maybe_compact(&mut state)?;
        Ok(true)
    }

    /// Streams every key with at least one contributing file in `scope`.
    ///
    /// Fails with `IndexUnavailable` if the index is suspended before or
    /// during the scan.
    pub fn process_all_keys(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        self.ensure_available()?;
        let keys: Vec<String> = {
            let state = self.state.read();
            state
                .keys
                .iter()
                .filter(|(_, values)| {
                    values
                        .keys()
                        .any(|fid| state.files.get(fid).is_some_and(|e| scope.contains(&e.file)))
                })
                .map(|(key, _)| key.clone())
                .collect()
        };
        for key in &keys {
            self.ensure_available()?;
            if consumer(key).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Streams the detached records stored under `key` from files in `scope`.
    ///
    /// The read lock is held while `consumer` runs.
    pub fn process_values(
        &self,
        key: &str,
        scope: &Scope,
        consumer: &mut dyn FnMut(&SourceFile, &Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        self.ensure_available()?;
        let state = self.state.read();
        let Some(values) = state.keys.get(key) else {
            return Ok(ControlFlow::Continue(()));
        };
        for (fid, record) in values {
            self.ensure_available()?;
            let Some(entry) = state.files.get(fid) else {
                continue;
            };
            if scope.contains(&entry.file) && consumer(&entry.file, record).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Returns the content hash recorded for `file`.
    #[must_use]
    pub fn file_hash(&self, file: FileId) -> Option<[u8; 32]> {
        self.state.read().files.get(&file).map(|e| e.hash)
    }

    /// Returns the keys `file` contributes.
    #[must_use]
    pub fn file_keys(&self, file: FileId) -> Vec<String> {
        self.state
            .read()
            .files
            .get(&file)
            .map(|e| e.keys.clone())
            .unwrap_or_default()
    }

    /// Returns the paths of every indexed file.
    #[must_use]
    pub fn indexed_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .state
            .read()
            .files
            .values()
            .map(|e| e.file.path().to_path_buf())
            .collect();
        paths.sort();
        paths
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.state.read().keys.len()
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    /// Returns the current log length in bytes.
    #[must_use]
    pub fn log_len(&self) -> u64 {
        self.state.read().log_len
    }

    /// Returns the version token of the log and value layout.
    #[must_use]
    pub const fn version(&self) -> u32 {
        INDEX_VERSION
    }

    /// Returns true if the log was discarded on open.
    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild.load(Ordering::Acquire)
    }

    /// Clears the rebuild flag once every file has been reindexed.
    pub fn mark_rebuilt(&self) {
        self.needs_rebuild.store(false, Ordering::Release);
    }

    /// Makes scans fail with `IndexUnavailable` until [`resume`](Self::resume).
    pub fn suspend(&self) {
        debug!("persistent index suspended");
        self.available.store(false, Ordering::Release);
    }

    /// Makes the index available again.
    pub fn resume(&self) {
        debug!("persistent index resumed");
        self.available.store(true, Ordering::Release);
    }

    /// Returns true if scans can run.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Makes every appended frame durable.
    pub fn sync(&self) -> CoreResult<()> {
        self.state.write().store.sync()?;
        Ok(())
    }

    /// Rewrites the log with live frames only.
    pub fn compact(&self) -> CoreResult<()> {
        let mut state = self.state.write();
        self.rewrite(&mut state)
    }

    fn maybe_compact(&self, state: &mut IndexState) -> CoreResult<()> {
        if state.log_len > self.compaction_threshold && state.log_len > 2 * state.compacted_len {
            self.rewrite(state)?;
        }
        Ok(())
    }

    fn rewrite(&self, state: &mut IndexState) -> CoreResult<()> {
        let before = state.log_len;
        let mut live: Vec<(&FileId, &FileEntry)> = state.files.iter().collect();
        live.sort_by_key(|(fid, _)| **fid);

        let mut bytes = log_header().to_vec();
        for (fid, entry) in live {
            let entries = entry
                .keys
                .iter()
                .filter_map(|k| state.keys.get(k).and_then(|v| v.get(fid)).cloned())
                .collect();
            let frame = LogFrame::FileIndexed {
                path: path_text(entry.file.path())?,
                hash: entry.hash,
                entries,
            };
            bytes.extend_from_slice(&frame.to_bytes()?);
        }

        state.store.truncate(0)?;
        state.store.append(&bytes)?;
        state.store.sync()?;
        state.log_len = bytes.len() as u64;
        state.compacted_len = state.log_len;
        info!(before, after = state.log_len, "index log compacted");
        Ok(())
    }
}

fn path_text(path: &Path) -> CoreResult<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| CoreError::invalid_format(format!("non UTF-8 path: {}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use extid_storage::MemoryStore;

    fn open(store: &MemoryStore) -> (PersistentIndex, Arc<FileTable>) {
        let files = Arc::new(FileTable::new());
        let index =
            PersistentIndex::open(Box::new(store.clone()), Arc::clone(&files), &Config::default())
                .unwrap();
        (index, files)
    }

    fn record(id: &str, module: &str) -> Record {
        Record::new(id, id, "res.groups", module)
    }

    fn keys(index: &PersistentIndex, scope: &Scope) -> Vec<String> {
        let mut out = Vec::new();
        index
            .process_all_keys(scope, &mut |k| {
                out.push(k.to_string());
                ControlFlow::Continue(())
            })
            .unwrap();
        out
    }

    fn values(index: &PersistentIndex, key: &str) -> Vec<(PathBuf, Record)> {
        let mut out = Vec::new();
        index
            .process_values(key, &Scope::Everything, &mut |f, r| {
                out.push((f.path().to_path_buf(), r.clone()));
                ControlFlow::Continue(())
            })
            .unwrap();
        out
    }

    #[test]
    fn empty_store_gets_header() {
        let store = MemoryStore::new();
        let (index, _) = open(&store);
        assert_eq!(store.bytes(), log_header().to_vec());
        assert!(!index.needs_rebuild());
        assert_eq!(index.version(), INDEX_VERSION);
    }

    #[test]
    fn update_and_supersede() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let a = files.intern(Path::new("/addons/base/a.xml"));

        index
            .update_file(&a, [1; 32], vec![record("base.x", "base"), record("base.y", "base")], &mut |prev| {
                assert!(prev.is_empty())
            })
            .unwrap();
        let mut seen = Vec::new();
        index
            .update_file(&a, [2; 32], vec![record("base.y", "base")], &mut |prev| {
                seen = prev.to_vec()
            })
            .unwrap();

        assert_eq!(seen, vec!["base.x", "base.y"]);
        assert_eq!(keys(&index, &Scope::Everything), vec!["base.y"]);
        assert_eq!(index.file_hash(a.id()), Some([2; 32]));
    }

    #[test]
    fn multiple_files_per_key() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let a = files.intern(Path::new("/addons/base/a.xml"));
        let b = files.intern(Path::new("/addons/hr/b.xml"));
        index.update_file(&a, [0; 32], vec![record("base.group_user", "base")], &mut |_| {}).unwrap();
        index.update_file(&b, [0; 32], vec![record("base.group_user", "hr")], &mut |_| {}).unwrap();

        let found = values(&index, "base.group_user");
        assert_eq!(found.len(), 2);
        assert_eq!(keys(&index, &Scope::roots(["/addons/hr"])), vec!["base.group_user"]);
        assert!(keys(&index, &Scope::roots(["/addons/sale"])).is_empty());
    }

    #[test]
    fn reopen_replays_log() {
        let store = MemoryStore::new();
        {
            let (index, files) = open(&store);
            let a = files.intern(Path::new("/addons/base/a.xml"));
            let b = files.intern(Path::new("/addons/base/b.xml"));
            index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {}).unwrap();
            index.update_file(&b, [1; 32], vec![record("base.z", "base")], &mut |_| {}).unwrap();
            assert!(index.remove_file(&b, &mut |_| {}).unwrap());
        }
        let (index, files) = open(&store);
        assert!(!index.needs_rebuild());
        assert_eq!(keys(&index, &Scope::Everything), vec!["base.x"]);
        let a = files.lookup(Path::new("/addons/base/a.xml")).unwrap();
        assert_eq!(index.file_keys(a.id()), vec!["base.x"]);
        assert_eq!(
            index.indexed_paths(),
            vec![PathBuf::from("/addons/base/a.xml")]
        );
    }

    #[test]
    fn remove_unknown_file_writes_nothing() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let len = index.log_len();
        let a = files.intern(Path::new("/addons/base/a.xml"));
        assert!(!index.remove_file(&a, &mut |_| {}).unwrap());
        assert_eq!(index.log_len(), len);
    }

    #[test]
    fn version_mismatch_discards() {
        let mut bytes = LOG_MAGIC.to_vec();
        bytes.extend_from_slice(&(INDEX_VERSION + 1).to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        let store = MemoryStore::with_bytes(bytes);
        let (index, _) = open(&store);
        assert!(index.needs_rebuild());
        assert_eq!(store.bytes(), log_header().to_vec());
        index.mark_rebuilt();
        assert!(!index.needs_rebuild());
    }

    #[test]
    fn bad_magic_discards() {
        let store = MemoryStore::with_bytes(b"NOPE\x01\x00\x00\x00".to_vec());
        let (index, _) = open(&store);
        assert!(index.needs_rebuild());
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn torn_header_is_reset_silently() {
        let store = MemoryStore::with_bytes(b"XID".to_vec());
        let (index, _) = open(&store);
        assert!(!index.needs_rebuild());
        assert_eq!(store.bytes().len(), LOG_HEADER_SIZE);
    }

    #[test]
    fn torn_tail_is_truncated() {
        let store = MemoryStore::new();
        let good_len;
        {
            let (index, files) = open(&store);
            let a = files.intern(Path::new("/addons/base/a.xml"));
            index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {}).unwrap();
            good_len = index.log_len();
            let b = files.intern(Path::new("/addons/base/b.xml"));
            index.update_file(&b, [1; 32], vec![record("base.y", "base")], &mut |_| {}).unwrap();
        }
        let mut bytes = store.bytes();
        bytes.truncate(bytes.len() - 3);
        store.replace(bytes);

        let (index, _) = open(&store);
        assert!(!index.needs_rebuild());
        assert_eq!(keys(&index, &Scope::Everything), vec!["base.x"]);
        assert_eq!(store.bytes().len() as u64, good_len);
    }

    #[test]
    fn damaged_length_discards_instead_of_truncating() {
        let store = MemoryStore::new();
        {
            let (index, files) = open(&store);
            let a = files.intern(Path::new("/addons/base/a.xml"));
            index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {}).unwrap();
            let b = files.intern(Path::new("/addons/base/b.xml"));
            index.update_file(&b, [1; 32], vec![record("base.y", "base")], &mut |_| {}).unwrap();
        }
        let mut bytes = store.bytes();
        // High byte of the first frame's length.
        bytes[LOG_HEADER_SIZE + 4] ^= 0x01;
        store.replace(bytes);

        let (index, _) = open(&store);
        assert!(index.needs_rebuild());
        assert_eq!(index.file_count(), 0);
        assert_eq!(store.bytes().len(), LOG_HEADER_SIZE);
    }

    #[test]
    fn crc_corruption_discards() {
        let store = MemoryStore::new();
        {
            let (index, files) = open(&store);
            let a = files.intern(Path::new("/addons/base/a.xml"));
            index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {}).unwrap();
        }
        let mut bytes = store.bytes();
        let last = bytes.len() - 6;
        bytes[last] ^= 0x55;
        store.replace(bytes);

        let (index, _) = open(&store);
        assert!(index.needs_rebuild());
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn suspended_index_is_unavailable() {
        let store = MemoryStore::new();
        let (index, _) = open(&store);
        index.suspend();
        let err = index
            .process_all_keys(&Scope::Everything, &mut |_| ControlFlow::Continue(()))
            .unwrap_err();
        assert!(err.is_unavailable());
        index.resume();
        assert!(index
            .process_values("base.x", &Scope::Everything, &mut |_, _| ControlFlow::Continue(()))
            .is_ok());
    }

    #[test]
    fn suspension_interrupts_key_scan() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let a = files.intern(Path::new("/addons/base/a.xml"));
        index
            .update_file(&a, [1; 32], vec![record("base.a", "base"), record("base.b", "base")], &mut |_| {})
            .unwrap();
        let result = index.process_all_keys(&Scope::Everything, &mut |_| {
            index.suspend();
            ControlFlow::Continue(())
        });
        assert!(matches!(result, Err(CoreError::IndexUnavailable)));
    }

    #[test]
    fn failed_append_leaves_state_unchanged() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let a = files.intern(Path::new("/addons/base/a.xml"));
        store.reject_writes(true);
        let mut called = false;
        let result = index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {
            called = true
        });
        assert!(result.is_err());
        assert!(!called);
        assert_eq!(index.key_count(), 0);
    }

    #[test]
    fn compaction_drops_superseded_frames() {
        let store = MemoryStore::new();
        let files = Arc::new(FileTable::new());
        let config = Config::default().compaction_threshold(256);
        let index = PersistentIndex::open(Box::new(store.clone()), Arc::clone(&files), &config).unwrap();
        let a = files.intern(Path::new("/addons/base/a.xml"));
        for i in 0..50u8 {
            index
                .update_file(&a, [i; 32], vec![record("base.x", "base")], &mut |_| {})
                .unwrap();
        }
        assert!(index.log_len() < 512);

        let (reopened, _) = open(&store);
        assert_eq!(keys(&reopened, &Scope::Everything), vec!["base.x"]);
        let fid = files.lookup(Path::new("/addons/base/a.xml")).unwrap().id();
        assert_eq!(index.file_hash(fid), Some([49; 32]));
    }

    #[test]
    fn explicit_compact_preserves_state() {
        let store = MemoryStore::new();
        let (index, files) = open(&store);
        let a = files.intern(Path::new("/addons/base/a.xml"));
        index.update_file(&a, [1; 32], vec![record("base.x", "base")], &mut |_| {}).unwrap();
        index.update_file(&a, [2; 32], vec![record("base.y", "base")], &mut |_| {}).unwrap();
        let before = index.log_len();
        index.compact().unwrap();
        assert!(index.log_len() < before);

        let (reopened, _) = open(&store);
        assert_eq!(keys(&reopened, &Scope::Everything), vec!["base.y"]);
    }
}
