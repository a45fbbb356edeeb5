//! The external identifier index service.

use crate::cache::RecordCache;
use crate::config::Config;
use crate::csv::{is_csv, is_xml};
use crate::declaration::{ParsedFile, SourceParser, TabularParser};
use crate::dir::IndexDir;
use crate::error::CoreResult;
use crate::extract::extract_records;
use crate::implicit::{ImplicitRecordSource, NoImplicitRecords};
use crate::index::PersistentIndex;
use crate::module::{Module, ModuleGraph};
use crate::query::QueryEngine;
use crate::record::Record;
use crate::scope::Scope;
use crate::stats::IndexStats;
use crate::tracker::{removed_ids, FileIdentifierTracker};
use crate::types::{FileTable, SourceFile};
use extid_storage::{FileStore, IndexStore, MemoryStore};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Stored in place of a content hash when the parser did not recognize the
/// file. No content digests to it, so the file is always reparsed.
const UNRECOGNIZED_HASH: [u8; 32] = [0; 32];

/// The services an index consults but does not own.
#[derive(Clone)]
pub struct Collaborators {
    /// Turns file content into declarations.
    pub parser: Arc<dyn SourceParser>,
    /// Module layout and dependencies.
    pub modules: Arc<dyn ModuleGraph>,
    /// Records not declared in any data file.
    pub implicit: Arc<dyn ImplicitRecordSource>,
}

impl Collaborators {
    /// Uses `modules`, the built-in tabular parser and no implicit records.
    pub fn new(modules: Arc<dyn ModuleGraph>) -> Self {
        Self {
            parser: Arc::new(TabularParser),
            modules,
            implicit: Arc::new(NoImplicitRecords),
        }
    }

    /// Replaces the parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the implicit record source.
    #[must_use]
    pub fn with_implicit(mut self, implicit: Arc<dyn ImplicitRecordSource>) -> Self {
        self.implicit = implicit;
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// What [`ExternalIdIndex::index_file`] did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// Records were extracted and stored.
    Indexed {
        /// Records the file declares.
        records: usize,
        /// Cache entries dropped because the file no longer declares them.
        invalidated: usize,
    },
    /// The content hash matched the indexed content.
    Unchanged,
    /// The file was indexed before and is no longer eligible.
    Removed,
    /// The file is not a data file inside a module.
    Ineligible,
}

/// Index of external identifiers across a modular project.
///
/// Files are fed in with [`index_file`](Self::index_file) as they change;
/// lookups fuse the persistent index, the record cache and the implicit
/// record source under a visibility scope.
///
/// # Thread Safety
///
/// All methods take `&self`. Distinct files may be indexed from many
/// threads while queries run.
pub struct ExternalIdIndex {
    config: Config,
    files: Arc<FileTable>,
    index: PersistentIndex,
    cache: RecordCache,
    tracker: FileIdentifierTracker,
    stats: IndexStats,
    collaborators: Collaborators,
    _dir: Option<IndexDir>,
}

impl std::fmt::Debug for ExternalIdIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalIdIndex")
            .field("index", &self.index)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl ExternalIdIndex {
    /// Opens or creates an index in `path`.
    ///
    /// # Errors
    ///
    /// Returns `IndexLocked` if another process has the index open.
    pub fn open(path: &Path, config: Config, collaborators: Collaborators) -> CoreResult<Self> {
        let dir = IndexDir::open(path, config.create_if_missing)?;
        let store = FileStore::open(&dir.log_path())?;
        let mut index = Self::open_with_store(Box::new(store), config, collaborators)?;
        info!(path = %path.display(), files = index.index.file_count(), "index opened");
        index._dir = Some(dir);
        Ok(index)
    }

    /// Creates an index that lives in memory only.
    pub fn open_in_memory(config: Config, collaborators: Collaborators) -> CoreResult<Self> {
        Self::open_with_store(Box::new(MemoryStore::new()), config, collaborators)
    }

    /// Opens an index over an arbitrary byte store.
    pub fn open_with_store(
        store: Box<dyn IndexStore>,
        config: Config,
        collaborators: Collaborators,
    ) -> CoreResult<Self> {
        let files = Arc::new(FileTable::new());
        let index = PersistentIndex::open(store, Arc::clone(&files), &config)?;
        if index.needs_rebuild() {
            warn!("persistent index discarded, every data file must be reindexed");
        }
        Ok(Self {
            cache: RecordCache::new(config.cache_shards),
            config,
            files,
            index,
            tracker: FileIdentifierTracker::new(),
            stats: IndexStats::new(),
            collaborators,
            _dir: None,
        })
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine {
            index: &self.index,
            cache: &self.cache,
            tracker: &self.tracker,
            implicit: self.collaborators.implicit.as_ref(),
            stats: &self.stats,
        }
    }

    /// Returns the module owning `path` if the file is indexable.
    ///
    /// A file is indexable when it is a markup or tabular file inside a
    /// module directory.
    #[must_use]
    pub fn eligible_module(&self, path: &Path) -> Option<Module> {
        if !(is_xml(path) || is_csv(path)) {
            return None;
        }
        self.collaborators.modules.containing_module(path)
    }

    /// Indexes `content`, the current bytes of the file at `path`.
    pub fn index_file(&self, path: &Path, content: &[u8]) -> CoreResult<IndexOutcome> {
        let Some(module) = self.eligible_module(path) else {
            if self.remove_file(path)? {
                return Ok(IndexOutcome::Removed);
            }
            return Ok(IndexOutcome::Ineligible);
        };
        let file = self.files.intern(path);
        let hash: [u8; 32] = Sha256::digest(content).into();
        if self.config.skip_unchanged && self.index.file_hash(file.id()) == Some(hash) {
            self.stats.record_file_unchanged();
            return Ok(IndexOutcome::Unchanged);
        }

        let parsed = match self.collaborators.parser.parse(&file, content) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.stats.record_error();
                return Err(e);
            }
        };

        // Content the parser did not recognize is never skipped, so a later
        // parser still gets to read it.
        let stored_hash = if matches!(parsed, ParsedFile::Unrecognized) {
            UNRECOGNIZED_HASH
        } else {
            hash
        };

        let outcome = self.tracker.with_file(file.id(), |tracked| -> CoreResult<IndexOutcome> {
            let records = extract_records(&file, &parsed, &module.name, &self.cache);
            let current: HashSet<String> = records.keys().cloned().collect();
            let count = records.len();
            let records: Vec<Record> = records.into_values().collect();
            let located: Vec<Record> = records
                .iter()
                .map(|record| record.clone().with_file(file.clone()))
                .collect();
            let mut invalidated = 0;
            self.index
                .update_file(&file, stored_hash, records, &mut |previous| {
                    invalidated = self.invalidate(&file, tracked, previous, &current);
                    // A scan that read the previous state may have refilled
                    // this file's records after the write-through above.
                    for record in &located {
                        self.cache.add(record.clone());
                    }
                })?;
            *tracked = current;
            Ok(IndexOutcome::Indexed {
                records: count,
                invalidated,
            })
        });

        match &outcome {
            Ok(IndexOutcome::Indexed {
                records,
                invalidated,
            }) => {
                self.stats.record_file_indexed(*records);
                self.stats.record_invalidations(*invalidated);
                debug!(path = %path.display(), module = %module.name, records, invalidated, "file indexed");
            }
            Ok(_) => {}
            Err(e) => {
                self.stats.record_error();
                warn!(path = %path.display(), error = %e, "indexing failed");
            }
        }
        outcome
    }

    /// Reads and indexes the file at `path`.
    ///
    /// A file that no longer exists is removed from the index.
    pub fn index_path(&self, path: &Path) -> CoreResult<IndexOutcome> {
        match fs::read(path) {
            Ok(content) => self.index_file(path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.remove_file(path)? {
                    Ok(IndexOutcome::Removed)
                } else {
                    Ok(IndexOutcome::Ineligible)
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Indexes every data file below `root`.
    ///
    /// Files that fail to parse are logged and skipped. Returns the number
    /// of files whose records were (re)extracted.
    pub fn index_tree(&self, root: &Path) -> CoreResult<usize> {
        let mut indexed = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || self.eligible_module(path).is_none() {
                continue;
            }
            match self.index_path(path) {
                Ok(IndexOutcome::Indexed { .. }) => indexed += 1,
                Ok(_) => {}
                Err(e) if e.is_unavailable() => return Err(e),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping file"),
            }
        }
        info!(root = %root.display(), indexed, "tree indexed");
        Ok(indexed)
    }

    /// Drops everything `path` contributed.
    ///
    /// Returns false if the file was never indexed.
    pub fn remove_file(&self, path: &Path) -> CoreResult<bool> {
        let Some(file) = self.files.lookup(path) else {
            return Ok(false);
        };
        let removed = self.tracker.with_file(file.id(), |tracked| -> CoreResult<bool> {
            let mut invalidated = 0;
            let removed = self.index.remove_file(&file, &mut |previous| {
                invalidated = self.invalidate(&file, tracked, previous, &HashSet::new());
            })?;
            tracked.clear();
            self.stats.record_invalidations(invalidated);
            Ok(removed)
        })?;
        self.tracker.forget(file.id());
        if removed {
            self.stats.record_file_removed();
            debug!(path = %path.display(), "file removed from index");
        }
        Ok(removed)
    }

    fn invalidate(
        &self,
        file: &SourceFile,
        tracked: &HashSet<String>,
        previous: &[String],
        current: &HashSet<String>,
    ) -> usize {
        removed_ids(tracked, previous.iter().map(String::as_str), current)
            .iter()
            .filter(|id| self.cache.clear_cache(id, file.id()))
            .count()
    }

    /// Returns every identifier visible in `scope`.
    ///
    /// Index keys come first, then implicit identifiers; an identifier
    /// present in both appears twice.
    pub fn all_ids(&self, scope: &Scope) -> CoreResult<Vec<String>> {
        let mut ids = Vec::new();
        self.process_all_ids(scope, &mut |id| {
            ids.push(id.to_string());
            ControlFlow::Continue(())
        })?;
        Ok(ids)
    }

    /// Streams every identifier visible in `scope`.
    pub fn process_all_ids(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        self.engine().process_all_ids(scope, consumer)
    }

    /// Streams every record visible in `scope` until `consumer` breaks.
    ///
    /// Returns `Break` when the consumer stopped the walk.
    pub fn process_all_records(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        self.engine().process_all_records(scope, consumer)
    }

    /// Streams the records named `id` visible in `scope`.
    pub fn process_records_by_id(
        &self,
        id: &str,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        self.engine().find_records_by_id(id, scope, consumer)
    }

    /// Returns the records named `id` visible in `scope`.
    ///
    /// Declared records are located; implicit records are not. Several
    /// files declaring the same identifier all show up.
    pub fn find_records_by_id(&self, id: &str, scope: &Scope) -> CoreResult<Vec<Record>> {
        let mut records = Vec::new();
        self.process_records_by_id(id, scope, &mut |record| {
            records.push(record);
            ControlFlow::Continue(())
        })?;
        Ok(records)
    }

    /// Returns the records named `id` visible from `anchor`.
    pub fn find_records_by_id_at(&self, id: &str, anchor: &Path) -> CoreResult<Vec<Record>> {
        self.find_records_by_id(id, &self.resolve_scope(anchor))
    }

    /// Resolves the scope of a lookup made from `anchor`.
    #[must_use]
    pub fn resolve_scope(&self, anchor: &Path) -> Scope {
        self.collaborators.modules.resolve_scope(anchor)
    }

    /// Returns true if the persistent index was discarded on open.
    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.index.needs_rebuild()
    }

    /// Clears the rebuild flag after every data file was reindexed.
    pub fn finish_rebuild(&self) {
        self.index.mark_rebuilt();
    }

    /// Rewrites the log with live entries only.
    pub fn compact(&self) -> CoreResult<()> {
        self.index.compact()?;
        self.stats.record_compaction();
        Ok(())
    }

    /// Makes every update durable.
    pub fn sync(&self) -> CoreResult<()> {
        self.index.sync()
    }

    /// Makes index scans fail with `IndexUnavailable`.
    pub fn suspend(&self) {
        self.index.suspend();
    }

    /// Makes index scans possible again.
    pub fn resume(&self) {
        self.index.resume();
    }

    /// Returns the counters.
    #[must_use]
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Returns the record cache.
    #[must_use]
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// Returns the index version token.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.index.version()
    }

    /// Returns the number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.index.file_count()
    }

    /// Returns the configuration the index was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleRegistry;
    use std::path::PathBuf;

    fn index() -> ExternalIdIndex {
        let registry = ModuleRegistry::new();
        registry.register(Module::new("base", "/addons/base"));
        registry.register(Module::new("sale", "/addons/sale").with_depends(["base"]));
        ExternalIdIndex::open_in_memory(Config::default(), Collaborators::new(Arc::new(registry)))
            .unwrap()
    }

    const GROUPS: &[u8] = b"id,name\ngroup_user,User\ngroup_system,Settings\n";

    #[test]
    fn eligibility() {
        let idx = index();
        assert!(idx.eligible_module(Path::new("/addons/sale/data/x.csv")).is_some());
        assert!(idx.eligible_module(Path::new("/addons/sale/models/x.py")).is_none());
        assert!(idx.eligible_module(Path::new("/tmp/x.csv")).is_none());
        assert_eq!(
            idx.index_file(Path::new("/tmp/res.groups.csv"), GROUPS).unwrap(),
            IndexOutcome::Ineligible
        );
        assert_eq!(idx.file_count(), 0);
    }

    #[test]
    fn index_and_find() {
        let idx = index();
        let path = Path::new("/addons/base/data/res.groups.csv");
        let outcome = idx.index_file(path, GROUPS).unwrap();
        assert_eq!(
            outcome,
            IndexOutcome::Indexed {
                records: 2,
                invalidated: 0
            }
        );
        let found = idx
            .find_records_by_id_at("base.group_user", Path::new("/addons/sale/views/a.xml"))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file().unwrap().path(), path);
        assert_eq!(found[0].model(), "res.groups");
    }

    #[test]
    fn unchanged_content_is_skipped() {
        let idx = index();
        let path = Path::new("/addons/base/data/res.groups.csv");
        idx.index_file(path, GROUPS).unwrap();
        assert_eq!(idx.index_file(path, GROUPS).unwrap(), IndexOutcome::Unchanged);
        assert_eq!(idx.stats().snapshot().files_unchanged, 1);
    }

    #[test]
    fn removed_identifier_is_invalidated() {
        let idx = index();
        let path = Path::new("/addons/base/data/res.groups.csv");
        idx.index_file(path, GROUPS).unwrap();
        assert_eq!(
            idx.find_records_by_id("base.group_system", &Scope::Everything)
                .unwrap()
                .len(),
            1
        );

        let outcome = idx
            .index_file(path, b"id,name\ngroup_user,User\n")
            .unwrap();
        assert_eq!(
            outcome,
            IndexOutcome::Indexed {
                records: 1,
                invalidated: 1
            }
        );
        assert!(idx
            .find_records_by_id("base.group_system", &Scope::Everything)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn file_leaving_module_is_removed() {
        let registry = Arc::new(ModuleRegistry::new());
        registry.register(Module::new("base", "/addons/base"));
        let idx = ExternalIdIndex::open_in_memory(
            Config::default(),
            Collaborators::new(Arc::clone(&registry) as Arc<dyn ModuleGraph>),
        )
        .unwrap();
        let path = PathBuf::from("/addons/base/data/res.groups.csv");
        idx.index_file(&path, GROUPS).unwrap();
        assert_eq!(
            idx.find_records_by_id("base.group_user", &Scope::Everything)
                .unwrap()
                .len(),
            1
        );

        registry.register(Module::new("base", "/elsewhere/base"));
        assert_eq!(idx.index_file(&path, GROUPS).unwrap(), IndexOutcome::Removed);
        assert!(idx
            .find_records_by_id("base.group_user", &Scope::Everything)
            .unwrap()
            .is_empty());
        assert!(!idx.remove_file(&path).unwrap());
    }

    #[test]
    fn parse_error_is_reported() {
        let idx = index();
        let err = idx
            .index_file(Path::new("/addons/base/data/bad.csv"), b"id\n\"open\n")
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Parse { .. }));
        assert_eq!(idx.stats().snapshot().errors, 1);
    }

    struct MenuParser;

    impl SourceParser for MenuParser {
        fn parse(&self, _file: &SourceFile, content: &[u8]) -> CoreResult<ParsedFile> {
            Ok(ParsedFile::Xml(vec![crate::declaration::DomItem::Record {
                id: Some(String::from_utf8_lossy(content).trim().to_string()),
                model: Some("ir.ui.menu".to_string()),
                name: None,
                qweb: false,
            }]))
        }
    }

    #[test]
    fn unrecognized_content_is_reparsed_by_a_later_parser() {
        let registry: Arc<dyn ModuleGraph> = Arc::new({
            let registry = ModuleRegistry::new();
            registry.register(Module::new("base", "/addons/base"));
            registry
        });
        let store = MemoryStore::new();
        let path = Path::new("/addons/base/views/menu.xml");
        {
            let idx = ExternalIdIndex::open_with_store(
                Box::new(store.clone()),
                Config::default(),
                Collaborators::new(Arc::clone(&registry)),
            )
            .unwrap();
            let unrecognized = IndexOutcome::Indexed {
                records: 0,
                invalidated: 0,
            };
            assert_eq!(idx.index_file(path, b"menu_root").unwrap(), unrecognized);
            assert_eq!(idx.index_file(path, b"menu_root").unwrap(), unrecognized);
        }

        let idx = ExternalIdIndex::open_with_store(
            Box::new(store),
            Config::default(),
            Collaborators::new(registry).with_parser(Arc::new(MenuParser)),
        )
        .unwrap();
        assert_eq!(idx.file_count(), 1);
        assert_eq!(
            idx.index_file(path, b"menu_root").unwrap(),
            IndexOutcome::Indexed {
                records: 1,
                invalidated: 0
            }
        );
        let found = idx
            .find_records_by_id("base.menu_root", &Scope::Everything)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].model(), "ir.ui.menu");
        assert_eq!(idx.index_file(path, b"menu_root").unwrap(), IndexOutcome::Unchanged);
    }

    #[test]
    fn reindex_overwrites_cached_content() {
        let idx = index();
        let path = Path::new("/addons/base/data/res.groups.csv");
        idx.index_file(path, b"id,name\ngroup_user,Old\n").unwrap();
        idx.find_records_by_id("base.group_user", &Scope::Everything)
            .unwrap();
        idx.index_file(path, b"id,name\ngroup_user,New\n").unwrap();
        let found = idx
            .find_records_by_id("base.group_user", &Scope::Everything)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "New");
    }
}
