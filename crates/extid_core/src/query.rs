//! Lookups fusing the persistent index, the record cache and implicit
//! records.

use crate::cache::RecordCache;
use crate::error::{CoreError, CoreResult};
use crate::implicit::ImplicitRecordSource;
use crate::index::PersistentIndex;
use crate::record::Record;
use crate::scope::Scope;
use crate::stats::IndexStats;
use crate::tracker::FileIdentifierTracker;
use crate::types::FileId;
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Borrowed view over the components a lookup needs.
pub(crate) struct QueryEngine<'a> {
    pub(crate) index: &'a PersistentIndex,
    pub(crate) cache: &'a RecordCache,
    pub(crate) tracker: &'a FileIdentifierTracker,
    pub(crate) implicit: &'a dyn ImplicitRecordSource,
    pub(crate) stats: &'a IndexStats,
}

impl QueryEngine<'_> {
    /// Streams every identifier visible in `scope`: index keys first, then
    /// implicit identifiers.
    pub(crate) fn process_all_ids(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        if self.index.process_all_keys(scope, consumer)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        Ok(self.implicit.process(scope, &mut |record| consumer(record.id())))
    }

    /// Streams every record visible in `scope`.
    pub(crate) fn process_all_records(
        &self,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        let mut failure: Option<CoreError> = None;
        let flow = self.index.process_all_keys(scope, &mut |key| {
            match self.declared_records(key, scope, consumer) {
                Ok(flow) => flow,
                Err(e) => {
                    failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        })?;
        if let Some(e) = failure {
            return Err(e);
        }
        if flow.is_break() {
            return Ok(flow);
        }
        Ok(self.implicit.process(scope, &mut |record| {
            self.stats.record_implicit();
            consumer(record)
        }))
    }

    /// Streams the records named `id` visible in `scope`.
    pub(crate) fn find_records_by_id(
        &self,
        id: &str,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        if self.declared_records(id, scope, consumer)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        Ok(self.implicit.process(scope, &mut |record| {
            if record.id() != id {
                return ControlFlow::Continue(());
            }
            self.stats.record_implicit();
            consumer(record)
        }))
    }

    /// Records declared in data files, from the cache when it knows `id`,
    /// otherwise from an unbounded scan that refills the cache.
    fn declared_records(
        &self,
        id: &str,
        scope: &Scope,
        consumer: &mut dyn FnMut(Record) -> ControlFlow<()>,
    ) -> CoreResult<ControlFlow<()>> {
        if id.trim().is_empty() {
            return Ok(ControlFlow::Continue(()));
        }
        if let Some(flow) = self.cache.process_records(id, scope, consumer) {
            self.stats.record_cache_hit();
            return Ok(flow);
        }
        self.stats.record_cache_miss();
        self.stats.record_index_scan();

        let mut discovered: Vec<FileId> = Vec::new();
        let mut visible: Vec<Record> = Vec::new();
        let scanned = self
            .index
            .process_values(id, &Scope::Everything, &mut |file, record| {
                let located = record.clone().with_file(file.clone());
                self.cache.add(located.clone());
                discovered.push(file.id());
                if scope.contains(file) {
                    visible.push(located);
                }
                ControlFlow::Continue(())
            });
        if let Err(e) = scanned {
            self.stats.record_error();
            debug!(id, error = %e, "index scan interrupted");
            return Err(e);
        }

        for file in &discovered {
            self.tracker.note(*file, id);
        }
        self.cache.mark_exhaustive(id);
        trace!(id, files = discovered.len(), visible = visible.len(), "cache refilled");

        for record in visible {
            if consumer(record).is_break() {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
