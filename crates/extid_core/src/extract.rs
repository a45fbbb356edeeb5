//! Record extraction.

use crate::cache::RecordCache;
use crate::declaration::ParsedFile;
use crate::record::Record;
use crate::types::SourceFile;
use std::collections::BTreeMap;

/// Extracts every record `parsed` declares inside `module`.
///
/// Returns identifier → detached record; when one file declares an
/// identifier twice the later declaration wins. Each record is also pushed
/// into `cache` in located form before this returns.
pub fn extract_records(
    file: &SourceFile,
    parsed: &ParsedFile,
    module: &str,
    cache: &RecordCache,
) -> BTreeMap<String, Record> {
    let records: Vec<Record> = match parsed {
        ParsedFile::Xml(items) => items.iter().filter_map(|i| i.record(module)).collect(),
        ParsedFile::Csv(table) => table.records(module),
        ParsedFile::Unrecognized => Vec::new(),
    };

    let mut out = BTreeMap::new();
    for record in records {
        cache.add(record.clone().with_file(file.clone()));
        out.insert(record.id().to_string(), record);
    }
    out
}
