//! # extid core
//!
//! Index of external identifiers (`module.local_name`) declared in the data
//! files of a modular project.
//!
//! This crate provides:
//! - A persistent identifier index, rebuilt incrementally per file
//! - A write-through record cache with per-file invalidation
//! - Scope resolution from a lookup anchor to module + dependencies
//! - Fusion of declared records with implicit records from a model catalog
//!
//! ## Example
//!
//! ```rust
//! use extid_core::{Collaborators, Config, ExternalIdIndex, Module, ModuleRegistry, Scope};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let modules = ModuleRegistry::new();
//! modules.register(Module::new("base", "/addons/base"));
//!
//! let index = ExternalIdIndex::open_in_memory(
//!     Config::default(),
//!     Collaborators::new(Arc::new(modules)),
//! )
//! .unwrap();
//! index
//!     .index_file(
//!         Path::new("/addons/base/data/res.groups.csv"),
//!         b"id,name\ngroup_user,User\n",
//!     )
//!     .unwrap();
//!
//! let found = index.find_records_by_id("base.group_user", &Scope::Everything).unwrap();
//! assert_eq!(found[0].model(), "res.groups");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod csv;
mod declaration;
mod dir;
mod error;
mod extract;
mod implicit;
pub mod index;
mod module;
mod query;
mod record;
mod scope;
mod service;
mod stats;
mod tracker;
mod types;

pub use cache::RecordCache;
pub use config::Config;
pub use csv::{is_csv, is_xml, CsvTable};
pub use declaration::{
    qualify, DomItem, ParsedFile, SourceParser, TabularParser, MODEL_ACT_WINDOW, MODEL_REPORT,
    MODEL_UI_MENU, MODEL_UI_VIEW,
};
pub use dir::IndexDir;
pub use error::{CoreError, CoreResult};
pub use extract::extract_records;
pub use implicit::{
    ImplicitRecordSource, ModelCatalog, ModelDefinition, NoImplicitRecords, MODEL_IR_MODEL,
};
pub use index::{PersistentIndex, INDEX_VERSION};
pub use module::{load_module, parse_depends, Module, ModuleGraph, ModuleRegistry, MANIFEST_FILES};
pub use record::{Record, RecordSubtype};
pub use scope::Scope;
pub use service::{Collaborators, ExternalIdIndex, IndexOutcome};
pub use stats::{IndexStats, StatsSnapshot};
pub use tracker::{removed_ids, FileIdentifierTracker};
pub use types::{FileId, FileTable, SourceFile};
