//! Record-like declarations found in data files.
//!
//! Markup files contribute [`DomItem`]s, tabular files contribute a
//! [`CsvTable`]. Both are turned into detached [`Record`]s by the extractor.

use crate::csv::CsvTable;
use crate::error::CoreResult;
use crate::record::{Record, RecordSubtype};
use crate::types::SourceFile;

/// Model of `<template>` declarations.
pub const MODEL_UI_VIEW: &str = "ir.ui.view";
/// Model of `<menuitem>` declarations.
pub const MODEL_UI_MENU: &str = "ir.ui.menu";
/// Model of `<act_window>` declarations.
pub const MODEL_ACT_WINDOW: &str = "ir.actions.act_window";
/// Model of `<report>` declarations.
pub const MODEL_REPORT: &str = "ir.actions.report";

/// One element of a markup data file.
///
/// Attribute values are kept raw; qualification and trimming happen in
/// [`DomItem::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomItem {
    /// `<record id=".." model="..">`.
    Record {
        /// The `id` attribute.
        id: Option<String>,
        /// The `model` attribute.
        model: Option<String>,
        /// A display name taken from the record's `name` field.
        name: Option<String>,
        /// Whether the record defines a QWeb view.
        qweb: bool,
    },
    /// `<template id="..">`.
    Template {
        /// The `id` attribute.
        id: Option<String>,
        /// The `name` attribute.
        name: Option<String>,
    },
    /// `<menuitem id="..">`.
    MenuItem {
        /// The `id` attribute.
        id: Option<String>,
        /// The `name` attribute.
        name: Option<String>,
    },
    /// `<act_window id="..">`.
    ActWindow {
        /// The `id` attribute.
        id: Option<String>,
        /// The `name` attribute.
        name: Option<String>,
    },
    /// `<report id="..">`.
    Report {
        /// The `id` attribute.
        id: Option<String>,
        /// The `name` attribute.
        name: Option<String>,
    },
    /// `<function model=".." name="..">`, which calls a method and declares nothing.
    Function {
        /// The `model` attribute.
        model: Option<String>,
        /// The `name` attribute.
        name: Option<String>,
    },
}

impl DomItem {
    /// Returns the record this item declares inside `module`, if any.
    ///
    /// Items without a non-blank identifier declare nothing.
    #[must_use]
    pub fn record(&self, module: &str) -> Option<Record> {
        let (id, name, model, subtype) = match self {
            Self::Record {
                id,
                model,
                name,
                qweb,
            } => {
                let model = model.as_deref().map(str::trim).filter(|m| !m.is_empty())?;
                let subtype = qweb.then_some(RecordSubtype::Qweb);
                (id, name, model, subtype)
            }
            Self::Template { id, name } => (id, name, MODEL_UI_VIEW, Some(RecordSubtype::Qweb)),
            Self::MenuItem { id, name } => (id, name, MODEL_UI_MENU, None),
            Self::ActWindow { id, name } => (id, name, MODEL_ACT_WINDOW, None),
            Self::Report { id, name } => (id, name, MODEL_REPORT, None),
            Self::Function { .. } => return None,
        };
        let id = qualify(id.as_deref()?, module)?;
        let name = name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| id.clone(), str::to_string);
        Some(Record::new(id, name, model, module).with_subtype(subtype))
    }
}

/// Trims `id` and prefixes it with `module.` when it has no module part.
///
/// Returns `None` for blank identifiers.
#[must_use]
pub fn qualify(id: &str, module: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
        None
    } else if id.contains('.') {
        Some(id.to_string())
    } else {
        Some(format!("{module}.{id}"))
    }
}

/// The parsed content of one data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFile {
    /// A markup file's record-like elements, in document order.
    Xml(Vec<DomItem>),
    /// A tabular file.
    Csv(CsvTable),
    /// Content the parser does not understand; it declares nothing.
    Unrecognized,
}

/// Turns file content into declarations.
pub trait SourceParser: Send + Sync {
    /// Parses `content`, the current bytes of `file`.
    fn parse(&self, file: &SourceFile, content: &[u8]) -> CoreResult<ParsedFile>;
}

/// Parser for tabular files only; markup files come back unrecognized.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularParser;

impl SourceParser for TabularParser {
    fn parse(&self, file: &SourceFile, content: &[u8]) -> CoreResult<ParsedFile> {
        if !crate::csv::is_csv(file.path()) {
            return Ok(ParsedFile::Unrecognized);
        }
        CsvTable::parse(file.path(), content).map(ParsedFile::Csv)
    }
}
