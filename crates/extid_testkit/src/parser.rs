//! A small markup parser for data files.
//!
//! Understands the start tags that declare records (`<record>`,
//! `<template>`, `<menuitem>`, `<act_window>`, `<report>`, `<function>`)
//! and the `name` and `type` fields of a `<record>`. Everything else is
//! skipped. It is not a general XML parser.

use extid_core::{
    is_csv, is_xml, CoreError, CoreResult, DomItem, ParsedFile, SourceFile, SourceParser,
    TabularParser,
};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Parses markup data files and delegates tabular files to [`TabularParser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupParser;

impl SourceParser for MarkupParser {
    fn parse(&self, file: &SourceFile, content: &[u8]) -> CoreResult<ParsedFile> {
        if is_csv(file.path()) {
            return TabularParser.parse(file, content);
        }
        if !is_xml(file.path()) {
            return Ok(ParsedFile::Unrecognized);
        }
        let text = std::str::from_utf8(content)
            .map_err(|e| CoreError::parse(file.path(), format!("invalid UTF-8: {e}")))?;
        parse_items(file.path(), text).map(ParsedFile::Xml)
    }
}

/// Comments, processing instructions and doctypes, or an element tag
/// with its name, attributes and closing slashes.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<[?!].*?>|<(/?)([\w.:-]+)((?:\s+[\w.:-]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#,
    )
    .expect("markup pattern")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w.:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern")
});

#[derive(Default)]
struct PendingRecord {
    id: Option<String>,
    model: Option<String>,
    name: Option<String>,
    qweb: bool,
}

impl PendingRecord {
    fn finish(self) -> DomItem {
        DomItem::Record {
            id: self.id,
            model: self.model,
            name: self.name,
            qweb: self.qweb,
        }
    }
}

fn attr(attrs: &str, key: &str) -> Option<String> {
    ATTR.captures_iter(attrs)
        .find(|c| &c[1] == key)
        .and_then(|c| c.get(2).or_else(|| c.get(3)))
        .map(|v| unescape(v.as_str()))
}

/// Parses the record-like items of a markup document, in document order.
pub fn parse_items(path: &Path, text: &str) -> CoreResult<Vec<DomItem>> {
    let mut items = Vec::new();
    let mut record: Option<PendingRecord> = None;
    let mut pos = 0;

    for tag in MARKUP.captures_iter(text) {
        let whole = tag.get(0).map_or(pos..pos, |m| m.range());
        if let Some(at) = text[pos..whole.start].find('<') {
            return Err(CoreError::parse(path, format!("malformed tag at byte {}", pos + at)));
        }
        pos = whole.end;
        let Some(name) = tag.get(2).map(|m| m.as_str()) else {
            continue;
        };
        let attrs = tag.get(3).map_or("", |m| m.as_str());
        let self_closing = !tag[4].is_empty();

        if !tag[1].is_empty() {
            if name == "record" {
                items.extend(record.take().map(PendingRecord::finish));
            }
            continue;
        }

        match name {
            "record" => {
                items.extend(record.take().map(PendingRecord::finish));
                let pending = PendingRecord {
                    id: attr(attrs, "id"),
                    model: attr(attrs, "model"),
                    ..PendingRecord::default()
                };
                if self_closing {
                    items.push(pending.finish());
                } else {
                    record = Some(pending);
                }
            }
            "field" if !self_closing => {
                let Some(pending) = record.as_mut() else {
                    continue;
                };
                let value = field_text(text, pos);
                match attr(attrs, "name").as_deref() {
                    Some("name") => pending.name = Some(value),
                    Some("type") => pending.qweb = value == "qweb",
                    _ => {}
                }
            }
            "template" => items.push(DomItem::Template {
                id: attr(attrs, "id"),
                name: attr(attrs, "name"),
            }),
            "menuitem" => items.push(DomItem::MenuItem {
                id: attr(attrs, "id"),
                name: attr(attrs, "name"),
            }),
            "act_window" => items.push(DomItem::ActWindow {
                id: attr(attrs, "id"),
                name: attr(attrs, "name"),
            }),
            "report" => items.push(DomItem::Report {
                id: attr(attrs, "id"),
                name: attr(attrs, "name").or_else(|| attr(attrs, "string")),
            }),
            "function" => items.push(DomItem::Function {
                model: attr(attrs, "model"),
                name: attr(attrs, "name"),
            }),
            _ => {}
        }
    }
    if let Some(at) = text[pos..].find('<') {
        return Err(CoreError::parse(path, format!("malformed tag at byte {}", pos + at)));
    }
    items.extend(record.take().map(PendingRecord::finish));
    Ok(items)
}

fn field_text(text: &str, from: usize) -> String {
    let end = text[from..].find('<').map_or(text.len(), |i| from + i);
    unescape(text[from..end].trim())
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
