//! Tabular data files.
//!
//! A data CSV names its model through the file stem
//! (`ir.model.access.csv` holds `ir.model.access` rows) and carries the
//! record identifiers in its `id` column.

use crate::declaration::qualify;
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use std::path::Path;

/// Returns true for files with a `.csv` extension.
#[must_use]
pub fn is_csv(path: &Path) -> bool {
    has_extension(path, "csv")
}

/// Returns true for files with an `.xml` extension.
#[must_use]
pub fn is_xml(path: &Path) -> bool {
    has_extension(path, "xml")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// A parsed CSV data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    model: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Creates a table from already split rows.
    pub fn new(model: impl Into<String>, header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            model: model.into(),
            header,
            rows,
        }
    }

    /// Parses `content` as the data file at `path`.
    ///
    /// # Errors
    ///
    /// Fails on invalid UTF-8 or an unterminated quoted field.
    pub fn parse(path: &Path, content: &[u8]) -> CoreResult<Self> {
        let text = std::str::from_utf8(content)
            .map_err(|e| CoreError::parse(path, format!("invalid UTF-8: {e}")))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = split_rows(text).map_err(|message| CoreError::parse(path, message))?;
        let model = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if rows.is_empty() {
            return Ok(Self::new(model, Vec::new(), Vec::new()));
        }
        let header = rows.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        Ok(Self::new(model, header, rows))
    }

    /// The model named by the file stem.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Column names.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows, header excluded.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Returns the record declared by every row with a non-blank id.
    ///
    /// A table without an `id` column declares nothing.
    #[must_use]
    pub fn records(&self, module: &str) -> Vec<Record> {
        let Some(id_col) = self.column("id") else {
            return Vec::new();
        };
        let name_col = self.column("name");
        self.rows
            .iter()
            .filter_map(|row| {
                let id = qualify(row.get(id_col)?, module)?;
                let name = name_col
                    .and_then(|c| row.get(c))
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map_or_else(|| id.clone(), str::to_string);
                Some(Record::new(id, name, self.model.as_str(), module))
            })
            .collect()
    }
}

/// Splits CSV text into rows of fields, honouring `"` quoting.
fn split_rows(text: &str) -> Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                line += 1;
                row.push(std::mem::take(&mut field));
                push_row(&mut rows, std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err(format!("unterminated quoted field at line {line}"));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row);
    }
    Ok(rows)
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, text: &str) -> CsvTable {
        CsvTable::parse(Path::new(name), text.as_bytes()).unwrap()
    }

    #[test]
    fn model_from_file_stem() {
        let table = parse(
            "/addons/sale/security/ir.model.access.csv",
            "id,name,model_id:id\naccess_sale_order,sale.order,model_sale_order\n",
        );
        assert_eq!(table.model(), "ir.model.access");
        let records = table.records("sale");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "sale.access_sale_order");
        assert_eq!(records[0].name(), "sale.order");
        assert_eq!(records[0].model(), "ir.model.access");
    }

    #[test]
    fn quoted_fields() {
        let table = parse(
            "res.partner.csv",
            "\"id\",\"name\"\r\n\"p1\",\"Doe, \"\"John\"\"\"\r\np2,\"multi\nline\"\r\n",
        );
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0][1], "Doe, \"John\"");
        assert_eq!(table.rows()[1][1], "multi\nline");
    }

    #[test]
    fn blank_ids_and_missing_names() {
        let table = parse(
            "res.groups.csv",
            "name,id\nManager,group_manager\nNobody,  \n,base.group_user\n\n",
        );
        let records = table.records("base");
        let ids: Vec<_> = records.iter().map(Record::id).collect();
        assert_eq!(ids, ["base.group_manager", "base.group_user"]);
        assert_eq!(records[1].name(), "base.group_user");
    }

    #[test]
    fn table_without_id_column() {
        let table = parse("res.users.csv", "login,name\nadmin,Admin\n");
        assert!(table.records("base").is_empty());
    }

    #[test]
    fn empty_file() {
        let table = parse("res.users.csv", "");
        assert!(table.header().is_empty());
        assert!(table.records("base").is_empty());
    }

    #[test]
    fn unterminated_quote_is_a_parse_error() {
        let err = CsvTable::parse(Path::new("a.csv"), b"id\n\"open\n").unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn extensions() {
        assert!(is_csv(Path::new("/m/data/a.CSV")));
        assert!(is_xml(Path::new("/m/views/a.xml")));
        assert!(!is_xml(Path::new("/m/models/a.py")));
    }
}
