//! The record value model.
//!
//! A [`Record`] describes one declaration: its external identifier, display
//! name, the model it is a row of, the module that owns it and an optional
//! fine-grained subtype. A record may carry the [`SourceFile`] it came from
//! (a *located* record) or not (a *detached* record). Attaching or detaching
//! the file never changes identity: equality and hashing ignore it.
//!
//! ## Value layout
//!
//! The persistent index stores the detached form without its identifier
//! (the identifier is the index key):
//!
//! ```text
//! | name (text) | model (text) | module (text) | subtype (u8, 0 = none) |
//! ```

use crate::types::SourceFile;
use extid_codec::{CodecError, CodecResult, DataReader, DataWriter};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Fine-grained kind of a record, stored as one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordSubtype {
    /// A QWeb template view.
    Qweb = 1,
}

impl RecordSubtype {
    /// Converts a stored byte, where 0 means "no subtype".
    pub fn from_byte(b: u8) -> CodecResult<Option<Self>> {
        match b {
            0 => Ok(None),
            1 => Ok(Some(Self::Qweb)),
            other => Err(CodecError::invalid_tag("record subtype", other)),
        }
    }

    /// Returns the stored byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One declarative record.
#[derive(Clone)]
pub struct Record {
    id: String,
    name: String,
    model: String,
    module: String,
    subtype: Option<RecordSubtype>,
    file: Option<SourceFile>,
}

impl Record {
    /// Creates a detached record without a subtype.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        model: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model: model.into(),
            module: module.into(),
            subtype: None,
            file: None,
        }
    }

    /// Sets the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: Option<RecordSubtype>) -> Self {
        self.subtype = subtype;
        self
    }

    /// Returns the located form of this record.
    #[must_use]
    pub fn with_file(mut self, file: SourceFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Returns the detached form of this record.
    #[must_use]
    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    /// The external identifier, usually `module.local_name`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model this record is a row of.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The owning module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The subtype, if any.
    pub fn subtype(&self) -> Option<RecordSubtype> {
        self.subtype
    }

    /// The file this record was declared in, for located records.
    pub fn file(&self) -> Option<&SourceFile> {
        self.file.as_ref()
    }

    /// Returns true if a source file is attached.
    pub fn is_located(&self) -> bool {
        self.file.is_some()
    }

    /// Writes the value layout (everything but the identifier and file).
    pub fn write_value(&self, out: &mut DataWriter) -> CodecResult<()> {
        out.write_text(&self.name)?;
        out.write_text(&self.model)?;
        out.write_text(&self.module)?;
        out.write_u8(self.subtype.map_or(0, RecordSubtype::as_byte));
        Ok(())
    }

    /// Reads a detached record whose value layout starts at `input`.
    pub fn read_value(id: impl Into<String>, input: &mut DataReader<'_>) -> CodecResult<Self> {
        let name = input.read_text()?;
        let model = input.read_text()?;
        let module = input.read_text()?;
        let subtype = RecordSubtype::from_byte(input.read_u8()?)?;
        Ok(Self::new(id, name, model, module).with_subtype(subtype))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.model == other.model
            && self.module == other.module
            && self.subtype == other.subtype
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
        self.model.hash(state);
        self.module.hash(state);
        self.subtype.hash(state);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("module", &self.module)
            .field("subtype", &self.subtype)
            .field("file", &self.file)
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.id, self.model)
    }
}
