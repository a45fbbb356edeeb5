//! Test projects and index helpers.
//!
//! A [`TestProject`] is a temporary addons directory with real manifests
//! and data files, plus the collaborators an index needs.

use crate::parser::MarkupParser;
use extid_core::{
    Collaborators, Config, ExternalIdIndex, ModelCatalog, Module, ModuleRegistry, Record,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary project with an addons directory and an index directory.
pub struct TestProject {
    temp: TempDir,
    /// Registered modules.
    pub registry: Arc<ModuleRegistry>,
    /// Model definitions producing implicit records.
    pub catalog: Arc<ModelCatalog>,
}

impl TestProject {
    /// Creates an empty project.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir_all(temp.path().join("addons")).expect("Failed to create addons dir");
        Self {
            temp,
            registry: Arc::new(ModuleRegistry::new()),
            catalog: Arc::new(ModelCatalog::new()),
        }
    }

    /// Returns the project root.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Returns the addons directory.
    pub fn addons(&self) -> PathBuf {
        self.root().join("addons")
    }

    /// Returns the directory used by [`open_persistent`](Self::open_persistent).
    pub fn index_dir(&self) -> PathBuf {
        self.root().join("index")
    }

    /// Returns the root of `module`.
    pub fn module_root(&self, module: &str) -> PathBuf {
        self.addons().join(module)
    }

    /// Returns the path of `rel` inside `module`.
    pub fn path(&self, module: &str, rel: &str) -> PathBuf {
        self.module_root(module).join(rel)
    }

    /// Creates `module` with a manifest and registers it.
    pub fn add_module(&self, name: &str, depends: &[&str]) -> PathBuf {
        let root = self.module_root(name);
        fs::create_dir_all(&root).expect("Failed to create module dir");
        let deps: Vec<String> = depends.iter().map(|d| format!("'{d}'")).collect();
        let manifest = format!(
            "# -*- coding: utf-8 -*-\n{{\n    'name': '{name}',\n    'depends': [{}],\n}}\n",
            deps.join(", ")
        );
        fs::write(root.join("__manifest__.py"), manifest).expect("Failed to write manifest");
        self.registry
            .register(Module::new(name, &root).with_depends(depends.iter().copied()));
        root
    }

    /// Writes a file inside `module` and returns its path.
    pub fn write(&self, module: &str, rel: &str, content: &str) -> PathBuf {
        let path = self.path(module, rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create data dir");
        }
        fs::write(&path, content).expect("Failed to write data file");
        path
    }

    /// Deletes a file inside `module` and returns its path.
    pub fn delete(&self, module: &str, rel: &str) -> PathBuf {
        let path = self.path(module, rel);
        fs::remove_file(&path).expect("Failed to delete data file");
        path
    }

    /// Returns collaborators using this project's modules and catalog.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(Arc::clone(&self.registry) as _)
            .with_parser(Arc::new(MarkupParser))
            .with_implicit(Arc::clone(&self.catalog) as _)
    }

    /// Opens an in-memory index with the default configuration.
    pub fn open_in_memory(&self) -> ExternalIdIndex {
        self.open_in_memory_with(Config::default())
    }

    /// Opens an in-memory index.
    pub fn open_in_memory_with(&self, config: Config) -> ExternalIdIndex {
        ExternalIdIndex::open_in_memory(config, self.collaborators())
            .expect("Failed to open in-memory index")
    }

    /// Opens the on-disk index in [`index_dir`](Self::index_dir).
    pub fn open_persistent(&self) -> ExternalIdIndex {
        ExternalIdIndex::open(&self.index_dir(), Config::default(), self.collaborators())
            .expect("Failed to open index")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders an Odoo data document holding `body`.
pub fn odoo_xml(body: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<odoo>\n{body}\n</odoo>\n")
}

/// Renders a `<record>` element with a `name` field.
pub fn record_xml(id: &str, model: &str, name: &str) -> String {
    format!(
        "    <record id=\"{id}\" model=\"{model}\">\n        <field name=\"name\">{name}</field>\n    </record>"
    )
}

/// Returns the identifiers of `records`, in order.
pub fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

/// Returns the file paths of located `records`, in order.
pub fn paths(records: &[Record]) -> Vec<PathBuf> {
    records
        .iter()
        .filter_map(|r| r.file().map(|f| f.path().to_path_buf()))
        .collect()
}
