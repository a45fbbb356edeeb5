//! Modules, their dependency graph and scope resolution.
//!
//! A module is a directory holding a `__manifest__.py` (or the legacy
//! `__openerp__.py`). The manifest is a Python dict literal; only its
//! `'depends'` list is read here.

use crate::error::CoreResult;
use crate::scope::Scope;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Manifest file names, in lookup order.
pub const MANIFEST_FILES: [&str; 2] = ["__manifest__.py", "__openerp__.py"];

/// One module of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Technical name (the directory name).
    pub name: String,
    /// Module root directory.
    pub root: PathBuf,
    /// Names of the modules this one depends on.
    pub depends: Vec<String>,
}

impl Module {
    /// Creates a module description.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            depends: Vec::new(),
        }
    }

    /// Sets the dependencies.
    #[must_use]
    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }
}

/// The module dependency graph, as seen by the index.
pub trait ModuleGraph: Send + Sync {
    /// Returns the module whose directory contains `path`.
    fn containing_module(&self, path: &Path) -> Option<Module>;

    /// Returns the scope of `module` plus its transitive dependencies.
    fn module_scope(&self, module: &str) -> Scope;

    /// Returns the scope used when a lookup has no module context.
    fn project_scope(&self) -> Scope;

    /// Resolves the scope for a lookup anchored at `anchor`.
    ///
    /// Falls back to [`ModuleGraph::project_scope`] outside every module.
    fn resolve_scope(&self, anchor: &Path) -> Scope {
        match self.containing_module(anchor) {
            Some(module) => self.module_scope(&module.name),
            None => self.project_scope(),
        }
    }
}

/// A [`ModuleGraph`] built from manifests on disk or registered by hand.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    modules: BTreeMap<String, Module>,
    project_roots: Vec<PathBuf>,
    project_depends: Vec<String>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers every module one level below each addons path.
    ///
    /// Missing addons paths are skipped. When two paths provide a module of
    /// the same name, the first one wins.
    pub fn discover<I, P>(addons_paths: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let registry = Self::new();
        for addons in addons_paths {
            registry.discover_in(addons.as_ref())?;
        }
        Ok(registry)
    }

    /// Scans one addons path and registers the modules it contains.
    ///
    /// Returns the number of newly registered modules.
    pub fn discover_in(&self, addons: &Path) -> CoreResult<usize> {
        if !addons.is_dir() {
            warn!(path = %addons.display(), "addons path is not a directory");
            return Ok(0);
        }
        let mut added = 0;
        for entry in WalkDir::new(addons)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(module) = load_module(entry.path())? else {
                continue;
            };
            let mut inner = self.inner.write();
            if inner.modules.contains_key(&module.name) {
                debug!(module = %module.name, path = %entry.path().display(), "shadowed module skipped");
                continue;
            }
            debug!(module = %module.name, depends = ?module.depends, "module discovered");
            inner.modules.insert(module.name.clone(), module);
            added += 1;
        }
        Ok(added)
    }

    /// Registers a module, replacing any module with the same name.
    pub fn register(&self, module: Module) {
        self.inner.write().modules.insert(module.name.clone(), module);
    }

    /// Sets the project roots and the modules the project depends on.
    ///
    /// With no dependencies configured the project scope covers every
    /// registered module.
    pub fn set_project<R, D, P, S>(&self, roots: R, depends: D)
    where
        R: IntoIterator<Item = P>,
        P: Into<PathBuf>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.write();
        inner.project_roots = roots.into_iter().map(Into::into).collect();
        inner.project_depends = depends.into_iter().map(Into::into).collect();
    }

    /// Returns a registered module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<Module> {
        self.inner.read().modules.get(name).cloned()
    }

    /// Returns all registered modules ordered by name.
    #[must_use]
    pub fn modules(&self) -> Vec<Module> {
        self.inner.read().modules.values().cloned().collect()
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().modules.len()
    }

    /// Returns true if no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegistryInner {
    /// Roots of `start` and everything it depends on, transitively.
    fn closure_roots<'a>(&self, start: impl IntoIterator<Item = &'a str>) -> Vec<PathBuf> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = start.into_iter().collect();
        let mut roots = Vec::new();
        while let Some(name) = queue.pop_front() {
            if !seen.insert(name) {
                continue;
            }
            let Some(module) = self.modules.get(name) else {
                continue;
            };
            roots.push(module.root.clone());
            queue.extend(module.depends.iter().map(String::as_str));
        }
        roots
    }
}

impl ModuleGraph for ModuleRegistry {
    fn containing_module(&self, path: &Path) -> Option<Module> {
        let inner = self.inner.read();
        inner
            .modules
            .values()
            .filter(|m| path.starts_with(&m.root))
            .max_by_key(|m| m.root.components().count())
            .cloned()
    }

    fn module_scope(&self, module: &str) -> Scope {
        Scope::roots(self.inner.read().closure_roots([module]))
    }

    fn project_scope(&self) -> Scope {
        let inner = self.inner.read();
        let mut roots = inner.project_roots.clone();
        if inner.project_depends.is_empty() {
            roots.extend(inner.modules.values().map(|m| m.root.clone()));
        } else {
            roots.extend(
                inner.closure_roots(inner.project_depends.iter().map(String::as_str)),
            );
        }
        Scope::roots(roots)
    }
}

/// Reads the module rooted at `dir`, if it has a manifest.
pub fn load_module(dir: &Path) -> CoreResult<Option<Module>> {
    let Some(manifest) = MANIFEST_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
    else {
        return Ok(None);
    };
    let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    let text = fs::read_to_string(&manifest)?;
    Ok(Some(Module::new(name, dir).with_depends(parse_depends(&text))))
}

/// Python string literals and comments, in source order.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)'''.*?'''|""".*?"""|'(?:[^'\\\n]|\\.)*'|"(?:[^"\\\n]|\\.)*"|#[^\n]*"#)
        .expect("manifest token pattern")
});

static LIST_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:\s*[\[(]").expect("list open pattern"));

/// Extracts the `'depends'` list from manifest source text.
///
/// Comments are ignored; a manifest without the key depends on nothing.
#[must_use]
pub fn parse_depends(manifest: &str) -> Vec<String> {
    let mut tokens = TOKEN.find_iter(manifest);
    let Some(mut end) = tokens.by_ref().find_map(|token| {
        (string_value(token.as_str()) == Some("depends"))
            .then(|| LIST_OPEN.find(&manifest[token.end()..]))
            .flatten()
            .map(|open| token.end() + open.end())
    }) else {
        return Vec::new();
    };

    let mut depends = Vec::new();
    for token in tokens {
        if manifest[end..token.start()].contains([']', ')']) {
            break;
        }
        end = token.end();
        if let Some(name) = string_value(token.as_str()).filter(|n| !n.is_empty()) {
            depends.push(name.to_string());
        }
    }
    depends
}

/// The trimmed text of a single-line string literal token.
fn string_value(token: &str) -> Option<&str> {
    if token.starts_with("'''") || token.starts_with("\"\"\"") {
        return None;
    }
    let quote = token.chars().next().filter(|c| matches!(c, '\'' | '"'))?;
    token
        .strip_prefix(quote)
        .and_then(|t| t.strip_suffix(quote))
        .map(str::trim)
}
