//! Visibility scopes.

use crate::types::SourceFile;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A file-visibility predicate.
///
/// A bounded scope is a set of directory roots; a file is visible when one
/// of the roots is a prefix of its path. Cloning is cheap.
#[derive(Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every file is visible.
    Everything,
    /// Only files under one of these roots are visible.
    Roots(Arc<[PathBuf]>),
}

impl Scope {
    /// Creates a bounded scope from directory roots.
    pub fn roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        roots.sort();
        roots.dedup();
        Self::Roots(roots.into())
    }

    /// Returns true if `file` is visible.
    #[must_use]
    pub fn contains(&self, file: &SourceFile) -> bool {
        self.contains_path(file.path())
    }

    /// Returns true if `path` is visible.
    #[must_use]
    pub fn contains_path(&self, path: &Path) -> bool {
        match self {
            Self::Everything => true,
            Self::Roots(roots) => roots.iter().any(|root| path.starts_with(root)),
        }
    }

    /// Returns true for the unbounded scope.
    #[must_use]
    pub fn is_everything(&self) -> bool {
        matches!(self, Self::Everything)
    }

    /// Returns the roots of a bounded scope.
    #[must_use]
    pub fn root_paths(&self) -> Option<&[PathBuf]> {
        match self {
            Self::Everything => None,
            Self::Roots(roots) => Some(roots),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everything => f.write_str("Everything"),
            Self::Roots(roots) => f.debug_list().entries(roots.iter()).finish(),
        }
    }
}
