//! Output sandbox: every write target is checked lexically against the root.

use std::path::{Path, PathBuf};

use super::AdapterError;
use crate::utils::path::lexical_normalize;

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = lexical_normalize(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-relative path.
    pub fn resolve(&self, rel: impl AsRef<Path>) -> Result<PathBuf, AdapterError> {
        self.scoped(Path::new(""), rel.as_ref())
    }

    /// Resolve `rel` inside `scope` (itself root-relative).
    ///
    /// `rel` may not climb above `scope`, and absolute paths are rejected.
    pub fn scoped(&self, scope: &Path, rel: &Path) -> Result<PathBuf, AdapterError> {
        let escape = || AdapterError::PathEscape {
            path: self.root.join(scope).join(rel),
            root: self.root.clone(),
        };
        if rel.is_absolute() || scope.is_absolute() {
            return Err(escape());
        }
        let scope = lexical_normalize(scope).ok_or_else(escape)?;
        let rel = lexical_normalize(rel).ok_or_else(escape)?;

        let resolved = self.root.join(scope).join(rel);
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(escape())
        }
    }
}
