//! Conflict detection over the full page set.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ingest::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Same file name (case-insensitive) in more than one directory.
    DuplicateBasename,
    /// Page with no markup after normalization.
    EmptyFile,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DuplicateBasename => "duplicate-basename",
            Self::EmptyFile => "empty-file",
        })
    }
}

/// A conflict and every page it affects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub kind: ConflictKind,
    pub paths: Vec<String>,
}

/// Single pass over all pages with a basename -> paths map.
///
/// Output is sorted, so it only depends on the page set.
pub fn detect(pages: &[Page]) -> Vec<ConflictRecord> {
    let mut by_basename: FxHashMap<String, Vec<&str>> = FxHashMap::default();
    let mut conflicts = Vec::new();

    for page in pages {
        let basename = page.path.rsplit('/').next().unwrap_or(&page.path);
        by_basename
            .entry(basename.to_lowercase())
            .or_default()
            .push(&page.path);

        if page.markup.trim().is_empty() {
            conflicts.push(ConflictRecord {
                kind: ConflictKind::EmptyFile,
                paths: vec![page.path.clone()],
            });
        }
    }

    for paths in by_basename.into_values().filter(|p| p.len() > 1) {
        let mut paths: Vec<String> = paths.into_iter().map(str::to_string).collect();
        paths.sort();
        conflicts.push(ConflictRecord {
            kind: ConflictKind::DuplicateBasename,
            paths,
        });
    }

    conflicts.sort();
    conflicts
}
