//! Last-run record: what the previous run saw, for change detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::analyze::ConflictRecord;
use crate::freshness::ContentHash;
use crate::ingest::Page;

/// Last-run record file name (inside the state dir)
const LAST_RUN_FILE: &str = "last-run.json";

/// Conflict summary file name (inside the state dir)
const CONFLICTS_FILE: &str = "conflicts.txt";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LastRunRecord {
    /// Unix timestamp in seconds
    pub timestamp: u64,
    /// Relative page path -> checksum of its normalized markup
    pub checksums: BTreeMap<String, ContentHash>,
    pub confidence: f64,
    #[serde(default)]
    pub conflicts: Vec<ConflictRecord>,
    #[serde(default)]
    pub hints: BTreeMap<String, Vec<String>>,
}

impl LastRunRecord {
    pub fn new(pages: &[Page]) -> Self {
        Self {
            timestamp: current_timestamp(),
            checksums: pages
                .iter()
                .map(|p| (p.path.clone(), p.checksum))
                .collect(),
            ..Self::default()
        }
    }

    pub fn persist(&self, state_dir: &Path) -> std::io::Result<()> {
        write_json(&state_dir.join(LAST_RUN_FILE), self)
    }
}

/// Restore the previous record; missing or corrupt means no history.
pub fn restore_last_run(state_dir: &Path) -> Option<LastRunRecord> {
    read_json(&state_dir.join(LAST_RUN_FILE))
}

/// Pages whose checksum matches the previous run's checksum for that path.
pub fn unchanged_pages(previous: Option<&LastRunRecord>, pages: &[Page]) -> BTreeSet<String> {
    let Some(previous) = previous else {
        return BTreeSet::new();
    };
    pages
        .iter()
        .filter(|p| previous.checksums.get(&p.path) == Some(&p.checksum))
        .map(|p| p.path.clone())
        .collect()
}

/// Write the human-readable conflict summary.
pub fn persist_conflict_summary(conflicts: &[ConflictRecord], state_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(state_dir)?;
    let mut text = String::new();
    if conflicts.is_empty() {
        text.push_str("no conflicts\n");
    } else {
        text.push_str(&format!("conflicts ({})\n", conflicts.len()));
        for conflict in conflicts {
            text.push_str(&format!("[{}] {}\n", conflict.kind, conflict.paths.join(", ")));
        }
    }
    fs::write(state_dir.join(CONFLICTS_FILE), text)
}

/// Get current Unix timestamp in seconds
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::conflict::ConflictKind;
    use tempfile::TempDir;

    #[test]
    fn test_unchanged_pages_matches_by_path_and_checksum() {
        let old = vec![Page::new("a.html", "<p>a</p>"), Page::new("b.html", "<p>b</p>")];
        let record = LastRunRecord::new(&old);

        let new = vec![
            Page::new("a.html", "<p>a</p>"),
            Page::new("b.html", "<p>B</p>"),
            Page::new("c.html", "<p>c</p>"),
        ];
        let unchanged = unchanged_pages(Some(&record), &new);
        assert_eq!(unchanged.into_iter().collect::<Vec<_>>(), vec!["a.html"]);
    }

    #[test]
    fn test_no_history_means_nothing_unchanged() {
        let pages = vec![Page::new("a.html", "<p>a</p>")];
        assert!(unchanged_pages(None, &pages).is_empty());
    }

    #[test]
    fn test_persist_and_restore() {
        let dir = TempDir::new().unwrap();
        let mut record = LastRunRecord::new(&[Page::new("a.html", "x")]);
        record.confidence = 0.5;
        record.persist(dir.path()).unwrap();
        assert_eq!(restore_last_run(dir.path()), Some(record));
    }

    #[test]
    fn test_corrupt_record_is_no_history() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LAST_RUN_FILE), "{\"timestamp\": ").unwrap();
        assert!(restore_last_run(dir.path()).is_none());
    }

    #[test]
    fn test_conflict_summary_text() {
        let dir = TempDir::new().unwrap();
        let conflicts = vec![ConflictRecord {
            kind: ConflictKind::EmptyFile,
            paths: vec!["blank.html".into()],
        }];
        persist_conflict_summary(&conflicts, dir.path()).unwrap();
        let text = fs::read_to_string(dir.path().join(CONFLICTS_FILE)).unwrap();
        assert_eq!(text, "conflicts (1)\n[empty-file] blank.html\n");
    }
}
