//! Run-state persistence: analysis caches and the last-run record.
//!
//! ```text
//! <state_dir>/
//! ├── cache/
//! │   ├── analysis/<manifest>.json   # full analysis per input snapshot
//! │   └── pages/<checksum>.json      # per-page scan, content addressed
//! ├── last-run.json                  # checksums + summary of the previous run
//! └── conflicts.txt                  # human-readable conflict summary
//! ```
//!
//! Unreadable or corrupt files are treated as absent: the run starts cold.

mod last_run;
mod store;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use last_run::{LastRunRecord, persist_conflict_summary, restore_last_run, unchanged_pages};
pub use store::ContentStore;

/// Snapshot-level analysis cache directory (inside the cache dir)
pub(crate) const ANALYSIS_DIR: &str = "analysis";

/// Per-page scan cache directory (inside the cache dir)
pub(crate) const PAGES_DIR: &str = "pages";

/// Check if file content is the same as new content
fn file_content_matches(path: &Path, content: &str) -> bool {
    path.exists() && fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

/// Write pretty JSON, skipping the write when the file already matches.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if file_content_matches(path, &json) {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
}

/// Read JSON, mapping a missing or corrupt file to `None`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let json = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            crate::debug!("cache"; "ignoring corrupt {}: {}", path.display(), e);
            None
        }
    }
}
