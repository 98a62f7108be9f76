//! Quarantine: copy unreadable inputs aside for human review.

use std::fs;
use std::path::Path;

use crate::log;

/// Copy `source` to `<dir>/<rel>`. Best-effort: failures are logged only.
pub fn isolate(source: &Path, dir: &Path, rel: &str) {
    let target = dir.join(rel);
    let result = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::copy(source, &target).map(|_| ()));

    match result {
        Ok(()) => crate::debug!("ingest"; "quarantined {} -> {}", rel, target.display()),
        Err(e) => log!("ingest"; "failed to quarantine {}: {}", rel, e),
    }
}
