//! Input enumeration.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::utils::path::to_slash;

/// An input file: absolute path plus its `/`-separated relative path.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub abs: PathBuf,
    pub rel: String,
}

/// Collect `.html`/`.htm` files under `root`, hidden entries skipped, sorted.
pub fn html_files(root: &Path) -> Vec<InputFile> {
    let mut files: Vec<InputFile> = WalkDir::new(root)
        .skip_hidden(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| is_html(p))
        .filter_map(|abs| {
            let rel = to_slash(abs.strip_prefix(root).ok()?);
            Some(InputFile { abs, rel })
        })
        .collect();
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    files
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}
