//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects, no filesystem
//! access: normalization here is lexical so it also works for paths that
//! do not exist yet.

use std::path::{Component, Path, PathBuf};

/// Check if a link is external (has a URL scheme like http:, mailto:, etc.)
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
///
/// Protocol-relative links (`//cdn.example.com/x.js`) count as external too.
#[inline]
pub fn is_external_link(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Split a reference into its path and its `?query#fragment` suffix.
///
/// ```ignore
/// assert_eq!(split_suffix("css/a.css?v=2#x"), ("css/a.css", "?v=2#x"));
/// assert_eq!(split_suffix("img/logo.png"), ("img/logo.png", ""));
/// ```
#[inline]
pub fn split_suffix(reference: &str) -> (&str, &str) {
    match reference.find(['?', '#']) {
        Some(pos) => reference.split_at(pos),
        None => (reference, ""),
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// Returns `None` when a relative path climbs above its starting point
/// (`a/../../b`), which is exactly the case a sandbox must reject.
/// Absolute paths clamp at the root the way the OS does.
pub fn lexical_normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    if path.is_absolute() {
                        continue;
                    }
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(name) => {
                out.push(name);
                depth += 1;
            }
        }
    }

    Some(out)
}

/// Render a relative path with forward slashes on every platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
