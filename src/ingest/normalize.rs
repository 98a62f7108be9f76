//! Markup normalization.

use crate::dom::{Document, DomError};

/// Strip a byte-order mark, normalize line endings, then round-trip through
/// the syntax tree so whitespace and tag closing are deterministic.
pub fn normalize_markup(raw: &str) -> Result<String, DomError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    Ok(Document::parse(&text)?.render())
}
