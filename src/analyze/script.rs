//! Inline script capture. Bodies are recorded verbatim and never run.

use serde::{Deserialize, Serialize};

use crate::dom::Element;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineScript {
    /// Position among the page's captured scripts.
    pub index: usize,
    pub body: String,
    pub bytes: usize,
    /// Body waits for the document before running.
    pub dom_ready: bool,
}

/// Capture a `<script>` element if it is inline JavaScript.
pub fn capture(elem: &Element, index: usize) -> Option<InlineScript> {
    if elem.attr("src").is_some() || !is_javascript(elem.attr("type")) {
        return None;
    }
    let body = elem.text_content();
    if body.trim().is_empty() {
        return None;
    }
    Some(InlineScript {
        index,
        bytes: body.len(),
        dom_ready: is_dom_ready(&body),
        body,
    })
}

fn is_javascript(kind: Option<&str>) -> bool {
    let kind = kind.unwrap_or("").trim().to_ascii_lowercase();
    matches!(
        kind.as_str(),
        "" | "module"
            | "text/javascript"
            | "application/javascript"
            | "text/ecmascript"
            | "application/ecmascript"
    )
}

/// Coarse heuristic over the whitespace-free body.
fn is_dom_ready(body: &str) -> bool {
    const MARKERS: &[&str] = &[
        "DOMContentLoaded",
        "$(document).ready",
        "jQuery(document).ready",
        "$(function",
        "window.onload",
        "addEventListener(\"load\"",
        "addEventListener('load'",
    ];
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    MARKERS.iter().any(|marker| compact.contains(marker))
}
