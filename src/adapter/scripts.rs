//! Inline script export to numbered standalone files.

use std::collections::BTreeMap;

use crate::analyze::InlineScript;

pub const EXTRACTED_DIR: &str = "assets/js/extracted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedScript {
    /// Output-relative path.
    pub rel: String,
    pub content: String,
}

/// Number every script in page order, then document order.
pub fn extract(scripts: &BTreeMap<String, Vec<InlineScript>>) -> Vec<ExtractedScript> {
    scripts
        .iter()
        .flat_map(|(page, scripts)| scripts.iter().map(move |s| (page, s)))
        .enumerate()
        .map(|(n, (page, script))| ExtractedScript {
            rel: format!("{EXTRACTED_DIR}/inline-{:03}.js", n + 1),
            content: format!(
                "// extracted: {page} script {} ({} bytes, dom-ready: {})\n{}\n",
                script.index,
                script.bytes,
                script.dom_ready,
                script.body.trim_end()
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(index: usize, body: &str) -> InlineScript {
        InlineScript {
            index,
            body: body.to_string(),
            bytes: body.len(),
            dom_ready: false,
        }
    }

    #[test]
    fn test_numbering_across_pages() {
        let mut scripts = BTreeMap::new();
        scripts.insert("b.html".to_string(), vec![script(0, "b0();")]);
        scripts.insert("a.html".to_string(), vec![script(0, "a0();"), script(1, "a1();\n")]);

        let out = extract(&scripts);
        let rels: Vec<_> = out.iter().map(|s| s.rel.as_str()).collect();
        assert_eq!(
            rels,
            vec![
                "assets/js/extracted/inline-001.js",
                "assets/js/extracted/inline-002.js",
                "assets/js/extracted/inline-003.js",
            ]
        );
        assert_eq!(
            out[1].content,
            "// extracted: a.html script 1 (6 bytes, dom-ready: false)\na1();\n"
        );
        assert!(out[2].content.contains("b0();"));
    }
}
