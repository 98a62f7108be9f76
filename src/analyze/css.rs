//! Layout-relevant declarations from inline `<style>` blocks.
//!
//! Not a CSS model: rules are split on braces, `@media`/`@supports` bodies
//! are descended into, every other at-rule is skipped, and only
//! declarations on the allow-list are kept.

use std::collections::BTreeMap;

/// Selector -> (property -> value)
pub type CssMap = BTreeMap<String, BTreeMap<String, String>>;

const LAYOUT_PROPERTIES: &[&str] = &[
    "display",
    "position",
    "flex",
    "flex-direction",
    "flex-wrap",
    "justify-content",
    "align-items",
    "grid-template-columns",
    "grid-template-rows",
    "grid-template-areas",
    "gap",
    "width",
    "max-width",
    "min-height",
    "height",
    "margin",
    "padding",
    "float",
];

/// Collect allow-listed declarations from a stylesheet into `out`.
pub fn collect(stylesheet: &str, out: &mut CssMap) {
    collect_rules(&strip_comments(stylesheet), out);
}

fn collect_rules(css: &str, out: &mut CssMap) {
    let mut rest = css;

    loop {
        rest = rest.trim_start();
        let Some(open) = rest.find('{') else {
            break;
        };
        let prelude = &rest[..open];

        // Statement at-rules (`@import …;`) end before the next block
        if prelude.starts_with('@')
            && let Some(semi) = prelude.find(';')
        {
            rest = &rest[semi + 1..];
            continue;
        }

        let body_start = open + 1;
        let Some(len) = block_len(&rest[body_start..]) else {
            break;
        };
        let body = &rest[body_start..body_start + len];
        rest = &rest[body_start + len + 1..];

        let prelude = prelude.trim();
        if let Some(at_rule) = prelude.strip_prefix('@') {
            let name = at_rule
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            if name == "media" || name == "supports" {
                collect_rules(body, out);
            }
            continue;
        }

        let declarations = layout_declarations(body);
        if declarations.is_empty() || prelude.is_empty() {
            continue;
        }
        let selector = prelude.split_whitespace().collect::<Vec<_>>().join(" ");
        out.entry(selector).or_default().extend(declarations);
    }
}

/// Length of a block body up to its matching close brace.
fn block_len(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(i),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn layout_declarations(body: &str) -> BTreeMap<String, String> {
    body.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter_map(|(prop, value)| {
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
            (LAYOUT_PROPERTIES.contains(&prop.as_str()) && !value.is_empty()).then_some((prop, value))
        })
        .collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}
