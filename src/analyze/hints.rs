//! Template hints: which kind of storefront template a page looks like.

use crate::dom::Node;
use crate::utils::html::is_raw_text_element;

/// Domain keywords; a hint is the keyword itself.
const HINT_KEYWORDS: &[&str] = &[
    "product",
    "cart",
    "checkout",
    "collection",
    "blog",
    "article",
    "account",
    "login",
    "search",
    "contact",
];

/// Keywords present as whole words (case-insensitive), sorted.
pub fn detect(text: &str) -> Vec<String> {
    let mut found: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| HINT_KEYWORDS.contains(&word.as_str()))
        .collect();
    found.sort();
    found.dedup();
    found
}

/// Text a visitor would read: everything outside `script` and `style`.
pub fn visible_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    push_visible(nodes, &mut out);
    out
}

fn push_visible(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(elem) if !is_raw_text_element(&elem.name) => {
                push_visible(&elem.children, out);
            }
            Node::Element(_) => {}
        }
    }
}
