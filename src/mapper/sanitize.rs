//! Inline handler and plaintext-script removal.

use crate::dom::{Element, Node};

/// Drop `on*` attributes; returns how many were removed.
pub fn strip_handlers(elem: &mut Element) -> usize {
    elem.retain_attrs(|name, _| !is_event_handler(name))
}

/// Drop `<script src="http://…">` children; returns how many were removed.
pub fn remove_insecure_scripts(nodes: &mut Vec<Node>) -> usize {
    let before = nodes.len();
    nodes.retain(|node| !matches!(node, Node::Element(elem) if is_insecure_script(elem)));
    before - nodes.len()
}

#[inline]
fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

fn is_insecure_script(elem: &Element) -> bool {
    elem.name == "script"
        && elem
            .attr("src")
            .is_some_and(|src| src.trim().to_ascii_lowercase().starts_with("http://"))
}
