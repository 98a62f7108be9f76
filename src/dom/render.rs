//! Deterministic tree -> markup serialization.

use super::{Element, Node};
use crate::utils::html::{is_void_element, quote_attr};

pub(super) fn nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(elem) => element(elem, out),
            Node::Text(text) => out.push_str(text),
        }
    }
}

pub(super) fn element(elem: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&elem.name);
    for (key, value) in elem.attrs() {
        out.push(' ');
        out.push_str(key);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&quote_attr(value));
            out.push('"');
        }
    }
    out.push('>');

    if is_void_element(&elem.name) {
        return;
    }

    nodes(&elem.children, out);
    out.push_str("</");
    out.push_str(&elem.name);
    out.push('>');
}
