//! Owned HTML syntax tree with deterministic serialization.
//!
//! Every structural pass in the pipeline (normalization, analysis, semantic
//! rewriting, partial extraction) goes through this one model:
//!
//! ```text
//! markup ──lex──tl──> Document ──(rewrite)──> render() ──> markup
//! ```
//!
//! `lex` normalizes tags and lifts raw-text bodies out before `tl` sees the
//! markup; script, style and textarea content comes back verbatim.
//!
//! Rendering rules:
//! - tag and attribute names lower-cased, attributes sorted and double-quoted
//! - void elements never closed, every other element explicitly closed
//! - whitespace-only text collapsed to `"\n"` or `" "` outside `pre`/`textarea`/`script`/`style`
//! - comments dropped, a doctype re-emitted as `<!DOCTYPE html>`

mod lex;
mod parse;
mod render;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("markup could not be parsed: {0}")]
    Parse(String),
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Raw text, entities preserved as written.
    Text(String),
}

/// An element with sorted attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attrs: Vec<(String, Option<String>)>,
    pub children: Vec<Node>,
}

/// A parsed page or fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub doctype: bool,
    pub nodes: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Get an attribute value. Valueless attributes yield `Some("")`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Set an attribute, keeping attributes sorted by name.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.attrs.binary_search_by(|(k, _)| k.as_str().cmp(name)) {
            Ok(idx) => self.attrs[idx].1 = value,
            Err(idx) => self.attrs.insert(idx, (name.to_string(), value)),
        }
    }

    /// Remove attributes rejected by `keep`; returns how many were removed.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str, Option<&str>) -> bool) -> usize {
        let before = self.attrs.len();
        self.attrs.retain(|(k, v)| keep(k, v.as_deref()));
        before - self.attrs.len()
    }

    /// Sorted, deduplicated class list.
    pub fn class_signature(&self) -> Vec<String> {
        let mut classes: Vec<String> = self
            .attr("class")
            .unwrap_or("")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        render::element(self, &mut out);
        out
    }

    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        render::nodes(&self.children, &mut out);
        out
    }
}

impl Document {
    /// Parse markup into a tree.
    pub fn parse(markup: &str) -> Result<Self, DomError> {
        parse::parse(markup)
    }

    /// Serialize with the deterministic rendering rules.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.doctype {
            out.push_str("<!DOCTYPE html>\n");
        }
        render::nodes(&self.nodes, &mut out);
        out
    }

    /// Visit every element in document order.
    pub fn for_each_element<'a>(&'a self, mut f: impl FnMut(&'a Element)) {
        visit(&self.nodes, &mut f);
    }

    /// First element with the given tag name, in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        find_in(&self.nodes, name)
    }

    /// Mutably visit every element, parents before children.
    pub fn for_each_element_mut(&mut self, mut f: impl FnMut(&mut Element)) {
        visit_mut(&mut self.nodes, &mut f);
    }
}

/// Merge adjacent text nodes and collapse whitespace-only runs, so a tree
/// edited by removing nodes renders the same way its re-parse would.
pub fn coalesce_text(nodes: &mut Vec<Node>, preformatted: bool) {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        if let Node::Text(text) = &node
            && let Some(Node::Text(prev)) = merged.last_mut()
        {
            prev.push_str(text);
            continue;
        }
        merged.push(node);
    }
    if !preformatted {
        for node in &mut merged {
            if let Node::Text(text) = node
                && text.trim().is_empty()
            {
                *text = collapse_whitespace(text).to_string();
            }
        }
    }
    *nodes = merged;
}

/// Whitespace-only text becomes a single newline or space.
#[inline]
pub(crate) fn collapse_whitespace(text: &str) -> &'static str {
    if text.contains('\n') { "\n" } else { " " }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

fn visit<'a>(nodes: &'a [Node], f: &mut impl FnMut(&'a Element)) {
    for node in nodes {
        if let Node::Element(elem) = node {
            f(elem);
            visit(&elem.children, f);
        }
    }
}

fn visit_mut(nodes: &mut [Node], f: &mut impl FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(elem) = node {
            f(elem);
            visit_mut(&mut elem.children, f);
        }
    }
}

fn find_in<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Element> {
    nodes.iter().find_map(|node| match node {
        Node::Element(elem) if elem.name == name => Some(elem),
        Node::Element(elem) => find_in(&elem.children, name),
        Node::Text(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_helpers() {
        let mut elem = Element::new("img");
        elem.set_attr("src", "a.png");
        elem.set_attr("alt", "Logo");
        elem.set_attr("src", "b.png");
        assert_eq!(elem.attr("src"), Some("b.png"));
        assert_eq!(
            elem.attrs().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["alt", "src"]
        );
        assert_eq!(elem.retain_attrs(|k, _| k != "alt"), 1);
        assert_eq!(elem.attr("alt"), None);
    }

    #[test]
    fn test_coalesce_text() {
        let mut nodes = vec![
            Node::Text("\n".into()),
            Node::Text("\n".into()),
            Node::Element(Element::new("br")),
            Node::Text("a".into()),
            Node::Text(" b".into()),
        ];
        coalesce_text(&mut nodes, false);
        assert_eq!(
            nodes,
            vec![
                Node::Text("\n".into()),
                Node::Element(Element::new("br")),
                Node::Text("a b".into()),
            ]
        );
    }

    #[test]
    fn test_class_signature_sorted_unique() {
        let doc = Document::parse(r#"<div class="banner hero  banner"></div>"#).unwrap();
        let div = doc.find("div").unwrap();
        assert_eq!(div.class_signature(), vec!["banner", "hero"]);
    }

    #[test]
    fn test_text_content_and_find() {
        let doc = Document::parse("<section><h1>Hi <em>there</em></h1></section>").unwrap();
        let h1 = doc.find("h1").unwrap();
        assert_eq!(h1.text_content(), "Hi there");
        assert!(doc.find("footer").is_none());

        let mut names = Vec::new();
        doc.for_each_element(|e| names.push(e.name.clone()));
        assert_eq!(names, vec!["section", "h1", "em"]);
    }
}
