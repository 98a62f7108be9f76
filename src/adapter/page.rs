//! Page templates: the page body inside the layout's content block.

use crate::dom::{Document, Element, Node};

use super::scaffold::LAYOUT_PATH;

/// Head elements carried into the page's `head` block.
fn is_head_asset(elem: &Element) -> bool {
    match elem.name.as_str() {
        "link" | "style" | "script" => true,
        "meta" => elem.attr("charset").is_none() && elem.attr("name") != Some("viewport"),
        _ => false,
    }
}

/// Render a parsed page as a template extending the layout.
pub fn render_template(doc: &Document) -> String {
    let title = doc
        .find("title")
        .map(|t| t.text_content().trim().to_string())
        .filter(|t| !t.is_empty());

    let head: Vec<String> = doc
        .find("head")
        .map(|head| {
            head.children
                .iter()
                .filter_map(|node| match node {
                    Node::Element(elem) if is_head_asset(elem) => Some(elem.outer_html()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let content = match (doc.find("body"), doc.find("html")) {
        (Some(body), _) => body.inner_html(),
        (None, Some(html)) => render_without_head(&html.children),
        (None, None) => render_without_head(&doc.nodes),
    };

    envelope(title.as_deref(), &head, &content)
}

/// Degraded rendering for markup that could not be parsed.
pub fn render_raw(markup: &str) -> String {
    envelope(None, &[], markup)
}

fn render_without_head(nodes: &[Node]) -> String {
    let kept: Vec<Node> = nodes
        .iter()
        .filter(|node| !matches!(node, Node::Element(e) if e.name == "head" || e.name == "title"))
        .cloned()
        .collect();
    Document {
        doctype: false,
        nodes: kept,
    }
    .render()
}

fn envelope(title: Option<&str>, head: &[String], content: &str) -> String {
    let mut out = format!("{{% extends \"{LAYOUT_PATH}\" %}}\n");
    if let Some(title) = title {
        out.push_str(&format!("{{% block title %}}{title}{{% endblock %}}\n"));
    }
    if !head.is_empty() {
        out.push_str("{% block head %}\n");
        for item in head {
            out.push_str(item);
            out.push('\n');
        }
        out.push_str("{% endblock %}\n");
    }
    out.push_str("{% block content %}\n");
    let content = content.trim();
    if !content.is_empty() {
        out.push_str(content);
        out.push('\n');
    }
    out.push_str("{% endblock %}\n");
    out
}
