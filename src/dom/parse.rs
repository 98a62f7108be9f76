//! Markup -> tree conversion through the `tl` parser.

use super::{
    Document, DomError, Element, Node, coalesce_text, collapse_whitespace,
    lex::{self, Prepared, VALUELESS},
};
use crate::utils::html::is_preformatted;

/// Parse markup, remembering (and stripping) a leading doctype.
pub(super) fn parse(markup: &str) -> Result<Document, DomError> {
    let (doctype, body) = strip_doctype(markup);

    let prepared = lex::prepare(body);

    let dom = tl::parse(&prepared.markup, tl::ParserOptions::default())
        .map_err(|e| DomError::Parse(format!("{e:?}")))?;
    let parser = dom.parser();

    let mut nodes = dom
        .children()
        .iter()
        .filter_map(|handle| convert(*handle, parser, &prepared, false))
        .collect();
    coalesce_text(&mut nodes, false);

    Ok(Document { doctype, nodes })
}

/// Split off a leading `<!DOCTYPE …>` declaration.
fn strip_doctype(markup: &str) -> (bool, &str) {
    let trimmed = markup.trim_start();
    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("<!doctype"));
    if !is_doctype {
        return (false, markup);
    }
    match trimmed.find('>') {
        Some(end) => (true, trimmed[end + 1..].trim_start()),
        None => (false, markup),
    }
}

/// Convert a tl node handle to an owned node.
fn convert(
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    prepared: &Prepared,
    preformatted: bool,
) -> Option<Node> {
    let node = handle.get(parser)?;

    match node {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_ascii_lowercase();

            let mut attrs: Vec<(String, Option<String>)> = Vec::new();
            for (key, value) in tag.attributes().iter() {
                let key = key.to_ascii_lowercase();
                if key.is_empty() || attrs.iter().any(|(k, _)| *k == key) {
                    continue;
                }
                let value = value.filter(|v| *v != VALUELESS).map(|v| v.to_string());
                attrs.push((key, value));
            }
            attrs.sort_by(|a, b| a.0.cmp(&b.0));

            if lex::has_raw_body(&name) {
                let marker: String = tag
                    .children()
                    .top()
                    .iter()
                    .filter_map(|child| child.get(parser)?.as_raw().map(|b| b.as_utf8_str()))
                    .collect();
                let children = prepared
                    .body(&marker)
                    .filter(|body| !body.is_empty())
                    .map(|body| vec![Node::Text(body.to_string())])
                    .unwrap_or_default();
                return Some(Node::Element(Element {
                    name,
                    attrs,
                    children,
                }));
            }

            let keep_space = preformatted || is_preformatted(&name);
            let mut children = tag
                .children()
                .top()
                .iter()
                .filter_map(|child| convert(*child, parser, prepared, keep_space))
                .collect();
            coalesce_text(&mut children, keep_space);

            Some(Node::Element(Element {
                name,
                attrs,
                children,
            }))
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if text.is_empty() {
                return None;
            }
            if !preformatted && text.trim().is_empty() {
                return Some(Node::Text(collapse_whitespace(&text).to_string()));
            }
            Some(Node::Text(text.into_owned()))
        }
        tl::Node::Comment(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_doctype() {
        assert_eq!(strip_doctype("<!DOCTYPE html>\n<html>"), (true, "<html>"));
        assert_eq!(strip_doctype("  <!doctype HTML><p>"), (true, "<p>"));
        assert_eq!(strip_doctype("<html>"), (false, "<html>"));
    }

    #[test]
    fn test_parse_lowercases_and_sorts() {
        let doc = parse(r#"<DIV id="x" CLASS="a b" data-k='v'>hi</DIV>"#).unwrap();
        let Node::Element(div) = &doc.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.name, "div");
        assert_eq!(
            div.attrs().map(|(k, _)| k).collect::<Vec<_>>(),
            vec!["class", "data-k", "id"]
        );
        assert_eq!(div.attr("data-k"), Some("v"));
    }

    #[test]
    fn test_parse_drops_comments_and_collapses_whitespace() {
        let doc = parse("<ul>\n   <!-- note -->\n  <li>a</li>  <li>b</li></ul>").unwrap();
        let ul = doc.find("ul").unwrap();
        let texts: Vec<_> = ul
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.iter().all(|t| *t == "\n" || *t == " "));
    }

    #[test]
    fn test_parse_self_closing_void() {
        let doc = parse(r#"<p>a<br/>b<img src="x.png"/></p><p>after</p>"#).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        let p = doc.find("p").unwrap();
        assert_eq!(p.children.len(), 4);
        assert!(matches!(&p.children[1], Node::Element(br) if br.name == "br"));
        assert_eq!(doc.find("img").unwrap().attr("src"), Some("x.png"));
        assert_eq!(
            doc.render(),
            r#"<p>a<br>b<img src="x.png"></p><p>after</p>"#
        );
    }

    #[test]
    fn test_parse_valueless_attribute_before_another() {
        let doc = parse(r#"<input required name="q"><option selected>One</option>"#).unwrap();
        let input = doc.find("input").unwrap();
        assert_eq!(
            input.attrs().collect::<Vec<_>>(),
            vec![("name", Some("q")), ("required", None)]
        );
        assert_eq!(input.attr("required"), Some(""));
        assert_eq!(
            doc.render(),
            r#"<input name="q" required><option selected>One</option>"#
        );
    }

    #[test]
    fn test_parse_script_body_verbatim() {
        let body = "\n  if (a<b && c>d) { x(); }\n  document.write('<p>' + \"</div>\");\n";
        let source = format!("<script>{body}</script><p>y</p>");
        let doc = parse(&source).unwrap();

        assert_eq!(doc.nodes.len(), 2);
        let script = doc.find("script").unwrap();
        assert_eq!(script.children, vec![Node::Text(body.to_string())]);
        assert_eq!(doc.find("p").unwrap().text_content(), "y");
        assert_eq!(doc.render(), source);
        assert_eq!(parse(&doc.render()).unwrap(), doc);
    }

    #[test]
    fn test_parse_empty_raw_body() {
        let doc = parse(r#"<script src="a.js"></script><textarea></textarea>"#).unwrap();
        assert!(doc.find("script").unwrap().children.is_empty());
        assert!(doc.find("textarea").unwrap().children.is_empty());
    }

    #[test]
    fn test_parse_keeps_pre_whitespace() {
        let doc = parse("<pre>  a\n   b  </pre>").unwrap();
        assert_eq!(doc.find("pre").unwrap().text_content(), "  a\n   b  ");
    }
}
