//! Shared-component partials.
//!
//! Every signature occurring at least twice is materialized exactly once,
//! under `partials/<category>/<slug>.html`, and each occurrence is replaced
//! by an include. Substitution works on the syntax tree, outermost
//! component first; pages that cannot be parsed fall back to substring
//! replacement of the component markup.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use super::category::CategoryResolver;
use crate::analyze::{Component, signature_key};
use crate::dom::{Document, Element, Node};
use crate::utils::html::is_structural_element;

#[derive(Debug, Clone)]
pub struct Partial {
    pub signature: Vec<String>,
    pub category: String,
    /// Output-relative path, `partials/<category>/<slug>.html`.
    pub rel: String,
    /// Markup with nested shared components already replaced.
    pub content: String,
    /// Partials included by this one.
    pub includes: BTreeSet<String>,
    /// Markup as analyzed, for the substring fallback.
    fallback: String,
}

impl Partial {
    pub fn include_tag(&self) -> String {
        format!("{{% include \"{}\" %}}", self.rel)
    }
}

#[derive(Debug, Default)]
pub struct PartialPlan {
    partials: Vec<Partial>,
    by_signature: FxHashMap<String, usize>,
}

impl PartialPlan {
    /// Plan partials for the shared components.
    ///
    /// Content comes from the first occurrence in `docs` (page order), so
    /// it carries the rewritten text and asset references.
    pub fn build(shared: &[&Component], docs: &[Option<&Document>], resolver: &CategoryResolver) -> Self {
        let mut plan = Self::default();
        let mut taken = BTreeSet::new();

        for component in shared {
            let category = resolver.resolve(&component.signature);
            let mut rel = format!("partials/{}/{}.html", category, slugify(&component.signature));
            if !taken.insert(rel.clone()) {
                rel = format!(
                    "partials/{}/{}-{}.html",
                    category,
                    slugify(&component.signature),
                    component.id.trim_start_matches("cmp-")
                );
                taken.insert(rel.clone());
            }

            plan.by_signature
                .insert(signature_key(&component.signature), plan.partials.len());
            plan.partials.push(Partial {
                signature: component.signature.clone(),
                category,
                rel,
                content: String::new(),
                includes: BTreeSet::new(),
                fallback: component.markup.clone(),
            });
        }

        // Contents need the full signature table for nested includes
        for idx in 0..plan.partials.len() {
            let signature = &plan.partials[idx].signature;
            let mut elem = docs
                .iter()
                .flatten()
                .find_map(|doc| find_component(&doc.nodes, signature))
                .cloned();

            let (content, includes) = match elem.as_mut() {
                Some(elem) => {
                    let mut includes = BTreeSet::new();
                    plan.substitute(&mut elem.children, &mut includes);
                    (elem.outer_html(), includes)
                }
                None => (plan.partials[idx].fallback.clone(), BTreeSet::new()),
            };
            plan.partials[idx].content = content;
            plan.partials[idx].includes = includes;
        }

        plan
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    fn lookup(&self, elem: &Element) -> Option<&Partial> {
        if !is_structural_element(&elem.name) {
            return None;
        }
        let signature = elem.class_signature();
        if signature.is_empty() {
            return None;
        }
        self.by_signature
            .get(&signature_key(&signature))
            .map(|idx| &self.partials[*idx])
    }

    /// Replace shared components with includes, outermost first. Referenced
    /// partial paths are added to `used`.
    pub fn substitute(&self, nodes: &mut [Node], used: &mut BTreeSet<String>) {
        for node in nodes.iter_mut() {
            let Node::Element(elem) = node else {
                continue;
            };
            match self.lookup(elem) {
                Some(partial) => {
                    used.insert(partial.rel.clone());
                    *node = Node::Text(partial.include_tag());
                }
                None => self.substitute(&mut elem.children, used),
            }
        }
    }

    /// Degraded path for markup that does not parse: replace the analyzed
    /// component markup verbatim, longest first.
    pub fn substitute_markup(&self, markup: &str, used: &mut BTreeSet<String>) -> String {
        let mut ordered: Vec<&Partial> = self.partials.iter().collect();
        ordered.sort_by(|a, b| b.fallback.len().cmp(&a.fallback.len()).then(a.rel.cmp(&b.rel)));

        let mut out = markup.to_string();
        for partial in ordered {
            if !partial.fallback.is_empty() && out.contains(&partial.fallback) {
                out = out.replace(&partial.fallback, &partial.include_tag());
                used.insert(partial.rel.clone());
            }
        }
        out
    }
}

fn find_component<'a>(nodes: &'a [Node], signature: &[String]) -> Option<&'a Element> {
    nodes.iter().find_map(|node| match node {
        Node::Element(elem)
            if is_structural_element(&elem.name) && elem.class_signature() == signature =>
        {
            Some(elem)
        }
        Node::Element(elem) => find_component(&elem.children, signature),
        Node::Text(_) => None,
    })
}

/// Signature classes joined by `-`, transliterated, reduced to `[a-z0-9-]`.
pub fn slugify(signature: &[String]) -> String {
    let ascii = deunicode::deunicode(&signature.join("-")).to_lowercase();
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "component".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::baseline::Baseline;
    use crate::config::section::default_categories;

    fn component(classes: &[&str], page: &str, markup: &str) -> Component {
        let signature: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
        Component {
            id: format!("cmp-{}", slugify(&signature)),
            signature,
            markup: markup.to_string(),
            order: 0,
            page: page.to_string(),
            shared: true,
        }
    }

    fn resolver() -> CategoryResolver {
        CategoryResolver::new(&Baseline::default(), &default_categories())
    }

    #[test]
    fn test_slugify() {
        let sig = |c: &[&str]| c.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(slugify(&sig(&["banner", "hero"])), "banner-hero");
        assert_eq!(slugify(&sig(&["Café", "top__bar"])), "cafe-top-bar");
        assert_eq!(slugify(&sig(&["--"])), "component");
    }

    #[test]
    fn test_substitute_outermost_first() {
        let doc = Document::parse(
            r#"<header class="site-header"><nav class="menu">a</nav></header><main><nav class="menu">b</nav></main>"#,
        )
        .unwrap();
        let header = component(&["site-header"], "a.html", "");
        let nav = component(&["menu"], "a.html", "");
        let plan = PartialPlan::build(&[&header, &nav], &[Some(&doc)], &resolver());

        let header_partial = &plan.partials()[0];
        assert_eq!(header_partial.rel, "partials/header/site-header.html");
        assert_eq!(
            header_partial.content,
            r#"<header class="site-header">{% include "partials/header/menu.html" %}</header>"#
        );
        assert_eq!(
            header_partial.includes.iter().collect::<Vec<_>>(),
            vec!["partials/header/menu.html"]
        );

        let mut page = doc.clone();
        let mut used = BTreeSet::new();
        plan.substitute(&mut page.nodes, &mut used);
        assert_eq!(
            page.render(),
            r#"{% include "partials/header/site-header.html" %}<main>{% include "partials/header/menu.html" %}</main>"#
        );
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn test_substring_fallback() {
        let markup = r#"<section class="hero">x</section>"#;
        let hero = component(&["hero"], "a.html", markup);
        let plan = PartialPlan::build(&[&hero], &[None], &resolver());
        assert_eq!(plan.partials()[0].content, markup);

        let mut used = BTreeSet::new();
        let out = plan.substitute_markup(&format!("<p>a</p>{markup}<<broken"), &mut used);
        assert_eq!(out, r#"<p>a</p>{% include "partials/hero/hero.html" %}<<broken"#);
        assert!(used.contains("partials/hero/hero.html"));
    }

    #[test]
    fn test_slug_collision_gets_id_suffix() {
        let a = component(&["promo_box"], "a.html", "");
        let b = component(&["promo-box"], "a.html", "");
        let plan = PartialPlan::build(&[&a, &b], &[], &resolver());
        let rels: Vec<_> = plan.partials().iter().map(|p| p.rel.as_str()).collect();
        assert_eq!(rels[0], "partials/components/promo-box.html");
        assert_eq!(
            rels[1],
            format!("partials/components/promo-box-{}.html", &b.id[4..])
        );
    }
}
