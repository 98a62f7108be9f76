//! Semantic rewriting of page text and attributes.
//!
//! Passes, per element, parents before children:
//!
//! | Pass         | Flag       | Touches                                      |
//! |--------------|------------|----------------------------------------------|
//! | sanitize     | `sanitize` | `on*` attributes, `<script src="http://…">`  |
//! | substitute   | always     | literal text, text-bearing attribute values  |
//! | translate    | `i18n`     | text of allow-listed tags, allow-listed attrs |
//!
//! Only literal (non-templating) text is ever rewritten, which makes the
//! mapper idempotent: running it over its own output changes nothing.

mod i18n;
mod sanitize;
mod substitute;

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::MapperConfig;
use crate::dom::{Document, Element, Node, coalesce_text};
use crate::ingest::Page;
use crate::log;
use crate::utils::html::{is_preformatted, is_raw_text_element};
use substitute::Substituter;

/// Attributes that carry prose besides the translatable ones.
const TEXT_ATTRS: &[&str] = &["content", "value"];

/// Rewrite totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticStats {
    pub placeholders: usize,
    pub scrubbed: usize,
    pub text_wraps: usize,
    pub attr_wraps: usize,
    pub folded: usize,
    pub multi_expression_skipped: usize,
    pub handlers_removed: usize,
    pub insecure_scripts_removed: usize,
}

impl SemanticStats {
    fn add(&mut self, other: &Self) {
        self.placeholders += other.placeholders;
        self.scrubbed += other.scrubbed;
        self.text_wraps += other.text_wraps;
        self.attr_wraps += other.attr_wraps;
        self.folded += other.folded;
        self.multi_expression_skipped += other.multi_expression_skipped;
        self.handlers_removed += other.handlers_removed;
        self.insecure_scripts_removed += other.insecure_scripts_removed;
    }
}

impl fmt::Display for SemanticStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} placeholders, {} scrubbed, {} text wraps, {} attr wraps, {} folded, {} handlers removed, {} insecure scripts removed",
            self.placeholders,
            self.scrubbed,
            self.text_wraps,
            self.attr_wraps,
            self.folded,
            self.handlers_removed,
            self.insecure_scripts_removed
        )
    }
}

pub struct Mapper {
    substituter: Substituter,
    i18n: bool,
    sanitize: bool,
    i18n_tags: FxHashSet<String>,
    i18n_attrs: FxHashSet<String>,
}

impl Mapper {
    /// Build a mapper; a client overlay replaces base keys it defines.
    pub fn new(config: &MapperConfig) -> Result<Self> {
        let mut placeholders: BTreeMap<String, String> = config.placeholders.clone();
        if let Some(client) = &config.client {
            match config.clients.get(client) {
                Some(overlay) => placeholders.extend(overlay.clone()),
                None => log!("map"; "unknown client `{}`, using base placeholders", client),
            }
        }

        let substituter = Substituter::new(&placeholders, &config.scrub)
            .context("Failed to build placeholder pattern")?;

        Ok(Self {
            substituter,
            i18n: config.i18n,
            sanitize: config.sanitize,
            i18n_tags: config.i18n_tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            i18n_attrs: config.i18n_attrs.iter().map(|a| a.to_ascii_lowercase()).collect(),
        })
    }

    /// Rewrite every page; checksums keep describing the ingested markup.
    pub fn map_pages(&self, pages: Vec<Page>) -> (Vec<Page>, SemanticStats) {
        let mut total = SemanticStats::default();
        let pages = pages
            .into_iter()
            .map(|mut page| {
                let mut stats = SemanticStats::default();
                match self.map_markup(&page.markup, &mut stats) {
                    Ok(markup) => {
                        page.markup = markup;
                        total.add(&stats);
                    }
                    Err(e) => log!("map"; "{}: left as is: {}", page.path, e),
                }
                page
            })
            .collect();
        (pages, total)
    }

    /// Rewrite one document.
    pub fn map_markup(&self, markup: &str, stats: &mut SemanticStats) -> Result<String> {
        let mut doc = Document::parse(markup)?;
        self.rewrite_nodes(&mut doc.nodes, None, stats);
        Ok(doc.render())
    }

    fn rewrite_nodes(&self, nodes: &mut Vec<Node>, parent: Option<&str>, stats: &mut SemanticStats) {
        if self.sanitize {
            let removed = sanitize::remove_insecure_scripts(nodes);
            if removed > 0 {
                coalesce_text(nodes, parent.is_some_and(is_preformatted));
                stats.insecure_scripts_removed += removed;
            }
        }
        if parent.is_some_and(is_raw_text_element) {
            return;
        }
        let translate = self.i18n && parent.is_some_and(|p| self.i18n_tags.contains(p));

        for node in nodes.iter_mut() {
            match node {
                Node::Text(text) => {
                    let mut rewritten = self.substituter.apply(text, stats);
                    if translate {
                        rewritten = i18n::translate_text(&rewritten, stats);
                    }
                    *text = rewritten;
                }
                Node::Element(elem) => self.rewrite_element(elem, stats),
            }
        }
    }

    fn rewrite_element(&self, elem: &mut Element, stats: &mut SemanticStats) {
        if self.sanitize {
            stats.handlers_removed += sanitize::strip_handlers(elem);
        }

        let updates: Vec<(String, String)> = elem
            .attrs()
            .filter_map(|(name, value)| Some((name, value?)))
            .filter(|(name, _)| self.i18n_attrs.contains(*name) || TEXT_ATTRS.contains(name))
            .filter_map(|(name, value)| {
                let mut rewritten = self.substituter.apply(value, stats);
                if self.i18n
                    && self.i18n_attrs.contains(name)
                    && let Some(wrapped) = i18n::translate_attr(&rewritten, stats)
                {
                    rewritten = wrapped;
                }
                (rewritten != value).then(|| (name.to_string(), rewritten))
            })
            .collect();
        for (name, value) in updates {
            elem.set_attr(&name, value);
        }

        self.rewrite_nodes(&mut elem.children, Some(&elem.name), stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(configure: impl FnOnce(&mut MapperConfig)) -> Mapper {
        let mut config = MapperConfig::default();
        configure(&mut config);
        Mapper::new(&config).unwrap()
    }

    fn map(mapper: &Mapper, markup: &str) -> (String, SemanticStats) {
        let mut stats = SemanticStats::default();
        let out = mapper.map_markup(markup, &mut stats).unwrap();
        (out, stats)
    }

    #[test]
    fn test_sample_is_scrubbed_store_untouched() {
        let (out, stats) = map(&mapper(|_| {}), "<p>Sample Store</p>");
        assert_eq!(out, "<p>{{ store.name }} Store</p>");
        assert_eq!(stats.scrubbed, 1);
        assert_eq!(stats.text_wraps, 0);
    }

    #[test]
    fn test_onclick_removed_and_counted() {
        let m = mapper(|c| c.sanitize = true);
        let (out, stats) = map(&m, r#"<div class="cta"><button onclick="doThing()">Buy</button></div>"#);
        assert_eq!(out, r#"<div class="cta"><button>Buy</button></div>"#);
        assert_eq!(stats.handlers_removed, 1);
    }

    #[test]
    fn test_handlers_kept_without_sanitize() {
        let (out, stats) = map(&mapper(|_| {}), r#"<button onclick="go()">Buy</button>"#);
        assert!(out.contains("onclick"));
        assert_eq!(stats.handlers_removed, 0);
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let m = mapper(|c| {
            c.i18n = true;
            c.sanitize = true;
        });
        let source = r#"<!DOCTYPE html>
<html><head><title>Sample shop</title></head><body>
<h1>Welcome to %STORE_NAME%</h1>
<p>Lorem ipsum dolor sit amet</p>
<img alt="Team photo" src="team.png">
<a href="/cart" onclick="track()">View cart</a>
<span>{{ a }} and {{ b }}</span>
<td>42</td>
<p>Use }} to close</p>
<script src="http://cdn.example.com/x.js"></script>
<script>if (a<b && c>d) { go("{{ x }}"); }</script>
</body></html>"#;

        let (once, first) = map(&m, source);
        assert!(first.placeholders >= 1);
        assert!(first.text_wraps >= 1);
        assert_eq!(first.attr_wraps, 1);
        assert_eq!(first.handlers_removed, 1);
        assert_eq!(first.insecure_scripts_removed, 1);
        assert_eq!(first.multi_expression_skipped, 1);
        assert!(once.contains("<p>Use }} to close</p>"));
        assert!(once.contains(r#"<script>if (a<b && c>d) { go("{{ x }}"); }</script>"#));

        let (twice, second) = map(&m, &once);
        assert_eq!(once, twice);
        assert_eq!(second.placeholders, 0);
        assert_eq!(second.scrubbed, 0);
        assert_eq!(second.text_wraps, 0);
        assert_eq!(second.attr_wraps, 0);
        assert_eq!(second.folded, 0);
        assert_eq!(second.handlers_removed, 0);
    }

    #[test]
    fn test_i18n_wraps_and_folds() {
        let m = mapper(|c| c.i18n = true);
        let (out, stats) = map(
            &m,
            r#"<h2>Best sellers</h2><p>Sample picks</p><img alt="Logo" src="a.png"><td>19.99</td>"#,
        );
        assert!(out.contains(r#"<h2>{{ t("Best sellers") }}</h2>"#));
        // "Sample" became an expression first, then folded
        assert!(out.contains(r#"<p>{{ t("{name} picks", name=store.name) }}</p>"#));
        assert!(out.contains(r#"alt="{{ t('Logo') }}""#));
        assert!(out.contains("<td>19.99</td>"));
        assert_eq!(stats.text_wraps, 1);
        assert_eq!(stats.folded, 1);
        assert_eq!(stats.attr_wraps, 1);
    }

    #[test]
    fn test_text_outside_allow_list_not_wrapped() {
        let m = mapper(|c| c.i18n = true);
        let (out, _) = map(&m, "<div>Loose text</div><script>var Sample = 1;</script>");
        assert_eq!(out, "<div>Loose text</div><script>var Sample = 1;</script>");
    }

    #[test]
    fn test_client_overlay_wins() {
        let m = mapper(|c| {
            c.client = Some("acme".into());
            c.clients.insert(
                "acme".into(),
                [("STORE_NAME".to_string(), "{{ acme.brand }}".to_string())].into(),
            );
        });
        let (out, stats) = map(&m, "<p>%STORE_NAME% / %STORE_EMAIL%</p>");
        assert_eq!(out, "<p>{{ acme.brand }} / {{ store.email }}</p>");
        assert_eq!(stats.placeholders, 2);
    }

    #[test]
    fn test_unknown_client_uses_base_map() {
        let m = mapper(|c| c.client = Some("nobody".into()));
        let (out, _) = map(&m, "<p>%STORE_NAME%</p>");
        assert_eq!(out, "<p>{{ store.name }}</p>");
    }

    #[test]
    fn test_map_pages_stats_are_reproducible() {
        let m = mapper(|c| c.i18n = true);
        let pages = || {
            vec![
                Page::new("a.html", "<p>Sample</p>"),
                Page::new("b.html", "<h1>Hello</h1>"),
            ]
        };
        let (mapped, first) = m.map_pages(pages());
        let (_, second) = m.map_pages(pages());
        assert_eq!(first, second);
        assert_eq!(first.scrubbed, 1);
        // Checksums still describe the ingested markup
        assert_eq!(mapped[0].checksum, Page::new("a.html", "<p>Sample</p>").checksum);
    }
}
