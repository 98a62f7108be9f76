//! Asset normalization.
//!
//! Local references are resolved against the referencing file's source
//! directory (or the input root for `/`-absolute references), planned for
//! copying into `assets/<kind>/`, and rewritten to `/assets/<kind>/…`.
//! Stylesheets are planned recursively: their own `url(…)` references are
//! rewritten relative to the stylesheet.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use super::{AdapterError, Sandbox};
use crate::debug;
use crate::dom::{Document, Element, Node};
use crate::utils::path::{is_external_link, lexical_normalize, split_suffix, to_slash};
use crate::utils::template::has_template_syntax;

/// Characters escaped when a file name goes back into a URL path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssetKind {
    Css,
    Js,
    Images,
    Fonts,
    Media,
    Misc,
}

impl AssetKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "css" => Self::Css,
            "js" | "mjs" => Self::Js,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "avif" | "ico" => Self::Images,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => Self::Fonts,
            "mp4" | "webm" | "mp3" | "ogg" | "wav" => Self::Media,
            _ => Self::Misc,
        }
    }

    pub const fn dir(self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Images => "images",
            Self::Fonts => "fonts",
            Self::Media => "media",
            Self::Misc => "misc",
        }
    }
}

/// One file to place in the output tree.
#[derive(Debug, Clone)]
pub struct PlannedAsset {
    pub source: PathBuf,
    pub dest: PathBuf,
    /// Source-relative path, `/`-separated.
    pub rel: String,
    pub kind: AssetKind,
    /// Rewritten stylesheet text; `None` means a byte copy.
    pub content: Option<String>,
}

/// Collects asset copies while rewriting references.
pub struct AssetPlanner<'a> {
    input_root: &'a Path,
    sandbox: &'a Sandbox,
    planned: BTreeMap<PathBuf, PlannedAsset>,
}

impl<'a> AssetPlanner<'a> {
    pub fn new(input_root: &'a Path, sandbox: &'a Sandbox) -> Self {
        Self {
            input_root,
            sandbox,
            planned: BTreeMap::new(),
        }
    }

    /// Rewrite every local reference in a page; `base_dir` is the page's
    /// input-relative directory.
    pub fn rewrite_document(&mut self, doc: &mut Document, base_dir: &str) -> Result<(), AdapterError> {
        let mut result = Ok(());
        doc.for_each_element_mut(|elem| {
            if result.is_ok() {
                result = self.rewrite_element(elem, base_dir);
            }
        });
        result
    }

    fn rewrite_element(&mut self, elem: &mut Element, base_dir: &str) -> Result<(), AdapterError> {
        let navigational = matches!(elem.name.as_str(), "a" | "area" | "form");

        let mut updates = Vec::new();
        for (name, value) in elem.attrs() {
            let Some(value) = value else {
                continue;
            };
            let rewritten = match name {
                "src" | "poster" | "data-src" => self.rewrite_reference(value, base_dir)?,
                "href" if !navigational => self.rewrite_reference(value, base_dir)?,
                "style" => Some(self.rewrite_css(value, base_dir)?).filter(|css| css != value),
                _ => None,
            };
            if let Some(rewritten) = rewritten {
                updates.push((name.to_string(), rewritten));
            }
        }
        for (name, value) in updates {
            elem.set_attr(&name, value);
        }

        if elem.name == "style" {
            for child in &mut elem.children {
                if let Node::Text(css) = child {
                    *css = self.rewrite_css(css, base_dir)?;
                }
            }
        }
        Ok(())
    }

    /// Rewrite every `url(…)` in a stylesheet.
    pub fn rewrite_css(&mut self, css: &str, base_dir: &str) -> Result<String, AdapterError> {
        let mut out = String::with_capacity(css.len());
        let mut rest = css;

        while let Some(start) = find_url_open(rest) {
            let open = start + 4;
            let Some(len) = rest[open..].find(')') else {
                break;
            };
            let inner = &rest[open..open + len];
            let trimmed = inner.trim();
            let (quote, reference) = match trimmed.chars().next() {
                Some(q @ ('"' | '\'')) => (Some(q), trimmed.trim_matches(q)),
                _ => (None, trimmed),
            };

            out.push_str(&rest[..open]);
            match self.rewrite_reference(reference, base_dir)? {
                Some(new) => {
                    let q = quote.map(String::from).unwrap_or_default();
                    out.push_str(&format!("{q}{new}{q}"));
                }
                None => out.push_str(inner),
            }
            out.push(')');
            rest = &rest[open + len + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Plan one reference. `Ok(None)` leaves it untouched (not local, or the
    /// source file is missing); escaping the output tree is an error.
    pub fn rewrite_reference(&mut self, reference: &str, base_dir: &str) -> Result<Option<String>, AdapterError> {
        let reference = reference.trim();
        if reference.is_empty()
            || reference.starts_with('#')
            || is_external_link(reference)
            || has_template_syntax(reference)
        {
            return Ok(None);
        }
        let (path, suffix) = split_suffix(reference);
        if path.is_empty() || is_page(path) {
            return Ok(None);
        }

        let decoded = percent_decode_str(path).decode_utf8_lossy();
        let joined = match decoded.strip_prefix('/') {
            Some(absolute) => PathBuf::from(absolute),
            None => Path::new(base_dir).join(&*decoded),
        };

        let kind = AssetKind::from_path(&joined);
        let dest = self
            .sandbox
            .scoped(&Path::new("assets").join(kind.dir()), &joined)?;
        let rel = lexical_normalize(&joined).unwrap_or_default();

        let source = self.input_root.join(&rel);
        if !source.is_file() {
            debug!("adapt"; "missing asset {}, reference kept", to_slash(&rel));
            return Ok(None);
        }

        let rel = to_slash(&rel);
        let url = format!(
            "/assets/{}/{}{}",
            kind.dir(),
            utf8_percent_encode(&rel, PATH_SEGMENT),
            suffix
        );
        self.planned.entry(dest.clone()).or_insert(PlannedAsset {
            source,
            dest,
            rel,
            kind,
            content: None,
        });
        Ok(Some(url))
    }

    /// Finish planning: rewrite planned stylesheets (which may plan more
    /// assets) and return the plan sorted by destination.
    pub fn finish(mut self) -> Result<Vec<PlannedAsset>, AdapterError> {
        loop {
            let pending: Vec<PathBuf> = self
                .planned
                .values()
                .filter(|a| a.kind == AssetKind::Css && a.content.is_none())
                .map(|a| a.dest.clone())
                .collect();
            if pending.is_empty() {
                break;
            }

            for dest in pending {
                let Some(asset) = self.planned.get(&dest) else {
                    continue;
                };
                let (source, rel) = (asset.source.clone(), asset.rel.clone());
                let text = match fs::read_to_string(&source) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("adapt"; "copying {} unchanged: {}", rel, e);
                        String::from_utf8_lossy(&fs::read(&source).unwrap_or_default()).into_owned()
                    }
                };
                let base_dir = rel.rsplit_once('/').map_or("", |(dir, _)| dir).to_string();
                let rewritten = self.rewrite_css(&text, &base_dir)?;
                if let Some(asset) = self.planned.get_mut(&dest) {
                    asset.content = Some(rewritten);
                }
            }
        }
        Ok(self.planned.into_values().collect())
    }
}

/// Links to other pages are template routes, not assets.
fn is_page(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

/// Position of the next `url(`, case-insensitive.
fn find_url_open(css: &str) -> Option<usize> {
    css.as_bytes()
        .windows(4)
        .position(|w| w.eq_ignore_ascii_case(b"url("))
}
