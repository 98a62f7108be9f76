//! Template adaptation: turn mapped pages into the output theme tree.
//!
//! ```text
//! <output>/
//! ├── layout/base.html                  # shell with content + hook blocks
//! ├── pages/<relative path>             # {% extends %} + {% block content %}
//! ├── partials/<category>/<slug>.html   # shared components, written once
//! ├── assets/<kind>/<source path>       # copied, references rewritten
//! │   └── js/extracted/inline-NNN.js    # exported inline scripts
//! └── dependencies.json                 # extends / include edges
//! ```
//!
//! Everything is planned before the first write: the layout, every partial,
//! the asset plan and each page template. Writes then run once per target,
//! pages and assets in parallel. Every target goes through the [`Sandbox`];
//! an escape aborts the run with [`AdapterError::PathEscape`]. Asset copies
//! and script exports are best-effort.

mod assets;
mod baseline;
mod category;
mod deps;
mod page;
mod partial;
mod sandbox;
mod scaffold;
mod scripts;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

pub use deps::{DependencyEdge, EdgeKind};
pub use sandbox::Sandbox;

use crate::analyze::Analysis;
use crate::config::AdapterConfig;
use crate::dom::Document;
use crate::ingest::Page;
use crate::logger::ProgressLine;
use crate::utils::plural_count;
use crate::{debug, log};
use assets::{AssetPlanner, PlannedAsset};
use baseline::Baseline;
use category::CategoryResolver;
use partial::PartialPlan;
use scaffold::{LAYOUT_PATH, SCAFFOLD_DIRS};

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Target path leaves the output root
    #[error("path '{path}' escapes output root '{root}'")]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error("failed to write '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-run adapter switches.
#[derive(Debug, Clone, Default)]
pub struct AdaptOptions {
    pub skip_unchanged: bool,
    pub partialize: bool,
    pub baseline: Option<String>,
}

impl From<&AdapterConfig> for AdaptOptions {
    fn from(config: &AdapterConfig) -> Self {
        Self {
            skip_unchanged: config.skip_unchanged,
            partialize: config.partialize,
            baseline: config.baseline.clone(),
        }
    }
}

/// What one adapter run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdaptReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
    pub partials: Vec<String>,
    pub assets_copied: usize,
    pub scripts_exported: usize,
    pub edges: Vec<DependencyEdge>,
}

/// A page template ready to write.
struct PlannedPage {
    path: String,
    dest: PathBuf,
    content: String,
}

pub struct Adapter<'a> {
    config: &'a AdapterConfig,
    input_root: &'a Path,
    sandbox: Sandbox,
}

impl<'a> Adapter<'a> {
    pub fn new(config: &'a AdapterConfig, input_root: &'a Path, output_root: &Path) -> Self {
        Self {
            config,
            input_root,
            sandbox: Sandbox::new(output_root),
        }
    }

    /// Produce the output tree for `pages`.
    ///
    /// `unchanged` lists pages whose input matches the previous run; with
    /// `skip_unchanged` their existing outputs are left untouched.
    pub fn adapt(
        &self,
        pages: &[Page],
        analysis: &Analysis,
        unchanged: &BTreeSet<String>,
        options: &AdaptOptions,
    ) -> Result<AdaptReport, AdapterError> {
        let baseline = options
            .baseline
            .as_deref()
            .map(|name| Baseline::load(&self.config.baselines_dir, name))
            .unwrap_or_default();
        let hooks = scaffold::merge_hooks([self.config.hooks.as_slice(), baseline.hooks.as_slice()]);
        debug!("adapt"; "output root {}", self.sandbox.root().display());

        for dir in SCAFFOLD_DIRS {
            let path = self.sandbox.resolve(dir)?;
            fs::create_dir_all(&path).map_err(|source| AdapterError::Io { path, source })?;
        }

        // Parse once; pages that fail to parse take the degraded path
        let mut docs: Vec<Option<Document>> = pages
            .iter()
            .map(|page| match Document::parse(&page.markup) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    log!("adapt"; "{}: {}, using substring fallback", page.path, e);
                    None
                }
            })
            .collect();

        let mut planner = AssetPlanner::new(self.input_root, &self.sandbox);
        for (page, doc) in pages.iter().zip(docs.iter_mut()) {
            if let Some(doc) = doc {
                planner.rewrite_document(doc, page.dir())?;
            }
        }
        let assets = planner.finish()?;

        let partials = if options.partialize {
            let resolver = CategoryResolver::new(&baseline, &self.config.categories);
            let doc_refs: Vec<Option<&Document>> = docs.iter().map(Option::as_ref).collect();
            PartialPlan::build(&analysis.shared_components(), &doc_refs, &resolver)
        } else {
            PartialPlan::default()
        };

        let mut edges = BTreeSet::new();
        let mut planned_pages = Vec::with_capacity(pages.len());
        for (page, doc) in pages.iter().zip(docs) {
            let mut used = BTreeSet::new();
            let content = match doc {
                Some(mut doc) => {
                    partials.substitute(&mut doc.nodes, &mut used);
                    page::render_template(&doc)
                }
                None => page::render_raw(&partials.substitute_markup(&page.markup, &mut used)),
            };

            let rel = format!("pages/{}", page.path);
            edges.insert(DependencyEdge::new(&rel, LAYOUT_PATH, EdgeKind::Extends));
            for include in used {
                edges.insert(DependencyEdge::new(&rel, include, EdgeKind::Include));
            }
            planned_pages.push(PlannedPage {
                path: page.path.clone(),
                dest: self.sandbox.resolve(&rel)?,
                content,
            });
        }

        let mut partial_files = Vec::new();
        for partial in partials.partials() {
            for include in &partial.includes {
                edges.insert(DependencyEdge::new(&partial.rel, include, EdgeKind::Include));
            }
            debug!("adapt"; "partial {} ({})", partial.rel, partial.category);
            partial_files.push((self.sandbox.resolve(&partial.rel)?, &partial.content));
        }

        let extracted = scripts::extract(&analysis.scripts);
        let mut script_files = Vec::with_capacity(extracted.len());
        for script in &extracted {
            script_files.push((self.sandbox.resolve(&script.rel)?, &script.content));
        }

        let layout = scaffold::layout_shell(&hooks);
        let layout_dest = self.sandbox.resolve(LAYOUT_PATH)?;
        let deps_dest = self.sandbox.resolve(deps::DEPENDENCIES_FILE)?;

        // Everything is planned; write each target once
        write_output(&layout_dest, &layout)?;
        for (dest, content) in &partial_files {
            write_output(dest, content)?;
        }

        let progress = ProgressLine::new("adapt", &[("assets", assets.len()), ("pages", planned_pages.len())]);
        let assets_copied = copy_assets(&assets, &progress);
        let results: Vec<Result<(String, bool), AdapterError>> = planned_pages
            .par_iter()
            .map(|planned| {
                let skip = options.skip_unchanged
                    && unchanged.contains(&planned.path)
                    && planned.dest.is_file();
                if !skip {
                    write_output(&planned.dest, &planned.content)?;
                }
                progress.inc("pages");
                Ok((planned.path.clone(), !skip))
            })
            .collect();
        progress.finish();

        let mut report = AdaptReport {
            assets_copied,
            partials: partials.partials().iter().map(|p| p.rel.clone()).collect(),
            ..AdaptReport::default()
        };
        for result in results {
            let (path, written) = result?;
            if written {
                report.written.push(path);
            } else {
                report.skipped.push(path);
            }
        }

        for (dest, content) in &script_files {
            match write_output(dest, content) {
                Ok(()) => report.scripts_exported += 1,
                Err(e) => log!("adapt"; "script export failed: {}", e),
            }
        }

        report.edges = edges.into_iter().collect();
        let json = serde_json::to_string_pretty(&report.edges).unwrap_or_default();
        write_output(&deps_dest, &json)?;

        log!(
            "adapt";
            "{} written, {} skipped, {}, {} copied, {} exported",
            plural_count(report.written.len(), "page"),
            report.skipped.len(),
            plural_count(report.partials.len(), "partial"),
            plural_count(report.assets_copied, "asset"),
            plural_count(report.scripts_exported, "script"),
        );
        Ok(report)
    }
}

/// Copy planned assets in parallel. Failures are logged, never fatal.
fn copy_assets(assets: &[PlannedAsset], progress: &ProgressLine) -> usize {
    assets
        .par_iter()
        .filter(|asset| {
            let result = match &asset.content {
                Some(text) => write_output(&asset.dest, text),
                None => copy_file(&asset.source, &asset.dest),
            };
            progress.inc("assets");
            match result {
                Ok(()) => true,
                Err(e) => {
                    log!("adapt"; "asset {}: {}", asset.rel, e);
                    false
                }
            }
        })
        .count()
}

fn copy_file(source: &Path, dest: &Path) -> Result<(), AdapterError> {
    let io = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| AdapterError::Io { path, source }
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io(parent))?;
    }
    fs::copy(source, dest).map_err(io(dest))?;
    Ok(())
}

/// Write text, creating parents and skipping identical content.
fn write_output(path: &Path, content: &str) -> Result<(), AdapterError> {
    if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
        return Ok(());
    }
    let io = |source: std::io::Error| AdapterError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, content).map_err(io)
}
