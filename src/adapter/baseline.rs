//! Baseline reference theme: category taxonomy, dependency graph, hooks.
//!
//! ```text
//! <baselines_dir>/<name>/
//! ├── categories.json         # [{ "name": "header", "keywords": ["nav"] }]
//! ├── dependency-graph.json   # { "nodes": [...], "edges": [{ "from", "to" }] }
//! └── hooks.json              # ["before_footer", ...]
//! ```
//!
//! Every document is optional. Missing or unreadable ones degrade to the
//! keyword heuristics.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{debug, log};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BaselineCategory {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    /// Every path mentioned by a node or an edge endpoint.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .map(String::as_str)
            .chain(self.edges.iter().flat_map(|e| [e.from.as_str(), e.to.as_str()]))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Baseline {
    pub categories: Vec<BaselineCategory>,
    pub graph: DependencyGraph,
    pub hooks: Vec<String>,
}

impl Baseline {
    /// Load a named baseline. Absence is logged, never an error.
    pub fn load(baselines_dir: &Path, name: &str) -> Self {
        let dir = baselines_dir.join(name);
        if !dir.is_dir() {
            log!("adapt"; "baseline `{}` not found, using keyword categories", name);
            return Self::default();
        }
        Self {
            categories: read_document(&dir, "categories.json").unwrap_or_default(),
            graph: read_document(&dir, "dependency-graph.json").unwrap_or_default(),
            hooks: read_document(&dir, "hooks.json").unwrap_or_default(),
        }
    }
}

fn read_document<T: DeserializeOwned>(dir: &Path, file: &str) -> Option<T> {
    let path = dir.join(file);
    let Ok(text) = fs::read_to_string(&path) else {
        debug!("adapt"; "baseline {} unavailable", path.display());
        return None;
    };
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            log!("adapt"; "ignoring baseline {}: {}", file, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_full_baseline() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("dawn");
        fs::create_dir_all(&base).unwrap();
        fs::write(
            base.join("categories.json"),
            r#"[{ "name": "navigation", "keywords": ["menu"] }]"#,
        )
        .unwrap();
        fs::write(
            base.join("dependency-graph.json"),
            r#"{ "nodes": ["partials/sections/promo.html"], "edges": [{ "from": "pages/index.html", "to": "partials/cards/tile.html" }] }"#,
        )
        .unwrap();
        fs::write(base.join("hooks.json"), r#"["before_footer"]"#).unwrap();

        let baseline = Baseline::load(dir.path(), "dawn");
        assert_eq!(baseline.categories[0].name, "navigation");
        assert_eq!(baseline.graph.paths().count(), 3);
        assert_eq!(baseline.hooks, vec!["before_footer"]);
    }

    #[test]
    fn test_missing_and_corrupt_documents_degrade() {
        let dir = TempDir::new().unwrap();
        assert!(Baseline::load(dir.path(), "nope").categories.is_empty());

        let base = dir.path().join("broken");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("categories.json"), "{").unwrap();
        let baseline = Baseline::load(dir.path(), "broken");
        assert!(baseline.categories.is_empty());
        assert!(baseline.graph.nodes.is_empty());
    }
}
