//! `[adapter]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [adapter]
//! partialize = true
//! skip_unchanged = true
//! baseline = "dawn"               # Looked up under `baselines_dir`
//! baselines_dir = "baselines"
//! hooks = ["before_footer"]       # Extra `{% block hook_* %}` in the layout
//!
//! [[adapter.categories]]
//! keyword = "promo"
//! category = "hero"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Extract shared components into partials.
    pub partialize: bool,

    /// Leave outputs of unchanged pages untouched.
    pub skip_unchanged: bool,

    /// Name of the reference theme used for partial categorization.
    pub baseline: Option<String>,

    /// Directory holding one subdirectory per baseline theme.
    pub baselines_dir: PathBuf,

    /// Hook block names added to the layout shell.
    pub hooks: Vec<String>,

    /// Keyword fallback for partial categories, checked in order.
    pub categories: Vec<CategoryRule>,
}

/// Signature keyword -> partial category bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub keyword: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(keyword: &str, category: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            category: category.to_string(),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            partialize: false,
            skip_unchanged: false,
            baseline: None,
            baselines_dir: "baselines".into(),
            hooks: Vec::new(),
            categories: default_categories(),
        }
    }
}

/// Built-in keyword table used when no baseline matches.
pub fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("header", "header"),
        CategoryRule::new("nav", "header"),
        CategoryRule::new("menu", "header"),
        CategoryRule::new("footer", "footer"),
        CategoryRule::new("hero", "hero"),
        CategoryRule::new("banner", "hero"),
        CategoryRule::new("product", "product"),
        CategoryRule::new("card", "product"),
    ]
}
