//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! input = "prototype"        # Directory of static HTML files
//! output = "theme"           # Generated theme package
//! state_dir = ".prototheme"  # Caches, last-run record, quarantine
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source tree of HTML prototypes (relative to project root).
    pub input: PathBuf,

    /// Output directory for the theme package (relative to project root).
    pub output: PathBuf,

    /// Run state directory (relative to project root).
    pub state_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input: "prototype".into(),
            output: "theme".into(),
            state_dir: ".prototheme".into(),
        }
    }
}
