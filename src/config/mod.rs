//! Project configuration management for `prototheme.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [build]
//! │   ├── ingest     # [ingest]
//! │   ├── mapper     # [mapper]
//! │   └── adapter    # [adapter]
//! ├── error          # ConfigError
//! └── mod.rs         # ThemeConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                            |
//! |--------------|----------------------------------------------------|
//! | `[build]`    | Input, output and state directories                |
//! | `[ingest]`   | File size limit, read timeout, read concurrency    |
//! | `[mapper]`   | Placeholders, client overlays, i18n, sanitization  |
//! | `[adapter]`  | Partials, incremental skip, baseline, layout hooks |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{AdapterConfig, BuildConfig, CategoryRule, IngestConfig, MapperConfig};

use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "prototheme.toml";

/// Root configuration structure representing prototheme.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub mapper: MapperConfig,

    #[serde(default)]
    pub adapter: AdapterConfig,
}

impl ThemeConfig {
    /// Load configuration from a file path.
    ///
    /// A missing file is not an error: defaults are used and the project
    /// root becomes the directory the file would live in.
    pub fn load(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let config_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        let root = config_path
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.config_path = config_path;
        config.finalize(&root);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a file on disk.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve every relative path against the project root.
    fn finalize(&mut self, root: &Path) {
        self.root = root.to_path_buf();
        for path in [
            &mut self.build.input,
            &mut self.build.output,
            &mut self.build.state_dir,
            &mut self.adapter.baselines_dir,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }

    /// Check invariants the pipeline relies on.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.concurrency == 0 {
            return Err(ConfigError::Validation(
                "ingest.concurrency must be at least 1".into(),
            ));
        }
        if self.ingest.read_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "ingest.read_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.build.input == self.build.output || self.build.output.starts_with(&self.build.input)
        {
            return Err(ConfigError::Validation(format!(
                "build.output `{}` must not live inside build.input `{}`",
                self.build.output.display(),
                self.build.input.display()
            )));
        }
        Ok(())
    }

    /// Build a config rooted at `root`, for tests and embedding.
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.finalize(root);
        config
    }

    /// Quarantine directory for unreadable input files.
    pub fn quarantine_dir(&self) -> PathBuf {
        self.build.state_dir.join("quarantine")
    }

    /// Replace input/output with command-line values, resolved against the
    /// project root, and re-check the directory invariants.
    pub fn override_paths(
        &mut self,
        input: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<(), ConfigError> {
        if let Some(input) = input {
            self.build.input = self.root.join(input);
        }
        if let Some(output) = output {
            self.build.output = self.root.join(output);
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_resolve_against_root() {
        let config = ThemeConfig::with_root(Path::new("/project"));
        assert_eq!(config.build.input, PathBuf::from("/project/prototype"));
        assert_eq!(config.build.output, PathBuf::from("/project/theme"));
        assert_eq!(
            config.quarantine_dir(),
            PathBuf::from("/project/.prototheme/quarantine")
        );
        assert!(!config.adapter.partialize);
        assert_eq!(config.ingest.concurrency, 8);
    }

    #[test]
    fn test_parse_with_ignored_reports_unknown_fields() {
        let toml = r#"
            [build]
            input = "site"
            typo = 1

            [mapper]
            i18n = true
        "#;
        let (config, ignored) = ThemeConfig::parse_with_ignored(toml).unwrap();
        assert_eq!(config.build.input, PathBuf::from("site"));
        assert!(config.mapper.i18n);
        assert_eq!(ignored, vec!["build.typo".to_string()]);
        // Untouched sections keep their defaults
        assert_eq!(config.mapper.scrub.get("Sample").unwrap(), "{{ store.name }}");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.build.output, dir.path().join("theme"));
    }

    #[test]
    fn test_load_rejects_output_inside_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[build]\ninput = \"site\"\noutput = \"site/theme\"\n").unwrap();
        assert!(ThemeConfig::load(&path).is_err());
    }

    #[test]
    fn test_override_paths() {
        let mut config = ThemeConfig::with_root(Path::new("/project"));
        config
            .override_paths(Some(Path::new("site")), Some(Path::new("/tmp/out")))
            .unwrap();
        assert_eq!(config.build.input, PathBuf::from("/project/site"));
        assert_eq!(config.build.output, PathBuf::from("/tmp/out"));

        let err = config.override_paths(None, Some(Path::new("site/dist")));
        assert!(matches!(err, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_client_overlay_and_categories_parse() {
        let toml = r#"
            [mapper.clients.acme]
            STORE_NAME = "{{ acme.brand }}"

            [[adapter.categories]]
            keyword = "promo"
            category = "hero"
        "#;
        let (config, ignored) = ThemeConfig::parse_with_ignored(toml).unwrap();
        assert!(ignored.is_empty());
        assert_eq!(
            config.mapper.clients["acme"]["STORE_NAME"],
            "{{ acme.brand }}"
        );
        assert_eq!(
            config.adapter.categories,
            vec![CategoryRule::new("promo", "hero")]
        );
    }
}
