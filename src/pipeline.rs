//! Conversion driver.
//!
//! ```text
//! Idle -> Parsing -> Analyzing -> Mapping -> Adapting -> Done
//! ```
//!
//! Stages run strictly in order over the in-memory page list. There are no
//! retries; a failed stage ends the run with its error.

use std::fmt;

use anyhow::{Context, Result};

use crate::{
    adapter::{AdaptOptions, AdaptReport, Adapter},
    analyze::Analyzer,
    config::{AdapterConfig, MapperConfig, ThemeConfig},
    debug,
    ingest::{FailedFile, Ingestor},
    log,
    mapper::{Mapper, SemanticStats},
    utils::plural_count,
};

/// Per-invocation switches layered over `prototheme.toml`.
///
/// Boolean flags can only turn a feature on; `client` and `baseline`
/// replace the configured value when present.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub i18n: bool,
    pub client: Option<String>,
    pub sanitize: bool,
    pub partialize: bool,
    pub skip_unchanged: bool,
    pub baseline: Option<String>,
}

impl ConvertOptions {
    fn mapper_config(&self, base: &MapperConfig) -> MapperConfig {
        let mut config = base.clone();
        config.i18n |= self.i18n;
        config.sanitize |= self.sanitize;
        if self.client.is_some() {
            config.client.clone_from(&self.client);
        }
        config
    }

    fn adapter_config(&self, base: &AdapterConfig) -> AdapterConfig {
        let mut config = base.clone();
        config.partialize |= self.partialize;
        config.skip_unchanged |= self.skip_unchanged;
        if self.baseline.is_some() {
            config.baseline.clone_from(&self.baseline);
        }
        config
    }
}

/// Summary of one conversion run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub pages: usize,
    pub failed: Vec<FailedFile>,
    pub cache_hit: bool,
    pub unchanged: usize,
    pub conflicts: usize,
    pub confidence: f64,
    pub stats: SemanticStats,
    pub adapt: AdaptReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Parsing,
    Analyzing,
    Mapping,
    Adapting,
    Done,
}

impl Stage {
    /// Move to `next`, logging the transition in verbose mode.
    fn enter(&mut self, next: Stage) {
        debug!("pipeline"; "{} -> {}", self, next);
        *self = next;
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::Analyzing => "analyzing",
            Self::Mapping => "mapping",
            Self::Adapting => "adapting",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Convert the prototype tree at `config.build.input` into a theme package
/// at `config.build.output`.
pub fn convert(config: &ThemeConfig, options: &ConvertOptions) -> Result<BuildReport> {
    let mapper_config = options.mapper_config(&config.mapper);
    let adapter_config = options.adapter_config(&config.adapter);
    let mut stage = Stage::Idle;

    stage.enter(Stage::Parsing);
    let ingested = Ingestor::new(config.ingest.clone(), config.quarantine_dir())
        .ingest(&config.build.input)
        .context("failed to read input tree")?;

    stage.enter(Stage::Analyzing);
    let outcome =
        Analyzer::new(&config.build.state_dir).analyze(&ingested.pages, ingested.failed, None);

    stage.enter(Stage::Mapping);
    let mapper = Mapper::new(&mapper_config).context("failed to build semantic mapper")?;
    let (pages, stats) = mapper.map_pages(ingested.pages);
    log!("map"; "{}", stats);

    stage.enter(Stage::Adapting);
    let adapter = Adapter::new(&adapter_config, &config.build.input, &config.build.output);
    let adapt = adapter
        .adapt(
            &pages,
            &outcome.analysis,
            &outcome.unchanged,
            &AdaptOptions::from(&adapter_config),
        )
        .with_context(|| {
            format!(
                "failed to write theme into `{}`",
                config.build.output.display()
            )
        })?;

    stage.enter(Stage::Done);
    let report = BuildReport {
        pages: pages.len(),
        failed: outcome.failed,
        cache_hit: outcome.cache_hit,
        unchanged: outcome.unchanged.len(),
        conflicts: outcome.analysis.conflicts.len(),
        confidence: outcome.analysis.confidence,
        stats,
        adapt,
    };
    log!(
        "done";
        "{} converted, {} failed, confidence {:.2}",
        plural_count(report.pages, "page"),
        report.failed.len(),
        report.confidence
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> (TempDir, ThemeConfig) {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig::with_root(dir.path());
        fs::create_dir_all(&config.build.input).unwrap();
        for (rel, content) in files {
            let path = config.build.input.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (dir, config)
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel)).unwrap()
    }

    #[test]
    fn test_stage_order_display() {
        let mut stage = Stage::Idle;
        for next in [Stage::Parsing, Stage::Analyzing, Stage::Mapping, Stage::Adapting, Stage::Done] {
            stage.enter(next);
        }
        assert_eq!(stage, Stage::Done);
        assert_eq!(Stage::Analyzing.to_string(), "analyzing");
    }

    #[test]
    fn test_options_layer_over_config() {
        let mut base = MapperConfig::default();
        base.client = Some("acme".into());
        let options = ConvertOptions {
            sanitize: true,
            ..ConvertOptions::default()
        };
        let merged = options.mapper_config(&base);
        assert!(merged.sanitize);
        assert!(!merged.i18n);
        assert_eq!(merged.client.as_deref(), Some("acme"));

        let options = ConvertOptions {
            baseline: Some("dawn".into()),
            partialize: true,
            ..ConvertOptions::default()
        };
        let merged = options.adapter_config(&AdapterConfig::default());
        assert!(merged.partialize);
        assert_eq!(merged.baseline.as_deref(), Some("dawn"));
    }

    #[test]
    fn test_convert_shared_hero() {
        let hero = |text: &str| {
            format!(
                "<html><body><section class=\"hero banner\"><h1>Hi</h1></section><p>{text}</p></body></html>"
            )
        };
        let (_dir, config) = project(&[("a.html", &hero("a")), ("b.html", &hero("b"))]);
        let options = ConvertOptions {
            partialize: true,
            ..ConvertOptions::default()
        };
        let report = convert(&config, &options).unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.adapt.partials, vec!["partials/hero/banner-hero.html"]);
        let out = &config.build.output;
        assert!(out.join("partials/hero/banner-hero.html").is_file());
        for page in ["pages/a.html", "pages/b.html"] {
            let html = read(out, page);
            assert!(html.starts_with(r#"{% extends "layout/base.html" %}"#));
            assert_eq!(
                html.matches(r#"{% include "partials/hero/banner-hero.html" %}"#).count(),
                1
            );
        }
    }

    #[test]
    fn test_convert_scrubs_and_sanitizes() {
        let (_dir, config) = project(&[(
            "index.html",
            r#"<p>Sample Store</p><button onclick="doThing()">Go</button>"#,
        )]);
        let options = ConvertOptions {
            sanitize: true,
            ..ConvertOptions::default()
        };
        let report = convert(&config, &options).unwrap();

        assert_eq!(report.stats.scrubbed, 1);
        assert_eq!(report.stats.handlers_removed, 1);
        let html = read(&config.build.output, "pages/index.html");
        assert!(html.contains("<p>{{ store.name }} Store</p>"));
        assert!(html.contains("<button>Go</button>"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn test_second_run_hits_cache_and_skips() {
        let (_dir, config) = project(&[("a.html", "<p>a</p>"), ("shop/b.html", "<p>b</p>")]);
        let options = ConvertOptions {
            skip_unchanged: true,
            ..ConvertOptions::default()
        };

        let first = convert(&config, &options).unwrap();
        assert!(!first.cache_hit);
        assert_eq!(first.unchanged, 0);
        assert_eq!(first.adapt.written.len(), 2);

        let second = convert(&config, &options).unwrap();
        assert!(second.cache_hit);
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.adapt.skipped, vec!["a.html", "shop/b.html"]);
        assert!(config.build.state_dir.join("last-run.json").is_file());
        assert!(config.build.state_dir.join("conflicts.txt").is_file());
    }

    #[test]
    fn test_inline_script_exported_verbatim() {
        let body = "\ndocument.addEventListener(\"DOMContentLoaded\", () => {\n  if (a<b && c>d) { el.innerHTML = \"<b>hi</b></div>\"; }\n});\n";
        let (_dir, config) = project(&[(
            "index.html",
            &format!("<html><body><script>{body}</script><p>after</p></body></html>"),
        )]);
        let report = convert(&config, &ConvertOptions::default()).unwrap();
        assert_eq!(report.pages, 1);

        let exported = read(&config.build.output, "assets/js/extracted/inline-001.js");
        assert_eq!(
            exported,
            format!(
                "// extracted: index.html script 0 ({} bytes, dom-ready: true)\n{}\n",
                body.len(),
                body.trim_end()
            )
        );
        assert!(read(&config.build.output, "pages/index.html").contains("<p>after</p>"));
    }

    #[test]
    fn test_failed_file_does_not_stop_run() {
        let (_dir, mut config) = project(&[("ok.html", "<p>fine</p>")]);
        fs::write(config.build.input.join("big.html"), "x".repeat(64)).unwrap();
        config.ingest.max_file_size = 32;

        let report = convert(&config, &ConvertOptions::default()).unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "big.html");
        assert!(config.build.output.join("pages/ok.html").is_file());
        assert!(!config.build.output.join("pages/big.html").exists());
    }

    #[test]
    fn test_escaping_reference_fails_run() {
        let (_dir, config) = project(&[("index.html", r#"<img src="../../secret">"#)]);
        let err = convert(&config, &ConvertOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("escapes"));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = ThemeConfig::with_root(dir.path());
        assert!(convert(&config, &ConvertOptions::default()).is_err());
    }
}
