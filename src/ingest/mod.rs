//! Ingest: read raw HTML prototypes and normalize them into pages.
//!
//! ```text
//! input/ ──scan──> [files] ──read (bounded, timed)──> normalize ──> pages
//!                                   │
//!                                   └── failure ──> failed (+ quarantine copy)
//! ```
//!
//! A single bad file never fails the batch: it shows up in `failed` and
//! nowhere else.

mod normalize;
mod quarantine;
mod read;
mod scan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::config::IngestConfig;
use crate::freshness::ContentHash;
use crate::utils::plural_count;
use crate::log;

pub use read::FileReader;

/// A fully parsed, normalized input page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Path relative to the input root, `/`-separated.
    pub path: String,
    pub markup: String,
    /// Checksum of the normalized markup.
    pub checksum: ContentHash,
}

impl Page {
    pub fn new(path: impl Into<String>, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        Self {
            path: path.into(),
            checksum: ContentHash::of(&markup),
            markup,
        }
    }

    /// Directory part of the relative path (`""` for top-level pages).
    pub fn dir(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(dir, _)| dir)
    }
}

/// Why a file did not become a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailReason {
    Oversized { size: u64, limit: u64 },
    Unreadable { message: String },
    TimedOut,
    InvalidUtf8,
    Malformed { message: String },
}

impl FailReason {
    /// Whether the original file is copied aside for human review.
    pub fn quarantines(&self) -> bool {
        matches!(self, Self::TimedOut | Self::InvalidUtf8 | Self::Malformed { .. })
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Oversized { size, limit } => write!(f, "{size} bytes exceeds limit of {limit}"),
            Self::Unreadable { message } => write!(f, "unreadable: {message}"),
            Self::TimedOut => write!(f, "read timed out"),
            Self::InvalidUtf8 => write!(f, "not valid UTF-8"),
            Self::Malformed { message } => write!(f, "malformed markup: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: FailReason,
}

/// Parser output: both lists sorted by path.
#[derive(Debug, Clone, Default)]
pub struct IngestOutput {
    pub pages: Vec<Page>,
    pub failed: Vec<FailedFile>,
}

/// Reads an input tree with bounded parallelism and per-file timeouts.
pub struct Ingestor {
    settings: IngestConfig,
    quarantine_dir: PathBuf,
    reader: FileReader,
}

impl Ingestor {
    pub fn new(settings: IngestConfig, quarantine_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            quarantine_dir: quarantine_dir.into(),
            reader: read::fs_reader(),
        }
    }

    /// Replace the byte reader (tests use this to simulate stalls).
    #[cfg(test)]
    pub fn with_reader(mut self, reader: FileReader) -> Self {
        self.reader = reader;
        self
    }

    /// Read and normalize every HTML file under `root`.
    pub fn ingest(&self, root: &Path) -> Result<IngestOutput> {
        if !root.is_dir() {
            bail!("input directory `{}` does not exist", root.display());
        }

        let files = scan::html_files(root);
        log!("ingest"; "reading {}", plural_count(files.len(), "file"));

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.settings.concurrency.clamp(1, 16))
            .enable_time()
            .build()
            .context("failed to start ingest runtime")?;

        let outcomes = runtime.block_on(read::read_all(
            files,
            &self.settings,
            Arc::clone(&self.reader),
        ));
        // Stalled reads may still be running; do not wait for them.
        runtime.shutdown_background();

        let mut output = IngestOutput::default();
        for (file, outcome) in outcomes {
            match outcome {
                Ok(page) => output.pages.push(page),
                Err(reason) => {
                    log!("ingest"; "skipping {}: {}", file.rel, reason);
                    if reason.quarantines() {
                        quarantine::isolate(&file.abs, &self.quarantine_dir, &file.rel);
                    }
                    output.failed.push(FailedFile {
                        path: file.rel,
                        reason,
                    });
                }
            }
        }

        output.pages.sort_by(|a, b| a.path.cmp(&b.path));
        output.failed.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(output)
    }
}
