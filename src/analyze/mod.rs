//! Change-aware structural analysis.
//!
//! ```text
//! pages ──manifest hash──> snapshot cache ──hit──> Analysis (no scan)
//!                               │
//!                               └─miss─> per page: scan cache or scan_page()
//!                                          └─> global reduction ──> Analysis
//! ```
//!
//! The snapshot cache is keyed by the hash over every `(path, checksum)`
//! pair; page scans are keyed by content. A changed page therefore costs one
//! rescan, while the reduction (conflicts, shared flags, confidence) is
//! always recomputed over the whole page set.
//!
//! Change detection against the previous run is per-run state and lives in
//! [`AnalyzeOutcome`], next to the cached [`Analysis`].

mod component;
pub mod conflict;
mod css;
mod hints;
mod scan;
mod script;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

pub use component::{Component, signature_key};
pub use conflict::ConflictRecord;
pub use css::CssMap;
pub use scan::PageScan;
pub use script::InlineScript;

use crate::cache::{
    ANALYSIS_DIR, ContentStore, LastRunRecord, PAGES_DIR, persist_conflict_summary,
    restore_last_run, unchanged_pages,
};
use crate::freshness::{ContentHash, manifest_hash};
use crate::ingest::{FailedFile, Page};
use crate::utils::{plural_count, plural_s};
use crate::{debug, log};

/// Page -> its components in document order.
pub type LayoutMap = BTreeMap<String, Vec<Component>>;

/// Everything determined by the input snapshot. Cached as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub conflicts: Vec<ConflictRecord>,
    /// Page -> template hints (pages without hints are absent).
    pub hints: BTreeMap<String, Vec<String>>,
    /// Page -> layout declarations from inline styles.
    pub css: BTreeMap<String, CssMap>,
    /// Page -> inline scripts.
    pub scripts: BTreeMap<String, Vec<InlineScript>>,
    pub layout: LayoutMap,
    /// Signature key -> global occurrence count.
    pub occurrences: BTreeMap<String, usize>,
    /// Fraction of pages with at least one hint.
    pub confidence: f64,
}

impl Analysis {
    /// Signatures occurring at least twice, with the first occurrence in
    /// page order as representative.
    pub fn shared_components(&self) -> Vec<&Component> {
        let mut seen = BTreeSet::new();
        self.layout
            .values()
            .flatten()
            .filter(|c| c.shared && seen.insert(signature_key(&c.signature)))
            .collect()
    }
}

/// Result of one analyzer run.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub analysis: Analysis,
    /// Pages whose checksum matches the previous run.
    pub unchanged: BTreeSet<String>,
    /// Files the ingest stage could not turn into pages.
    pub failed: Vec<FailedFile>,
    pub cache_hit: bool,
}

/// Analyzer with a two-layer cache under `<state_dir>/cache`.
pub struct Analyzer {
    state_dir: PathBuf,
    snapshots: ContentStore<Analysis>,
    scans: ContentStore<PageScan>,
    full_analyses: AtomicUsize,
    page_scans: AtomicUsize,
}

impl Analyzer {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        let cache_dir = state_dir.join("cache");
        Self {
            snapshots: ContentStore::new(cache_dir.join(ANALYSIS_DIR)),
            scans: ContentStore::new(cache_dir.join(PAGES_DIR)),
            state_dir,
            full_analyses: AtomicUsize::new(0),
            page_scans: AtomicUsize::new(0),
        }
    }

    /// Snapshot misses handled by this analyzer.
    pub fn full_analyses(&self) -> usize {
        self.full_analyses.load(Ordering::Relaxed)
    }

    /// Pages scanned (per-page cache misses) by this analyzer.
    pub fn page_scans(&self) -> usize {
        self.page_scans.load(Ordering::Relaxed)
    }

    /// Analyze a page set.
    ///
    /// `tree_checksum` overrides the manifest hash computed from `pages`.
    /// History problems never fail the run: an unreadable previous record
    /// means nothing is unchanged, and persistence errors are only logged.
    pub fn analyze(
        &self,
        pages: &[Page],
        failed: Vec<FailedFile>,
        tree_checksum: Option<ContentHash>,
    ) -> AnalyzeOutcome {
        let previous = restore_last_run(&self.state_dir);
        if previous.is_none() {
            debug!("analyze"; "no previous run recorded");
        }
        let unchanged = unchanged_pages(previous.as_ref(), pages);

        let key = tree_checksum
            .unwrap_or_else(|| manifest_hash(pages.iter().map(|p| (p.path.as_str(), &p.checksum))));

        let (analysis, cache_hit) = match self.snapshots.get(&key) {
            Some(analysis) => {
                debug!("analyze"; "snapshot {} cached", key);
                (analysis, true)
            }
            None => {
                let analysis = self.full_analysis(pages);
                self.snapshots.put(key, &analysis);
                (analysis, false)
            }
        };

        self.persist_run(pages, &analysis);
        log_summary(pages.len(), &analysis, &unchanged, cache_hit);

        AnalyzeOutcome {
            analysis,
            unchanged,
            failed,
            cache_hit,
        }
    }

    fn full_analysis(&self, pages: &[Page]) -> Analysis {
        self.full_analyses.fetch_add(1, Ordering::Relaxed);

        // Fan out: one scan per page, reused when the content was seen before
        let scans: Vec<PageScan> = pages.iter().map(|page| self.page_scan(page)).collect();

        // Fan in: every page observed before any shared flag is decided
        let occurrences =
            component::count_occurrences(scans.iter().map(|s| s.components.as_slice()));

        let mut analysis = Analysis {
            conflicts: conflict::detect(pages),
            ..Analysis::default()
        };
        for (page, scan) in pages.iter().zip(scans) {
            let mut page_hints = scan.hints;
            page_hints.extend(hints::detect(&page.path));
            page_hints.sort();
            page_hints.dedup();
            if !page_hints.is_empty() {
                analysis.hints.insert(page.path.clone(), page_hints);
            }
            if !scan.css.is_empty() {
                analysis.css.insert(page.path.clone(), scan.css);
            }
            if !scan.scripts.is_empty() {
                analysis.scripts.insert(page.path.clone(), scan.scripts);
            }
            let components = scan
                .components
                .iter()
                .map(|c| Component::place(c, &page.path, &occurrences))
                .collect();
            analysis.layout.insert(page.path.clone(), components);
        }

        analysis.confidence = if pages.is_empty() {
            0.0
        } else {
            analysis.hints.len() as f64 / pages.len() as f64
        };
        analysis.occurrences = occurrences;
        analysis
    }

    fn page_scan(&self, page: &Page) -> PageScan {
        if let Some(scan) = self.scans.get(&page.checksum) {
            return scan;
        }
        self.page_scans.fetch_add(1, Ordering::Relaxed);
        let scan = scan::scan_page(&page.markup);
        self.scans.put(page.checksum, &scan);
        scan
    }

    fn persist_run(&self, pages: &[Page], analysis: &Analysis) {
        let record = LastRunRecord {
            confidence: analysis.confidence,
            conflicts: analysis.conflicts.clone(),
            hints: analysis.hints.clone(),
            ..LastRunRecord::new(pages)
        };
        if let Err(e) = record.persist(&self.state_dir) {
            log!("analyze"; "failed to record run: {}", e);
        }
        if let Err(e) = persist_conflict_summary(&analysis.conflicts, &self.state_dir) {
            log!("analyze"; "failed to write conflict summary: {}", e);
        }
    }
}

fn log_summary(pages: usize, analysis: &Analysis, unchanged: &BTreeSet<String>, cache_hit: bool) {
    let shared = analysis.occurrences.values().filter(|n| **n >= 2).count();
    log!(
        "analyze";
        "{}{}, {} shared component{}, {}, confidence {:.2}",
        plural_count(pages, "page"),
        if cache_hit { " (cached)" } else { "" },
        shared,
        plural_s(shared),
        plural_count(analysis.conflicts.len(), "conflict"),
        analysis.confidence
    );
    if !unchanged.is_empty() {
        debug!("analyze"; "{} unchanged since last run", plural_count(unchanged.len(), "page"));
    }
    for conflict in &analysis.conflicts {
        log!("analyze"; "{}: {}", conflict.kind, conflict.paths.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pages() -> Vec<Page> {
        vec![
            Page::new(
                "index.html",
                r#"<section class="hero banner"><h1>Shop</h1></section><footer class="site-footer">c</footer>"#,
            ),
            Page::new(
                "shop/product.html",
                r#"<section class="banner hero"><h1>Product</h1></section><div class="gallery">g</div>"#,
            ),
        ]
    }

    #[test]
    fn test_same_snapshot_is_analyzed_once() {
        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path());
        let pages = pages();

        let first = analyzer.analyze(&pages, Vec::new(), None);
        let second = analyzer.analyze(&pages, Vec::new(), None);

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.analysis, second.analysis);
        assert_eq!(analyzer.full_analyses(), 1);
        assert_eq!(analyzer.page_scans(), 2);
    }

    #[test]
    fn test_snapshot_cache_survives_restart() {
        let dir = TempDir::new().unwrap();
        let pages = pages();
        let first = Analyzer::new(dir.path()).analyze(&pages, Vec::new(), None);

        let analyzer = Analyzer::new(dir.path());
        let second = analyzer.analyze(&pages, Vec::new(), None);
        assert!(second.cache_hit);
        assert_eq!(analyzer.full_analyses(), 0);
        assert_eq!(first.analysis, second.analysis);
    }

    #[test]
    fn test_explicit_tree_checksum_is_the_key() {
        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path());
        let key = ContentHash::of("snapshot-1");

        let first = analyzer.analyze(&pages(), Vec::new(), Some(key));
        // Same key returns the stored model verbatim, whatever is passed in
        let second = analyzer.analyze(&[], Vec::new(), Some(key));
        assert!(second.cache_hit);
        assert_eq!(first.analysis, second.analysis);
    }

    #[test]
    fn test_changed_page_rescans_only_that_page() {
        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path());
        let mut pages = pages();
        analyzer.analyze(&pages, Vec::new(), None);

        pages[1] = Page::new("shop/product.html", r#"<div class="gallery">new</div>"#);
        let outcome = analyzer.analyze(&pages, Vec::new(), None);

        assert!(!outcome.cache_hit);
        assert_eq!(analyzer.full_analyses(), 2);
        assert_eq!(analyzer.page_scans(), 3);
        // The reduction is recomputed: the hero is no longer shared
        assert_eq!(outcome.analysis.occurrences["banner hero"], 1);
        assert!(outcome.analysis.shared_components().is_empty());
    }

    #[test]
    fn test_unchanged_set_tracks_previous_run() {
        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path());
        let mut pages = pages();

        let first = analyzer.analyze(&pages, Vec::new(), None);
        assert!(first.unchanged.is_empty());

        pages[1] = Page::new("shop/product.html", "<p>changed</p>");
        let second = analyzer.analyze(&pages, Vec::new(), None);
        assert_eq!(
            second.unchanged.into_iter().collect::<Vec<_>>(),
            vec!["index.html"]
        );
    }

    #[test]
    fn test_corrupt_history_means_nothing_unchanged() {
        let dir = TempDir::new().unwrap();
        let pages = pages();
        Analyzer::new(dir.path()).analyze(&pages, Vec::new(), None);

        fs::write(dir.path().join("last-run.json"), "not json").unwrap();
        let outcome = Analyzer::new(dir.path()).analyze(&pages, Vec::new(), None);
        assert!(outcome.unchanged.is_empty());
        // and the record is rewritten for the next run
        assert!(restore_last_run(dir.path()).is_some());
    }

    #[test]
    fn test_shared_flags_and_confidence() {
        let dir = TempDir::new().unwrap();
        let outcome = Analyzer::new(dir.path()).analyze(&pages(), Vec::new(), None);
        let analysis = &outcome.analysis;

        let index = &analysis.layout["index.html"];
        assert_eq!(index[0].signature, vec!["banner", "hero"]);
        assert!(index[0].shared);
        assert!(!index[1].shared);

        let shared = analysis.shared_components();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].page, "index.html");

        // "product" in the path and text of one page only
        assert_eq!(analysis.hints["shop/product.html"], vec!["product"]);
        assert!((analysis.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_side_effects_written() {
        let dir = TempDir::new().unwrap();
        let pages = vec![Page::new("a/index.html", "<p>a</p>"), Page::new("b/INDEX.html", "<p>b</p>")];
        let failed = vec![FailedFile {
            path: "huge.html".into(),
            reason: crate::ingest::FailReason::Oversized { size: 10, limit: 1 },
        }];
        let outcome = Analyzer::new(dir.path()).analyze(&pages, failed, None);

        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.analysis.conflicts.len(), 1);
        let summary = fs::read_to_string(dir.path().join("conflicts.txt")).unwrap();
        assert!(summary.contains("[duplicate-basename] a/index.html, b/INDEX.html"));

        let record = restore_last_run(dir.path()).unwrap();
        assert_eq!(record.checksums.len(), 2);
        assert_eq!(record.conflicts, outcome.analysis.conflicts);
    }
}
