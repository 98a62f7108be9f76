//! Bounded-parallelism reads with a per-file timeout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::normalize::normalize_markup;
use super::scan::InputFile;
use super::{FailReason, Page};
use crate::config::IngestConfig;
use crate::logger::ProgressLine;

/// Byte source for a file; swapped out in tests.
pub type FileReader = Arc<dyn Fn(&Path) -> io::Result<Vec<u8>> + Send + Sync>;

pub fn fs_reader() -> FileReader {
    Arc::new(|path: &Path| fs::read(path))
}

type Outcome = Result<Page, FailReason>;

/// Read every file, at most `concurrency` at a time.
///
/// Outcomes come back in input order; callers sort for determinism anyway.
pub async fn read_all(
    files: Vec<InputFile>,
    settings: &IngestConfig,
    reader: FileReader,
) -> Vec<(InputFile, Outcome)> {
    let permits = Arc::new(Semaphore::new(settings.concurrency));
    let progress = ProgressLine::new("ingest", &[("files", files.len())]);
    let limit = settings.max_file_size;
    let timeout = settings.read_timeout();

    let mut handles = Vec::with_capacity(files.len());
    for file in files {
        let permits = Arc::clone(&permits);
        let reader = Arc::clone(&reader);
        let abs = file.abs.clone();
        let rel = file.rel.clone();

        let handle = tokio::spawn(read_one(abs, rel, limit, timeout, reader, permits));
        handles.push((file, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (file, handle) in handles {
        let outcome = handle.await.unwrap_or_else(|e| {
            Err(FailReason::Unreadable {
                message: e.to_string(),
            })
        });
        progress.inc("files");
        outcomes.push((file, outcome));
    }

    progress.finish();
    outcomes
}

async fn read_one(
    abs: PathBuf,
    rel: String,
    limit: u64,
    timeout: Duration,
    reader: FileReader,
    permits: Arc<Semaphore>,
) -> Outcome {
    let Ok(_permit) = permits.acquire_owned().await else {
        return Err(FailReason::Unreadable {
            message: "ingest shut down".into(),
        });
    };

    let size = fs::metadata(&abs).map_err(unreadable)?.len();
    if size > limit {
        return Err(FailReason::Oversized { size, limit });
    }

    let task = tokio::task::spawn_blocking(move || load(&abs, rel, &reader));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Err(FailReason::Malformed {
            message: e.to_string(),
        }),
        Err(_) => Err(FailReason::TimedOut),
    }
}

fn load(abs: &Path, rel: String, reader: &FileReader) -> Outcome {
    let bytes = reader(abs).map_err(unreadable)?;
    let text = String::from_utf8(bytes).map_err(|_| FailReason::InvalidUtf8)?;
    let markup = normalize_markup(&text).map_err(|e| FailReason::Malformed {
        message: e.to_string(),
    })?;
    Ok(Page::new(rel, markup))
}

fn unreadable(e: io::Error) -> FailReason {
    FailReason::Unreadable {
        message: e.to_string(),
    }
}
