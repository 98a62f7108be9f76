//! `[ingest]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [ingest]
//! max_file_size = 5242880    # Bytes; larger files are marked failed unread
//! read_timeout_ms = 5000     # Per-file read + parse budget
//! concurrency = 8            # Files read at the same time
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub max_file_size: u64,
    pub read_timeout_ms: u64,
    pub concurrency: usize,
}

impl IngestConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            read_timeout_ms: 5_000,
            concurrency: 8,
        }
    }
}
