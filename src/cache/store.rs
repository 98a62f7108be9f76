//! Content-addressed JSON store with an in-memory front.

use std::path::PathBuf;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{read_json, write_json};
use crate::freshness::ContentHash;

/// Values addressed by a content hash, kept in memory and mirrored to
/// `<dir>/<hex>.json`.
pub struct ContentStore<T> {
    dir: PathBuf,
    memory: Mutex<FxHashMap<ContentHash, T>>,
}

impl<T: Clone + Serialize + DeserializeOwned> ContentStore<T> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: Mutex::new(FxHashMap::default()),
        }
    }

    fn file(&self, key: &ContentHash) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hex()))
    }

    /// Look up memory first, then disk (promoting disk hits into memory).
    pub fn get(&self, key: &ContentHash) -> Option<T> {
        if let Some(value) = self.memory.lock().get(key) {
            return Some(value.clone());
        }
        let value: T = read_json(&self.file(key))?;
        self.memory.lock().insert(*key, value.clone());
        Some(value)
    }

    /// Store a value. Disk failures are logged; the memory copy always lands.
    pub fn put(&self, key: ContentHash, value: &T) {
        if let Err(e) = write_json(&self.file(&key), value) {
            crate::log!("cache"; "failed to persist {}: {}", key, e);
        }
        self.memory.lock().insert(key, value.clone());
    }
}
