//! Content checksums (blake3) for pages, snapshots and cache keys.

mod hash;

pub use hash::{ContentHash, manifest_hash};
