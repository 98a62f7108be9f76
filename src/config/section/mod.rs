//! Configuration section definitions.

mod adapter;
mod ingest;
mod mapper;
mod paths;

pub use adapter::{AdapterConfig, CategoryRule, default_categories};
pub use ingest::IngestConfig;
pub use mapper::MapperConfig;
pub use paths::BuildConfig;
