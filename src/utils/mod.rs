//! Shared helpers: HTML classification, path handling, pluralization,
//! templating-syntax segmentation.

pub mod html;
pub mod path;
pub mod plural;
pub mod template;

pub use plural::{plural_count, plural_s};
