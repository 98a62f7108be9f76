//! `[mapper]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [mapper]
//! i18n = true
//! client = "acme"
//! sanitize = true
//!
//! [mapper.placeholders]
//! STORE_NAME = "{{ store.name }}"
//!
//! [mapper.clients.acme]
//! STORE_NAME = "{{ acme.brand }}"
//!
//! [mapper.scrub]
//! "Sample" = "{{ store.name }}"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Wrap visible text and allow-listed attributes in translation calls.
    pub i18n: bool,

    /// Client whose placeholder map overlays the base map.
    pub client: Option<String>,

    /// Strip inline event handlers and plaintext external scripts.
    pub sanitize: bool,

    /// Base placeholder map: KEY -> replacement.
    pub placeholders: BTreeMap<String, String>,

    /// Per-client overlays; client keys win over base keys.
    pub clients: BTreeMap<String, BTreeMap<String, String>>,

    /// Canned prototype prose -> configuration-driven expression.
    pub scrub: BTreeMap<String, String>,

    /// Tags whose text is wrapped for translation.
    pub i18n_tags: Vec<String>,

    /// Attributes whose literal values are wrapped for translation.
    pub i18n_attrs: Vec<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        let placeholders = [
            ("STORE_NAME", "{{ store.name }}"),
            ("STORE_EMAIL", "{{ store.email }}"),
            ("STORE_PHONE", "{{ store.phone }}"),
            ("CURRENCY", "{{ store.currency }}"),
            ("YEAR", "{{ now.year }}"),
        ];
        let scrub = [
            ("Lorem ipsum dolor sit amet", "{{ store.description }}"),
            ("Sample", "{{ store.name }}"),
        ];
        let tags = [
            "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "label", "li", "span",
            "small", "strong", "em", "th", "td", "option", "title", "figcaption", "legend",
        ];
        let attrs = ["alt", "title", "placeholder", "aria-label"];

        Self {
            i18n: false,
            client: None,
            sanitize: false,
            placeholders: owned_map(&placeholders),
            clients: BTreeMap::new(),
            scrub: owned_map(&scrub),
            i18n_tags: tags.iter().map(|s| s.to_string()).collect(),
            i18n_attrs: attrs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn owned_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
