//! Structural components and the global shared-component reduction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::freshness::ContentHash;

/// A structural block as seen while scanning one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentScan {
    pub signature: Vec<String>,
    pub markup: String,
    pub order: usize,
}

/// A component placed in the layout map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    /// Sorted, deduplicated class list. The identity across pages.
    pub signature: Vec<String>,
    pub markup: String,
    /// Document-order index within the owning page.
    pub order: usize,
    pub page: String,
    /// Global occurrence count is at least 2.
    pub shared: bool,
}

/// Signature as a single string key.
#[inline]
pub fn signature_key(signature: &[String]) -> String {
    signature.join(" ")
}

/// Stable id derived from the signature.
pub fn component_id(signature: &[String]) -> String {
    format!("cmp-{}", ContentHash::of(signature_key(signature)).short(8))
}

/// Count every occurrence of every signature across all pages.
///
/// Must see every page before any `shared` flag is decided.
pub fn count_occurrences<'a>(
    scans: impl IntoIterator<Item = &'a [ComponentScan]>,
) -> BTreeMap<String, usize> {
    let mut occurrences = BTreeMap::new();
    for components in scans {
        for component in components {
            *occurrences
                .entry(signature_key(&component.signature))
                .or_insert(0) += 1;
        }
    }
    occurrences
}

impl Component {
    pub fn place(scan: &ComponentScan, page: &str, occurrences: &BTreeMap<String, usize>) -> Self {
        let count = occurrences
            .get(&signature_key(&scan.signature))
            .copied()
            .unwrap_or(0);
        Self {
            id: component_id(&scan.signature),
            signature: scan.signature.clone(),
            markup: scan.markup.clone(),
            order: scan.order,
            page: page.to_string(),
            shared: count >= 2,
        }
    }
}
