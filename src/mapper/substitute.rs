//! Placeholder substitution and canned-text scrubbing.
//!
//! One alternation regex per `Substituter`, longest alternative first, so
//! `%STORE_NAME%` beats `STORE_NAME` and longer phrases beat their prefixes.

use std::collections::BTreeMap;

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use super::SemanticStats;
use crate::utils::template::map_literals;

pub struct Substituter {
    pattern: Option<Regex>,
    placeholders: FxHashMap<String, String>,
    scrub: FxHashMap<String, String>,
}

impl Substituter {
    pub fn new(
        placeholders: &BTreeMap<String, String>,
        scrub: &BTreeMap<String, String>,
    ) -> Result<Self, regex::Error> {
        let mut alternatives: Vec<String> = placeholders
            .keys()
            .filter(|key| !key.is_empty())
            .flat_map(|key| [format!("%{key}%"), key.clone()])
            .chain(scrub.keys().filter(|phrase| !phrase.is_empty()).cloned())
            .collect();
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        alternatives.dedup();

        let pattern = if alternatives.is_empty() {
            None
        } else {
            let source = alternatives
                .iter()
                .map(|alt| token_pattern(alt))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&source)?)
        };

        Ok(Self {
            pattern,
            placeholders: placeholders.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            scrub: scrub.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Replace tokens in the literal segments of `text`.
    pub fn apply(&self, text: &str, stats: &mut SemanticStats) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        map_literals(text, |literal| {
            pattern
                .replace_all(literal, |caps: &Captures<'_>| self.replacement(&caps[0], stats))
                .into_owned()
        })
    }

    fn replacement(&self, token: &str, stats: &mut SemanticStats) -> String {
        let key = token
            .strip_prefix('%')
            .and_then(|t| t.strip_suffix('%'))
            .filter(|k| self.placeholders.contains_key(*k))
            .unwrap_or(token);

        if let Some(value) = self.placeholders.get(key) {
            stats.placeholders += 1;
            value.clone()
        } else if let Some(value) = self.scrub.get(token) {
            stats.scrubbed += 1;
            value.clone()
        } else {
            token.to_string()
        }
    }
}

/// Escaped alternative, word-bounded on every side that starts or ends with
/// a word character.
fn token_pattern(token: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let mut out = String::new();
    if is_word(token.chars().next()) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(token));
    if is_word(token.chars().last()) {
        out.push_str(r"\b");
    }
    out
}
