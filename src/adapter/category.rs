//! Partial category resolution.
//!
//! Checked in order, first match wins:
//! 1. baseline taxonomy: a category keyword occurs in the signature text
//! 2. baseline graph: a `partials/<category>/<stem>.html` path whose stem
//!    equals one of the signature classes
//! 3. the configured keyword table (`[adapter] categories`)
//! 4. [`DEFAULT_CATEGORY`]

use super::baseline::Baseline;
use crate::config::CategoryRule;

pub const DEFAULT_CATEGORY: &str = "components";

pub struct CategoryResolver {
    taxonomy: Vec<(String, Vec<String>)>,
    graph: Vec<(String, String)>,
    rules: Vec<CategoryRule>,
}

impl CategoryResolver {
    pub fn new(baseline: &Baseline, rules: &[CategoryRule]) -> Self {
        let taxonomy = baseline
            .categories
            .iter()
            .map(|c| {
                let keywords = std::iter::once(&c.name)
                    .chain(&c.keywords)
                    .map(|k| k.to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (c.name.clone(), keywords)
            })
            .collect();

        let graph = baseline
            .graph
            .paths()
            .filter_map(|path| {
                let rest = path.strip_prefix("partials/")?;
                let (category, file) = rest.split_once('/')?;
                let stem = file.strip_suffix(".html").unwrap_or(file);
                Some((category.to_string(), stem.to_lowercase()))
            })
            .collect();

        Self {
            taxonomy,
            graph,
            rules: rules.to_vec(),
        }
    }

    pub fn resolve(&self, signature: &[String]) -> String {
        let text = signature.join(" ").to_lowercase();

        let from_taxonomy = self
            .taxonomy
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())));
        if let Some((name, _)) = from_taxonomy {
            return name.clone();
        }

        let from_graph = self
            .graph
            .iter()
            .find(|(_, stem)| signature.iter().any(|class| class.to_lowercase() == *stem));
        if let Some((category, _)) = from_graph {
            return category.clone();
        }

        self.rules
            .iter()
            .find(|rule| text.contains(&rule.keyword.to_lowercase()))
            .map_or_else(|| DEFAULT_CATEGORY.to_string(), |rule| rule.category.clone())
    }
}
