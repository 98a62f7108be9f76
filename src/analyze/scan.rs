//! Per-page scan. Depends on page content only, so results are cached by
//! content checksum and shared by identical pages.

use serde::{Deserialize, Serialize};

use super::component::ComponentScan;
use super::css::{self, CssMap};
use super::hints;
use super::script::{self, InlineScript};
use crate::dom::Document;
use crate::utils::html::is_structural_element;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageScan {
    pub hints: Vec<String>,
    pub css: CssMap,
    pub scripts: Vec<InlineScript>,
    pub components: Vec<ComponentScan>,
}

pub fn scan_page(markup: &str) -> PageScan {
    let doc = match Document::parse(markup) {
        Ok(doc) => doc,
        Err(e) => {
            crate::debug!("analyze"; "scan skipped: {}", e);
            return PageScan::default();
        }
    };

    let mut scan = PageScan {
        hints: hints::detect(&hints::visible_text(&doc.nodes)),
        ..PageScan::default()
    };

    doc.for_each_element(|elem| {
        match elem.name.as_str() {
            "style" => css::collect(&elem.text_content(), &mut scan.css),
            "script" => {
                if let Some(body) = script::capture(elem, scan.scripts.len()) {
                    scan.scripts.push(body);
                }
            }
            _ => {}
        }

        if is_structural_element(&elem.name) {
            let signature = elem.class_signature();
            if !signature.is_empty() {
                scan.components.push(ComponentScan {
                    signature,
                    markup: elem.outer_html(),
                    order: scan.components.len(),
                });
            }
        }
    });

    scan
}
