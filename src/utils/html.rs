//! HTML utility functions.
//!
//! - `quote_attr()` - make a raw attribute value safe inside double quotes
//! - `is_void_element()` - self-closing elements (br, img, etc.)
//! - `is_raw_text_element()` - raw text elements (script, style)
//! - `is_structural_element()` - block elements that can form components

use std::borrow::Cow;

/// Prepare a raw attribute value for double-quoted output.
///
/// Values coming out of the parser keep their entities, so only the quote
/// character itself needs replacing. Uses `Cow` to avoid allocation when the
/// value is already safe.
#[inline]
pub fn quote_attr(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Check if an HTML tag is a void element (self-closing).
///
/// Void elements cannot have children and are rendered without a closing tag.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content must not be touched).
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Check if whitespace inside this element is significant.
#[inline]
pub fn is_preformatted(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea") || is_raw_text_element(tag)
}

/// Check if tag is a structural block that can be recognized as a component.
#[inline]
pub fn is_structural_element(tag: &str) -> bool {
    matches!(
        tag,
        "header" | "footer" | "nav" | "section" | "article" | "aside" | "main" | "form" | "div"
    )
}
