//! Translation wrapping.
//!
//! Text becomes `{{ t("…") }}`; text with exactly one embedded expression is
//! folded into `{{ t("Hello {name}", name=customer.name) }}`. Attribute calls
//! use single quotes so the value survives double-quoted attribute output.

use super::SemanticStats;
use crate::utils::template::{
    Segment, expression_body, has_delimiter, has_template_syntax, segments,
};

/// Wrap or fold a text node. Surrounding whitespace stays outside the call.
pub fn translate_text(text: &str, stats: &mut SemanticStats) -> String {
    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }
    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let segs = segments(core);
    let untouchable = segs.iter().any(|s| match s {
        Segment::Statement(_) => true,
        Segment::Literal(l) => has_delimiter(l),
        Segment::Expression(_) => false,
    });
    if untouchable {
        return text.to_string();
    }
    let expressions: Vec<&str> = segs
        .iter()
        .filter_map(|s| match s {
            Segment::Expression(e) => Some(*e),
            _ => None,
        })
        .collect();

    let call = match expressions.as_slice() {
        [] if is_numeric(core) => return text.to_string(),
        [] => {
            stats.text_wraps += 1;
            format!("{{{{ t(\"{}\") }}}}", escape(core, '"'))
        }
        [expr] => {
            let has_literal = segs
                .iter()
                .any(|s| matches!(s, Segment::Literal(l) if !l.trim().is_empty()));
            if !has_literal {
                return text.to_string();
            }
            let body = expression_body(expr);
            let name = placeholder_name(body);
            let message: String = segs
                .iter()
                .map(|s| match s {
                    Segment::Literal(l) => escape(l, '"'),
                    _ => format!("{{{name}}}"),
                })
                .collect();
            if has_delimiter(&message) {
                return text.to_string();
            }
            stats.folded += 1;
            format!("{{{{ t(\"{message}\", {name}={body}) }}}}")
        }
        _ => {
            stats.multi_expression_skipped += 1;
            return text.to_string();
        }
    };

    format!("{lead}{call}{trail}")
}

/// Wrap a literal attribute value; `None` leaves it as is.
pub fn translate_attr(value: &str, stats: &mut SemanticStats) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || has_template_syntax(value) || has_delimiter(value) || is_numeric(value)
    {
        return None;
    }
    stats.attr_wraps += 1;
    Some(format!("{{{{ t('{}') }}}}", escape(value, '\'')))
}

/// At least one digit, otherwise only separators and whitespace.
pub fn is_numeric(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || ".,:+-%/".contains(c))
}

/// Name for a folded expression: its last path segment.
///
/// `customer.name` -> `name`, `product.price | money` -> `price`.
pub fn placeholder_name(body: &str) -> String {
    let head = body.split(['|', '(']).next().unwrap_or_default().trim();
    let last = head
        .rsplit(['.', '[', ']'])
        .find(|s| !s.trim().is_empty())
        .unwrap_or_default();
    let name: String = last
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        "value".to_string()
    } else {
        name
    }
}

fn escape(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_keeps_surrounding_whitespace() {
        let mut stats = SemanticStats::default();
        assert_eq!(
            translate_text("\n  Add to cart\n", &mut stats),
            "\n  {{ t(\"Add to cart\") }}\n"
        );
        assert_eq!(stats.text_wraps, 1);
    }

    #[test]
    fn test_skip_empty_numeric_and_templated() {
        let mut stats = SemanticStats::default();
        for text in ["   ", "19.99", "10:30 - 12:00", "{{ t(\"x\") }}", "{% if a %}b"] {
            assert_eq!(translate_text(text, &mut stats), text);
        }
        assert_eq!(stats, SemanticStats::default());
    }

    #[test]
    fn test_fold_single_expression() {
        let mut stats = SemanticStats::default();
        let out = translate_text("Hello {{ customer.name }}!", &mut stats);
        assert_eq!(out, "{{ t(\"Hello {name}!\", name=customer.name) }}");
        assert_eq!(stats.folded, 1);

        // Folded output is a single expression: nothing left to do
        let mut again = SemanticStats::default();
        assert_eq!(translate_text(&out, &mut again), out);
        assert_eq!(again, SemanticStats::default());
    }

    #[test]
    fn test_stray_delimiters_left_alone() {
        let mut stats = SemanticStats::default();
        for text in ["Use }} to close", "Open with {{ and", "Hi {{ name }}}}", "50%} off"] {
            assert_eq!(translate_text(text, &mut stats), text);
        }
        // `}` after an expression would merge with the placeholder brace
        assert_eq!(translate_text("Total {{ b }}}", &mut stats), "Total {{ b }}}");
        assert!(translate_attr("Use }} here", &mut stats).is_none());
        assert_eq!(stats, SemanticStats::default());
    }

    #[test]
    fn test_multiple_expressions_left_alone() {
        let mut stats = SemanticStats::default();
        let text = "{{ a.b }} and {{ c }}";
        assert_eq!(translate_text(text, &mut stats), text);
        assert_eq!(stats.multi_expression_skipped, 1);
        assert_eq!(stats.folded, 0);
    }

    #[test]
    fn test_translate_attr() {
        let mut stats = SemanticStats::default();
        assert_eq!(
            translate_attr("Shop's logo", &mut stats).as_deref(),
            Some("{{ t('Shop\\'s logo') }}")
        );
        assert!(translate_attr("{{ t('x') }}", &mut stats).is_none());
        assert!(translate_attr("42", &mut stats).is_none());
        assert_eq!(stats.attr_wraps, 1);
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_name("customer.name"), "name");
        assert_eq!(placeholder_name("product.price | money"), "price");
        assert_eq!(placeholder_name("items[0]"), "value");
        assert_eq!(placeholder_name("format_date(order.date)"), "format_date");
        assert_eq!(placeholder_name("total"), "total");
    }
}
