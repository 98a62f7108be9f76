//! Templating-syntax segmentation.
//!
//! Text handled by the mapper is a mix of literal prose and templating
//! constructs (`{{ expr }}` expressions, `{% stmt %}` statements). Every
//! rewrite touches literal segments only, so output from an earlier pass is
//! never rewritten twice.

/// A run of text classified by templating role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// Full `{{ … }}` text, delimiters included.
    Expression(&'a str),
    /// Full `{% … %}` text, delimiters included.
    Statement(&'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Self::Literal(s) | Self::Expression(s) | Self::Statement(s) => s,
        }
    }
}

/// Split text into literal, expression and statement segments.
///
/// An unterminated opener is treated as literal text.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let next = [("{{", "}}"), ("{%", "%}")]
            .into_iter()
            .filter_map(|(open, close)| rest.find(open).map(|pos| (pos, open, close)))
            .min_by_key(|(pos, _, _)| *pos);

        let Some((start, open, close)) = next else {
            out.push(Segment::Literal(rest));
            break;
        };
        let Some(end) = rest[start + open.len()..].find(close) else {
            out.push(Segment::Literal(rest));
            break;
        };
        let end = start + open.len() + end + close.len();

        if start > 0 {
            out.push(Segment::Literal(&rest[..start]));
        }
        let construct = &rest[start..end];
        out.push(if open == "{{" {
            Segment::Expression(construct)
        } else {
            Segment::Statement(construct)
        });
        rest = &rest[end..];
    }

    out
}

/// Check whether text contains any complete templating construct.
#[inline]
pub fn has_template_syntax(text: &str) -> bool {
    segments(text)
        .iter()
        .any(|s| !matches!(s, Segment::Literal(_)))
}

/// Check whether text contains a delimiter, paired or stray.
///
/// Literal text carrying one cannot be placed inside a construct: the
/// result would split differently when segmented again.
#[inline]
pub fn has_delimiter(text: &str) -> bool {
    ["{{", "}}", "{%", "%}"].iter().any(|d| text.contains(d))
}

/// Rewrite only the literal segments of `text`, leaving constructs intact.
pub fn map_literals(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Literal(s) => out.push_str(&f(s)),
            other => out.push_str(other.as_str()),
        }
    }
    out
}

/// Inner source of an expression segment: `{{ a.b }}` -> `a.b`.
#[inline]
pub fn expression_body(expr: &str) -> &str {
    expr.trim_start_matches("{{")
        .trim_end_matches("}}")
        .trim()
}
