//! Pre-parse pass over raw markup.
//!
//! `tl` misreads a few everyday constructs (`<br/>`, a valueless attribute
//! followed by another one, `<` inside script bodies). Before parsing, the
//! markup is rewritten into the subset it reads reliably:
//!
//! - comments are removed
//! - start tags are re-emitted with double-quoted attributes and no
//!   trailing `/`, end tags as a bare lower-cased `</name>`
//! - valueless attributes carry [`VALUELESS`] as their value
//! - raw-text bodies (`script`, `style`, `textarea`) are lifted out and
//!   replaced by an indexed marker, restored verbatim after parsing

/// Stand-in value for attributes written without `=`.
pub(super) const VALUELESS: &str = "\u{e000}";

/// Delimits the body index left in place of a raw-text body.
const BODY_MARK: char = '\u{e001}';

/// Markup ready for `tl`, plus the raw-text bodies taken out of it.
#[derive(Debug)]
pub(super) struct Prepared {
    pub markup: String,
    pub bodies: Vec<String>,
}

impl Prepared {
    /// Body behind a marker left by [`prepare`].
    pub fn body(&self, marker: &str) -> Option<&str> {
        let index = marker
            .strip_prefix(BODY_MARK)?
            .strip_suffix(BODY_MARK)?
            .parse::<usize>()
            .ok()?;
        self.bodies.get(index).map(String::as_str)
    }
}

/// Elements whose content is text up to the matching end tag.
#[inline]
pub(super) fn has_raw_body(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea")
}

pub(super) fn prepare(markup: &str) -> Prepared {
    let mut out = String::with_capacity(markup.len());
    let mut bodies = Vec::new();
    let mut pos = 0;

    while let Some(offset) = markup[pos..].find('<') {
        let lt = pos + offset;
        out.push_str(&markup[pos..lt]);
        let rest = &markup[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            pos = comment
                .find("-->")
                .map_or(markup.len(), |end| lt + 4 + end + 3);
            continue;
        }

        if let Some((name, len)) = read_end_tag(rest) {
            out.push_str(&format!("</{name}>"));
            pos = lt + len;
            continue;
        }

        let Some(tag) = StartTag::read(rest) else {
            out.push('<');
            pos = lt + 1;
            continue;
        };
        tag.write(&mut out);
        pos = lt + tag.len;

        if has_raw_body(&tag.name) {
            let end = find_end_tag(&markup[pos..], &tag.name).map_or(markup.len(), |e| pos + e);
            out.push_str(&format!("{BODY_MARK}{}{BODY_MARK}", bodies.len()));
            bodies.push(markup[pos..end].to_string());
            pos = end;
        }
    }
    out.push_str(&markup[pos..]);

    Prepared {
        markup: out,
        bodies,
    }
}

/// A start tag as written in the source.
#[derive(Debug, PartialEq, Eq)]
struct StartTag<'a> {
    /// Lower-cased tag name.
    name: String,
    attrs: Vec<(&'a str, Option<&'a str>)>,
    /// Source length, `<` through `>`.
    len: usize,
}

impl<'a> StartTag<'a> {
    /// Read a start tag at the beginning of `src`; `None` if `src` does not
    /// open one or the tag never closes.
    fn read(src: &'a str) -> Option<Self> {
        let bytes = src.as_bytes();
        if bytes.len() < 2 || bytes[0] != b'<' || !bytes[1].is_ascii_alphabetic() {
            return None;
        }

        let name_end = 1 + src[1..]
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
            .unwrap_or(src.len() - 1);
        let mut tag = Self {
            name: src[1..name_end].to_ascii_lowercase(),
            attrs: Vec::new(),
            len: 0,
        };

        let mut i = name_end;
        loop {
            while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
                i += 1;
            }
            if *bytes.get(i)? == b'>' {
                tag.len = i + 1;
                return Some(tag);
            }

            let key_start = i;
            i += 1;
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && !matches!(bytes[i], b'=' | b'>' | b'/')
            {
                i += 1;
            }
            let key = &src[key_start..i];

            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if bytes.get(i) != Some(&b'=') {
                tag.attrs.push((key, None));
                continue;
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let value = match bytes.get(i)? {
                quote @ (b'"' | b'\'') => {
                    let close = src[i + 1..].find(*quote as char)?;
                    let value = &src[i + 1..i + 1 + close];
                    i += close + 2;
                    value
                }
                _ => {
                    let start = i;
                    while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                        i += 1;
                    }
                    &src[start..i]
                }
            };
            tag.attrs.push((key, Some(value)));
        }
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let value = match value {
                Some(v) => v.replace('"', "&quot;"),
                None => VALUELESS.to_string(),
            };
            out.push_str(&format!(" {key}=\"{value}\""));
        }
        out.push('>');
    }
}

/// Lower-cased name and source length of an end tag at the start of `src`.
fn read_end_tag(src: &str) -> Option<(String, usize)> {
    let rest = src.strip_prefix("</")?;
    if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let close = rest.find('>')?;
    let name_end = rest[..close]
        .find(|c: char| c.is_ascii_whitespace() || c == '/')
        .unwrap_or(close);
    Some((rest[..name_end].to_ascii_lowercase(), close + 3))
}

/// Offset of the `</name` that ends a raw-text body, case-insensitive.
fn find_end_tag(body: &str, name: &str) -> Option<usize> {
    let lower = body.to_ascii_lowercase();
    let needle = format!("</{name}");
    let mut from = 0;
    while let Some(found) = lower[from..].find(&needle) {
        let at = from + found;
        let next = lower.as_bytes().get(at + needle.len());
        if next.is_none_or(|b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/')) {
            return Some(at);
        }
        from = at + needle.len();
    }
    None
}
