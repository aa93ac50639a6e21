//! Raw HTML fragment scanning.
//!
//! The decoding filter only needs three things from a raw HTML node: the
//! first element, that element's attributes, and the span of text the element
//! covers so it can be swapped out for plain text. A handful of regexes cover
//! the shapes pandoc actually hands us:
//!
//! - a lone void tag: `<img embedmath-tex="$x$" src="…">`
//! - an opening tag split off from its body: `<p align="center" …>`
//! - a whole element: `<p …><img src="…"></p>`
//!
//! Attribute values are returned with HTML character references decoded.

use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static RE_START_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^<([A-Za-z][A-Za-z0-9:-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .unwrap()
});

static RE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

static RE_ANY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<(/?)([A-Za-z][A-Za-z0-9:-]*)(?:\s[^>]*)?>"#).unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// The first element of a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lower-cased tag name.
    pub name: String,
    /// Attributes in source order; names lower-cased, values entity-decoded.
    /// A bare attribute (`<input disabled>`) has an empty value.
    pub attrs: Vec<(String, String)>,
    /// Byte range of the element in the fragment, from `<` of the start tag
    /// to the end of its matching end tag (or of the fragment, if unclosed).
    pub span: Range<usize>,
}

impl Element {
    /// Value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace the element's span in `fragment` with `text`.
    pub fn replace_with(&self, fragment: &str, text: &str) -> String {
        let mut out = String::with_capacity(fragment.len() - self.span.len() + text.len());
        out.push_str(&fragment[..self.span.start]);
        out.push_str(text);
        out.push_str(&fragment[self.span.end..]);
        out
    }
}

/// Find the element at the start of `fragment`.
///
/// Leading whitespace is skipped. Any other leading content (text, a comment,
/// a closing tag) means the fragment does not start with an element and
/// `None` is returned.
pub fn first_element(fragment: &str) -> Option<Element> {
    let start = fragment.len() - fragment.trim_start().len();
    let caps = RE_START_TAG.captures(&fragment[start..])?;
    let whole = caps.get(0)?;
    let name = caps[1].to_ascii_lowercase();
    let self_closing = !caps[3].is_empty();
    let tag_end = start + whole.end();

    let end = if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        tag_end
    } else {
        matching_end(fragment, tag_end, &name).unwrap_or(fragment.len())
    };

    Some(Element {
        attrs: parse_attributes(&caps[2]),
        name,
        span: start..end,
    })
}

fn parse_attributes(source: &str) -> Vec<(String, String)> {
    RE_ATTRIBUTE
        .captures_iter(source)
        .map(|c| {
            let name = c[1].to_ascii_lowercase();
            let raw = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str());
            (name, decode_html_entities(raw).into_owned())
        })
        .collect()
}

/// End offset of the tag closing `name`, searching from `from`, honouring
/// nested elements of the same name.
fn matching_end(fragment: &str, from: usize, name: &str) -> Option<usize> {
    let mut depth = 0usize;
    for caps in RE_ANY_TAG.captures_iter(&fragment[from..]) {
        if !caps[2].eq_ignore_ascii_case(name) {
            continue;
        }
        let whole = caps.get(0)?;
        if caps[1].is_empty() {
            if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        } else if depth == 0 {
            return Some(from + whole.end());
        } else {
            depth -= 1;
        }
    }
    None
}
