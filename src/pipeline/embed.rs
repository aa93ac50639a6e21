//! Embed payloads: SVG bytes + math source → self-contained HTML.
//!
//! The markup is a fixed, bit-exact format so that documents encoded by
//! earlier releases still decode:
//!
//! ```text
//! inline   <img embedmath-tex="$x^2$" src="data:image/svg+xml;base64,…">
//! display  <p align="center" style="clear: both;" embedmath-tex="$$…$$"><img src="data:image/svg+xml;base64,…"></p>
//! ```
//!
//! The `embedmath-tex` value is the source written as a JSON string literal
//! whose own quotes double as the attribute quotes. Decoding wraps the
//! attribute text in quotes again and JSON-parses it. Characters HTML would
//! trip over (`&`, `<`, `>`, `"`) are written as character references inside
//! the literal; an HTML parser turns them back before the JSON step.

use crate::ast::MathKind;
use crate::error::{EmbedMathError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use html_escape::encode_double_quoted_attribute;
use std::fmt::{self, Write as _};

/// Name of the attribute carrying the original math source.
pub const TEX_ATTRIBUTE: &str = "embedmath-tex";

const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

/// A rendered formula ready to be written into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedPayload {
    /// Math source including its `$` / `$$` delimiters.
    pub tex: String,
    pub kind: MathKind,
    pub svg: Vec<u8>,
}

impl EmbedPayload {
    pub fn new(tex: impl Into<String>, kind: MathKind, svg: Vec<u8>) -> Self {
        Self {
            tex: tex.into(),
            kind,
            svg,
        }
    }

    /// `data:image/svg+xml;base64,…` URL of the image.
    pub fn data_url(&self) -> String {
        format!("{SVG_DATA_URL_PREFIX}{}", STANDARD.encode(&self.svg))
    }

    /// The HTML fragment substituted for the math node.
    pub fn markup(&self) -> String {
        let tex = encode_tex_attribute(&self.tex);
        let src = self.data_url();
        match self.kind {
            MathKind::Inline => format!(r#"<img {TEX_ATTRIBUTE}={tex} src="{src}">"#),
            MathKind::Display => format!(
                r#"<p align="center" style="clear: both;" {TEX_ATTRIBUTE}={tex}><img src="{src}"></p>"#
            ),
        }
    }
}

impl fmt::Display for EmbedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.markup())
    }
}

/// Quote `tex` for the `embedmath-tex` attribute, quotes included.
pub fn encode_tex_attribute(tex: &str) -> String {
    let literal = json_string_body(tex);
    format!("\"{}\"", encode_double_quoted_attribute(&literal))
}

/// Recover the math source from an (entity-decoded) attribute value.
pub fn decode_tex_attribute(value: &str) -> Result<String> {
    serde_json::from_str::<String>(&format!("\"{value}\"")).map_err(|source| {
        EmbedMathError::MalformedEmbedAttribute {
            value: value.to_string(),
            source,
        }
    })
}

/// Body of a JSON string literal for `s`, ASCII only.
///
/// Non-ASCII characters become `\uXXXX` escapes (surrogate pairs above the
/// BMP), matching the output legacy documents were written with.
fn json_string_body(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04x}");
                }
            }
            c => out.push(c),
        }
    }
    out
}
