//! Typed views over pandoc JSON AST nodes.
//!
//! The filters work directly on `serde_json::Value`: a document produced by
//! `pandoc -t json` is walked as-is and only the handful of node shapes the
//! filters care about get a typed view. Everything else passes through
//! untouched, byte for byte, whatever pandoc API version produced it.
//!
//! ```text
//! {"t":"Math","c":[{"t":"InlineMath"},"x^2"]}
//! {"t":"RawInline","c":["html","<img …>"]}
//! {"t":"RawBlock","c":["html","<p …>"]}
//! ```

use crate::error::EmbedMathError;
use serde_json::{json, Value};

/// The constructor tag of a node (`"t"`), if the value is a node at all.
pub fn tag(node: &Value) -> Option<&str> {
    node.as_object()?.get("t")?.as_str()
}

/// Inline vs. display mathematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathKind {
    Inline,
    Display,
}

impl MathKind {
    pub fn is_inline(self) -> bool {
        matches!(self, MathKind::Inline)
    }

    /// Wrap raw math content in its delimiters: `$…$` or `$$…$$`.
    pub fn delimit(self, content: &str) -> String {
        match self {
            MathKind::Inline => format!("${content}$"),
            MathKind::Display => format!("$${content}$$"),
        }
    }
}

/// A `Math` node: kind plus raw TeX content (without delimiters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathNode<'a> {
    pub kind: MathKind,
    pub content: &'a str,
}

/// View `node` as a `Math` node.
///
/// Returns `Ok(None)` for any other node and
/// [`EmbedMathError::UnknownMathVariant`] for a `Math` node whose variant tag
/// is neither `InlineMath` nor `DisplayMath`.
pub fn as_math(node: &Value) -> Result<Option<MathNode<'_>>, EmbedMathError> {
    if tag(node) != Some("Math") {
        return Ok(None);
    }
    let parts = node.get("c").and_then(Value::as_array);
    let (variant, content) = match parts.map(Vec::as_slice) {
        Some([variant, content]) => (variant, content.as_str().unwrap_or_default()),
        _ => {
            return Err(EmbedMathError::UnknownMathVariant {
                variant: node.get("c").map(Value::to_string).unwrap_or_default(),
            })
        }
    };
    let kind = match tag(variant) {
        Some("InlineMath") => MathKind::Inline,
        Some("DisplayMath") => MathKind::Display,
        _ => {
            return Err(EmbedMathError::UnknownMathVariant {
                variant: tag(variant)
                    .map(str::to_string)
                    .unwrap_or_else(|| variant.to_string()),
            })
        }
    };
    Ok(Some(MathNode { kind, content }))
}

/// Placement of a raw-markup node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Inline,
    Block,
}

/// A `RawInline` or `RawBlock` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawNode<'a> {
    pub placement: Placement,
    pub format: &'a str,
    pub text: &'a str,
}

/// View `node` as a raw-markup node.
pub fn as_raw(node: &Value) -> Option<RawNode<'_>> {
    let placement = match tag(node)? {
        "RawInline" => Placement::Inline,
        "RawBlock" => Placement::Block,
        _ => return None,
    };
    match node.get("c")?.as_array()?.as_slice() {
        [format, text] => Some(RawNode {
            placement,
            format: format.as_str()?,
            text: text.as_str()?,
        }),
        _ => None,
    }
}

/// Build a raw-markup node with the given placement.
pub fn raw(placement: Placement, format: &str, text: &str) -> Value {
    match placement {
        Placement::Inline => raw_inline(format, text),
        Placement::Block => raw_block(format, text),
    }
}

pub fn raw_inline(format: &str, text: &str) -> Value {
    json!({ "t": "RawInline", "c": [format, text] })
}

pub fn raw_block(format: &str, text: &str) -> Value {
    json!({ "t": "RawBlock", "c": [format, text] })
}
