//! pandoc JSON filters.
//!
//! A [`Filter`] is offered one node at a time and answers with a [`Visit`]:
//! keep the node, or replace it with zero or more nodes. [`walk`] drives the
//! visits the way classic pandoc filters always have:
//!
//! - arrays are walked item by item, in document order; every item that is a
//!   node (an object with a `"t"` key) is offered to the filter;
//! - a kept node has its children walked next (pre-order);
//! - replacement nodes are spliced in place and their *children* are walked,
//!   but the replacements themselves are never offered back to the filter;
//! - other objects are walked value by value; scalars are left alone.
//!
//! The order is strictly sequential. [`decoding::DecodingFilter`] keeps state
//! between visits and relies on it.

pub mod decoding;
pub mod encoding;

pub use decoding::{DecodeState, DecodingFilter};
pub use encoding::EncodingFilter;

use crate::ast::tag;
use crate::error::{EmbedMathError, Result};
use serde_json::{Map, Value};
use std::io::{Read, Write};
use tracing::debug;

/// Outcome of offering a node to a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Keep the node and walk into it.
    Unchanged,
    /// Splice these nodes in place of the visited one. Empty deletes it.
    Replace(Vec<Value>),
}

impl Visit {
    pub fn replace(node: Value) -> Self {
        Visit::Replace(vec![node])
    }

    pub fn delete() -> Self {
        Visit::Replace(Vec::new())
    }
}

/// A per-node document transformation.
pub trait Filter {
    fn visit(&mut self, node: &Value) -> Result<Visit>;
}

impl<F: Filter + ?Sized> Filter for &mut F {
    fn visit(&mut self, node: &Value) -> Result<Visit> {
        (**self).visit(node)
    }
}

/// Walk `value` depth-first, applying `filter` to every node.
pub fn walk<F: Filter + ?Sized>(value: Value, filter: &mut F) -> Result<Value> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if tag(&item).is_none() {
                    out.push(walk(item, filter)?);
                    continue;
                }
                match filter.visit(&item)? {
                    Visit::Unchanged => out.push(walk(item, filter)?),
                    Visit::Replace(nodes) => {
                        for node in nodes {
                            out.push(walk(node, filter)?);
                        }
                    }
                }
            }
            Ok(Value::Array(out))
        }
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, field) in fields {
                out.insert(key, walk(field, filter)?);
            }
            Ok(Value::Object(out))
        }
        scalar => Ok(scalar),
    }
}

/// Read a pandoc JSON document from `reader`, filter it, write it to `writer`.
///
/// The whole document is walked, metadata included.
pub fn apply_json_filter<R, W, F>(reader: R, mut writer: W, filter: &mut F) -> Result<()>
where
    R: Read,
    W: Write,
    F: Filter + ?Sized,
{
    let document: Value = serde_json::from_reader(reader)?;
    if let Some(version) = document.get("pandoc-api-version") {
        debug!("Filtering pandoc document, API version {}", version);
    }
    let filtered = walk(document, filter)?;
    serde_json::to_writer(&mut writer, &filtered).map_err(|e| {
        if e.is_io() {
            EmbedMathError::Io(e.into())
        } else {
            EmbedMathError::InvalidDocument(e)
        }
    })?;
    writer.flush()?;
    Ok(())
}
