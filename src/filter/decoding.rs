//! Decoding filter: embedded images → original math source.
//!
//! Once pandoc re-reads an encoded document, a display-math embed no longer
//! arrives as one node. The markdown reader splits
//! `<p align="center" … embedmath-tex=…><img src=…></p>` into
//!
//! ```text
//! RawBlock  <p align="center" style="clear: both;" embedmath-tex="$$…$$">
//! Plain     [RawInline <img src="data:…">]          ← auxiliary block
//! RawBlock  </p>                                    ← end of suppression
//! ```
//!
//! The opening tag is turned back into the math source; everything after it
//! up to and including the next `RawBlock` is dropped. Suppression keys on
//! "next RawBlock", not on content, so an unrelated raw block sitting between
//! the embed and its image ends it early.

use super::{Filter, Visit};
use crate::ast::{self, Placement};
use crate::error::Result;
use crate::pipeline::embed::{decode_tex_attribute, TEX_ATTRIBUTE};
use crate::pipeline::markup;
use serde_json::Value;
use tracing::{debug, warn};

/// Where the decoder is between visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeState {
    /// Looking for embeds.
    #[default]
    Normal,
    /// Deleting the auxiliary block after a block-level embed.
    Suppressing,
}

impl DecodeState {
    /// State after suppressing `node`: the first `RawBlock` ends it.
    fn after_suppressed(node: &Value) -> Self {
        if ast::tag(node) == Some("RawBlock") {
            DecodeState::Normal
        } else {
            DecodeState::Suppressing
        }
    }
}

/// Restores math source from `embedmath-tex` attributes.
///
/// Malformed attributes are logged and the node is left as it was.
#[derive(Debug, Default)]
pub struct DecodingFilter {
    state: DecodeState,
    restored: usize,
}

impl DecodingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Number of formulas restored so far.
    pub fn restored(&self) -> usize {
        self.restored
    }

    fn decode(&mut self, node: &Value) -> Visit {
        let Some(raw) = ast::as_raw(node) else {
            return Visit::Unchanged;
        };
        if raw.format != "html" {
            return Visit::Unchanged;
        }
        let Some(element) = markup::first_element(raw.text) else {
            return Visit::Unchanged;
        };
        let Some(value) = element.attr(TEX_ATTRIBUTE) else {
            return Visit::Unchanged;
        };
        let tex = match decode_tex_attribute(value) {
            Ok(tex) => tex,
            Err(e) => {
                warn!("Leaving embed untouched: {}", e);
                return Visit::Unchanged;
            }
        };

        debug!("Restored {:?}", tex);
        self.restored += 1;
        if raw.placement == Placement::Block {
            self.state = DecodeState::Suppressing;
        }
        let text = element.replace_with(raw.text, &tex);
        Visit::replace(ast::raw(raw.placement, "markdown", &text))
    }
}

impl Filter for DecodingFilter {
    fn visit(&mut self, node: &Value) -> Result<Visit> {
        Ok(match self.state {
            DecodeState::Normal => self.decode(node),
            DecodeState::Suppressing => {
                self.state = DecodeState::after_suppressed(node);
                Visit::delete()
            }
        })
    }
}
