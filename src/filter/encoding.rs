//! Encoding filter: `Math` nodes → embedded SVG images.

use super::{Filter, Visit};
use crate::ast::{self, MathKind};
use crate::error::Result;
use crate::pipeline::render::Renderer;
use crate::runner::ToolRunner;
use serde_json::Value;
use tracing::debug;

/// Replaces every math node with a raw HTML embed of its rendering.
///
/// A pandoc `Math` element always lives in inline context, so the
/// replacement is always a `RawInline`. Display math is told apart by its
/// `<p align="center">` wrapper, which the markdown reader later splits into
/// block-level raw nodes.
#[derive(Debug)]
pub struct EncodingFilter<R> {
    renderer: Renderer<R>,
    embedded: usize,
}

impl<R: ToolRunner> EncodingFilter<R> {
    pub fn new(renderer: Renderer<R>) -> Self {
        Self {
            renderer,
            embedded: 0,
        }
    }

    /// Number of formulas embedded so far.
    pub fn embedded(&self) -> usize {
        self.embedded
    }
}

impl<R: ToolRunner> Filter for EncodingFilter<R> {
    fn visit(&mut self, node: &Value) -> Result<Visit> {
        let Some(math) = ast::as_math(node)? else {
            return Ok(Visit::Unchanged);
        };
        let tex = math.kind.delimit(math.content);
        let payload = self
            .renderer
            .render_to_embed(&tex, math.kind == MathKind::Inline)?;
        self.embedded += 1;
        debug!("Embedded {:?} ({} bytes SVG)", tex, payload.svg.len());
        Ok(Visit::replace(ast::raw_inline("html", &payload.markup())))
    }
}
