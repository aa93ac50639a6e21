//! # embedmath
//!
//! Embed the LaTeX math of a Markdown document as inline SVG images, and
//! restore it again.
//!
//! ## Why this crate?
//!
//! Plenty of Markdown renderers (issue trackers, package registries, mail
//! clients) show `$x^2$` as literal dollar signs. Rendering every formula to
//! SVG and inlining it as a `data:` URL makes the document display anywhere
//! raw HTML images are allowed. The original source travels along in an
//! `embedmath-tex` attribute, so the transformation can be undone losslessly
//! and the document stays editable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Probe    pandoc / latex / dvisvgm must answer --version
//!  ├─ 2. Parse    pandoc -t json
//!  ├─ 3. Filter   encode: Math → <img embedmath-tex=…>   (latex + dvisvgm)
//!  │              decode: <img embedmath-tex=…> → $…$    (drops the image block)
//!  └─ 4. Write    pandoc -f json -t markdown -s
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use embedmath::{encode_file, decode_file, EmbedConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EmbedConfig::default();
//!     let embedded = encode_file("notes.md", &config)?;
//!     std::fs::write("notes.embedded.md", &embedded)?;
//!
//!     let restored = decode_file("notes.embedded.md", &config)?;
//!     println!("{restored}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `embedmath` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod ast;
pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod runner;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EmbedConfig, EmbedConfigBuilder};
pub use convert::{
    check_dependencies, decode_file, decode_file_with, encode_file, encode_file_with, probe_tools,
    ToolVersion,
};
pub use error::{EmbedMathError, Result};
pub use filter::{apply_json_filter, DecodeState, DecodingFilter, EncodingFilter, Filter, Visit};
pub use pipeline::embed::EmbedPayload;
pub use pipeline::render::Renderer;
pub use runner::{Invocation, SystemRunner, ToolOutput, ToolRunner};
