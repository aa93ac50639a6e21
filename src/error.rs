//! Error types for the embedmath library.
//!
//! A single enum, [`EmbedMathError`], covers every failure the library can
//! report. The variants fall into three groups:
//!
//! * **Precondition failures** ([`EmbedMathError::MissingDependency`],
//!   [`EmbedMathError::FileNotFound`]) are detected before any work starts.
//!   The CLI reports them and exits non-zero without writing any output.
//!
//! * **Rendering and conversion failures** ([`EmbedMathError::Render`],
//!   [`EmbedMathError::Convert`]) come from the external tools. They are not
//!   retried; they propagate out of the filter and abort the run.
//!
//! * **Document failures** ([`EmbedMathError::UnknownMathVariant`],
//!   [`EmbedMathError::MalformedEmbedAttribute`],
//!   [`EmbedMathError::InvalidDocument`]) concern the tree being filtered.
//!   The decoding filter downgrades a malformed attribute to a warning and
//!   leaves the node untouched, so that variant only escapes from
//!   [`crate::pipeline::embed::decode_tex_attribute`] itself.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = EmbedMathError> = std::result::Result<T, E>;

/// All errors returned by the embedmath library.
#[derive(Debug, Error)]
pub enum EmbedMathError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// One or more external tools could not be found.
    #[error("embedmath requires {}", tools.join(", "))]
    MissingDependency { tools: Vec<String> },

    /// Input file was not found at the given path.
    #[error("{path:?} file not found")]
    FileNotFound { path: PathBuf },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// The program could not be spawned because it does not exist.
    #[error("'{program}' was not found on PATH")]
    ToolNotFound { program: String },

    /// The program ran longer than its timeout and was killed.
    #[error("'{program}' timed out after {secs}s")]
    ToolTimedOut { program: String, secs: u64 },

    /// Spawning or talking to the program failed for another reason.
    #[error("I/O error while running '{program}': {source}")]
    ToolIo {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// latex or dvisvgm failed, timed out, or produced no output file.
    #[error("Failed to render {tex:?}: {detail}")]
    Render { tex: String, detail: String },

    /// pandoc exited with a failure status.
    #[error("pandoc conversion failed: {detail}")]
    Convert { detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// A Math node carried a variant other than InlineMath / DisplayMath.
    #[error("Unknown math type {variant:?}")]
    UnknownMathVariant { variant: String },

    /// The `embedmath-tex` attribute is not a valid JSON string body.
    #[error("Malformed embedmath-tex attribute {value:?}: {source}")]
    MalformedEmbedAttribute {
        value: String,
        #[source]
        source: serde_json::Error,
    },

    /// Filter input was not a pandoc JSON document.
    #[error("Invalid pandoc JSON document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Reading or writing a file or stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_lists_every_tool() {
        let e = EmbedMathError::MissingDependency {
            tools: vec!["pandoc".into(), "latex (e.g. texlive)".into()],
        };
        assert_eq!(
            e.to_string(),
            "embedmath requires pandoc, latex (e.g. texlive)"
        );
    }

    #[test]
    fn file_not_found_display() {
        let e = EmbedMathError::FileNotFound {
            path: PathBuf::from("./notes.md"),
        };
        assert_eq!(e.to_string(), "\"./notes.md\" file not found");
    }

    #[test]
    fn timeout_display() {
        let e = EmbedMathError::ToolTimedOut {
            program: "latex".into(),
            secs: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("latex"), "got: {msg}");
        assert!(msg.contains("10s"), "got: {msg}");
    }

    #[test]
    fn render_display_includes_source() {
        let e = EmbedMathError::Render {
            tex: "$x^2$".into(),
            detail: "latex produced no target.dvi".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("$x^2$"), "got: {msg}");
        assert!(msg.contains("target.dvi"), "got: {msg}");
    }
}
