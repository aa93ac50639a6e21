//! Math rendering: TeX source → SVG bytes via `latex` and `dvisvgm`.
//!
//! Each call gets its own [`TempDir`]: the template is written to
//! `target.tex`, `latex` turns it into `target.dvi`, and `dvisvgm` turns that
//! into `target.svg`. The directory is removed when the call returns, on the
//! error paths as well.
//!
//! Diagnostics a tool prints are logged, never treated as failure on their
//! own: latex warns about plenty of harmless things. The only failure signal
//! is a missing output file (or a tool that cannot run at all).

use crate::ast::MathKind;
use crate::config::EmbedConfig;
use crate::error::{EmbedMathError, Result};
use crate::pipeline::embed::EmbedPayload;
use crate::runner::{Invocation, ToolOutput, ToolRunner};
use std::path::Path;
use tempfile::TempDir;
use tracing::{debug, warn};

const TEX_FILE: &str = "target.tex";
const DVI_FILE: &str = "target.dvi";
const SVG_FILE: &str = "target.svg";

/// Wrap delimited math in a minimal standalone LaTeX document.
pub fn latex_document(tex: &str, packages: &[String]) -> String {
    let mut doc = String::from("\\documentclass{article}\n\\pagestyle{empty}\n");
    for package in packages {
        doc.push_str(&format!("\\usepackage{{{package}}}\n"));
    }
    doc.push_str("\\begin{document}\n");
    doc.push_str(tex);
    doc.push_str("\n\\end{document}");
    doc
}

/// Renders math through the external TeX toolchain.
#[derive(Debug)]
pub struct Renderer<R> {
    runner: R,
    config: EmbedConfig,
}

impl<R: ToolRunner> Renderer<R> {
    pub fn new(runner: R, config: EmbedConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &EmbedConfig {
        &self.config
    }

    /// Render delimited math (`$…$` or `$$…$$`) to SVG bytes.
    ///
    /// Display math (`inline == false`) uses the larger display scale.
    pub fn render(&self, tex: &str, inline: bool) -> Result<Vec<u8>> {
        let dir = TempDir::new()?;
        let work = dir.path();
        std::fs::write(
            work.join(TEX_FILE),
            latex_document(tex, &self.config.packages),
        )?;

        let latex = Invocation::new(&self.config.latex, self.config.render_timeout())
            .arg(TEX_FILE)
            .current_dir(work);
        self.run_tool(tex, &latex)?;
        require_output(tex, work, DVI_FILE, &self.config.latex)?;

        let dvisvgm = Invocation::new(&self.config.dvisvgm, self.config.render_timeout())
            .args([
                DVI_FILE.to_string(),
                format!("--font-format={}", self.config.font_format),
                format!("--scale={:?}", self.config.scale(inline)),
                "--exact".to_string(),
            ])
            .current_dir(work);
        self.run_tool(tex, &dvisvgm)?;
        require_output(tex, work, SVG_FILE, &self.config.dvisvgm)?;

        let svg = std::fs::read(work.join(SVG_FILE))?;
        debug!("Rendered {:?} → {} bytes SVG", tex, svg.len());
        Ok(svg)
    }

    /// Render and wrap the image in embed markup carrying `tex`.
    pub fn render_to_embed(&self, tex: &str, inline: bool) -> Result<EmbedPayload> {
        let svg = self.render(tex, inline)?;
        let kind = if inline {
            MathKind::Inline
        } else {
            MathKind::Display
        };
        Ok(EmbedPayload::new(tex, kind, svg))
    }

    fn run_tool(&self, tex: &str, invocation: &Invocation) -> Result<ToolOutput> {
        let output = self.runner.run(invocation).map_err(|e| match e {
            e @ (EmbedMathError::ToolNotFound { .. }
            | EmbedMathError::ToolTimedOut { .. }
            | EmbedMathError::ToolIo { .. }) => EmbedMathError::Render {
                tex: tex.to_string(),
                detail: e.to_string(),
            },
            other => other,
        })?;

        let stderr = output.stderr_text();
        if !stderr.trim().is_empty() {
            warn!("{} reported:\n{}", invocation.program, stderr.trim_end());
        }
        if !output.success {
            // latex prints its errors on stdout as lines starting with '!'.
            let errors: Vec<&str> = output
                .stdout
                .split(|&b| b == b'\n')
                .filter_map(|line| std::str::from_utf8(line).ok())
                .filter(|line| line.starts_with('!'))
                .collect();
            warn!(
                "{} exited with status {:?} for {:?}{}",
                invocation.program,
                output.code,
                tex,
                if errors.is_empty() {
                    String::new()
                } else {
                    format!(": {}", errors.join(" "))
                }
            );
        }
        Ok(output)
    }
}

fn require_output(tex: &str, dir: &Path, file: &str, program: &str) -> Result<()> {
    if dir.join(file).is_file() {
        Ok(())
    } else {
        Err(EmbedMathError::Render {
            tex: tex.to_string(),
            detail: format!("{program} produced no {file}"),
        })
    }
}
