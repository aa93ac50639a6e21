//! Whole-file conversion entry points.
//!
//! Both directions follow the same route:
//!
//! ```text
//! file.md ──pandoc -t json──▶ AST ──filter──▶ AST ──pandoc -f json -s──▶ markdown
//! ```
//!
//! The filter runs in-process between two pandoc calls, so nothing has to be
//! installed on `PATH` besides the three external tools. Before any work the
//! tools are probed; a missing one aborts the run with
//! [`EmbedMathError::MissingDependency`] and no output.

use crate::config::EmbedConfig;
use crate::error::{EmbedMathError, Result};
use crate::filter::{self, DecodingFilter, EncodingFilter, Filter};
use crate::pipeline::render::Renderer;
use crate::runner::{probe_version, Invocation, SystemRunner, ToolRunner};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of probing one external tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolVersion {
    /// How the tool is named in diagnostics, e.g. `latex (e.g. texlive)`.
    pub requirement: String,
    /// Program that was probed.
    pub program: String,
    /// First line of `--version`, `None` if the tool is unavailable.
    pub version: Option<String>,
}

/// Probe pandoc, latex and dvisvgm.
pub fn probe_tools<R: ToolRunner>(runner: &R, config: &EmbedConfig) -> Vec<ToolVersion> {
    [
        ("pandoc", &config.pandoc),
        ("latex (e.g. texlive)", &config.latex),
        ("dvisvgm (part of latex)", &config.dvisvgm),
    ]
    .into_iter()
    .map(|(requirement, program)| ToolVersion {
        requirement: requirement.to_string(),
        program: program.clone(),
        version: probe_version(runner, program, config.probe_timeout()),
    })
    .collect()
}

/// Fail with [`EmbedMathError::MissingDependency`] unless every tool is present.
pub fn check_dependencies<R: ToolRunner>(
    runner: &R,
    config: &EmbedConfig,
) -> Result<Vec<ToolVersion>> {
    let tools = probe_tools(runner, config);
    let missing: Vec<String> = tools
        .iter()
        .filter(|t| t.version.is_none())
        .map(|t| t.requirement.clone())
        .collect();
    if !missing.is_empty() {
        return Err(EmbedMathError::MissingDependency { tools: missing });
    }
    for t in &tools {
        debug!("{}: {}", t.program, t.version.as_deref().unwrap_or_default());
    }
    Ok(tools)
}

/// Replace every formula in the markdown file at `path` with an SVG embed.
pub fn encode_file(path: impl AsRef<Path>, config: &EmbedConfig) -> Result<String> {
    let runner = SystemRunner::new()?;
    encode_file_with(&runner, path, config)
}

/// [`encode_file`] with an explicit [`ToolRunner`].
pub fn encode_file_with<R: ToolRunner>(
    runner: &R,
    path: impl AsRef<Path>,
    config: &EmbedConfig,
) -> Result<String> {
    let mut filter = EncodingFilter::new(Renderer::new(runner, config.clone()));
    let markdown = convert_with(runner, path.as_ref(), config, &mut filter)?;
    info!("Embedded {} formulas", filter.embedded());
    Ok(markdown)
}

/// Restore the math source of every embed in the markdown file at `path`.
pub fn decode_file(path: impl AsRef<Path>, config: &EmbedConfig) -> Result<String> {
    let runner = SystemRunner::new()?;
    decode_file_with(&runner, path, config)
}

/// [`decode_file`] with an explicit [`ToolRunner`].
pub fn decode_file_with<R: ToolRunner>(
    runner: &R,
    path: impl AsRef<Path>,
    config: &EmbedConfig,
) -> Result<String> {
    let mut filter = DecodingFilter::new();
    let markdown = convert_with(runner, path.as_ref(), config, &mut filter)?;
    info!("Restored {} formulas", filter.restored());
    Ok(markdown)
}

fn convert_with<R: ToolRunner, F: Filter>(
    runner: &R,
    path: &Path,
    config: &EmbedConfig,
    filter: &mut F,
) -> Result<String> {
    check_dependencies(runner, config)?;
    let path = resolve_input(path)?;
    info!("Converting {}", path.display());

    let read = Invocation::new(&config.pandoc, config.convert_timeout())
        .arg(path.to_string_lossy())
        .args(["-f", config.input_format.as_str(), "-t", "json"]);
    let ast = run_pandoc(runner, &read)?;
    let document: Value = serde_json::from_slice(&ast)?;

    let filtered = filter::walk(document, filter)?;

    let write = Invocation::new(&config.pandoc, config.convert_timeout())
        .args(["-f", "json", "-t", config.output_format.as_str(), "-s"])
        .stdin(serde_json::to_vec(&filtered)?);
    let markdown = run_pandoc(runner, &write)?;

    Ok(String::from_utf8_lossy(&markdown).into_owned())
}

/// Relative paths are taken from the current directory.
fn resolve_input(path: &Path) -> Result<PathBuf> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(".").join(path)
    };
    if !resolved.exists() {
        return Err(EmbedMathError::FileNotFound { path: resolved });
    }
    Ok(resolved)
}

fn run_pandoc<R: ToolRunner>(runner: &R, invocation: &Invocation) -> Result<Vec<u8>> {
    let output = runner.run(invocation)?;
    if !output.success {
        return Err(EmbedMathError::Convert {
            detail: format!(
                "`{}` exited with status {:?}: {}",
                invocation.command_line(),
                output.code,
                output.stderr_text().trim()
            ),
        });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ToolOutput;

    /// Every tool is present except the ones listed.
    struct Probe {
        missing: &'static [&'static str],
    }

    impl ToolRunner for Probe {
        fn run(&self, inv: &Invocation) -> Result<ToolOutput> {
            if self.missing.contains(&inv.program.as_str()) {
                return Err(EmbedMathError::ToolNotFound {
                    program: inv.program.clone(),
                });
            }
            Ok(ToolOutput {
                code: Some(0),
                success: true,
                stdout: format!("{} 1.0\n", inv.program).into_bytes(),
                stderr: Vec::new(),
            })
        }
    }

    #[test]
    fn all_tools_present() {
        let tools = check_dependencies(&Probe { missing: &[] }, &EmbedConfig::default()).unwrap();
        let versions: Vec<_> = tools.iter().map(|t| t.version.as_deref().unwrap()).collect();
        assert_eq!(versions, vec!["pandoc 1.0", "latex 1.0", "dvisvgm 1.0"]);
    }

    #[test]
    fn every_missing_tool_is_named() {
        let err = check_dependencies(
            &Probe {
                missing: &["pandoc", "dvisvgm"],
            },
            &EmbedConfig::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "embedmath requires pandoc, dvisvgm (part of latex)"
        );
    }

    #[test]
    fn missing_input_file_is_reported() {
        let err = decode_file_with(
            &Probe { missing: &[] },
            "definitely/not/here.md",
            &EmbedConfig::default(),
        )
        .unwrap_err();
        match err {
            EmbedMathError::FileNotFound { path } => {
                assert!(path.ends_with("definitely/not/here.md"))
            }
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn dependency_check_runs_before_file_check() {
        let err = encode_file_with(
            &Probe { missing: &["latex"] },
            "definitely/not/here.md",
            &EmbedConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmbedMathError::MissingDependency { .. }));
    }
}
