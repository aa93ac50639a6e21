//! CLI binary for embedmath.
//!
//! A thin shim over the library crate that maps CLI flags to `EmbedConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use embedmath::{
    apply_json_filter, decode_file, encode_file, probe_tools, DecodingFilter, EmbedConfig,
    EncodingFilter, Renderer, SystemRunner,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Replace every formula with an inline SVG image
  embedmath encode notes.md > notes.embedded.md

  # Turn the images back into $…$ / $$…$$ source
  embedmath decode notes.embedded.md > notes.md

  # Use as a filter in your own pandoc pipeline
  pandoc notes.md -t json | embedmath filter encode | pandoc -f json -t gfm

  # Check that pandoc, latex and dvisvgm are installed
  embedmath check

REQUIREMENTS:
  pandoc       https://pandoc.org
  latex        any TeX distribution, e.g. TeX Live
  dvisvgm      ships with TeX Live

ENVIRONMENT VARIABLES:
  EMBEDMATH_PANDOC           pandoc executable
  EMBEDMATH_LATEX            latex executable
  EMBEDMATH_DVISVGM          dvisvgm executable
  EMBEDMATH_RENDER_TIMEOUT   seconds per latex / dvisvgm call
  EMBEDMATH_CONVERT_TIMEOUT  seconds per pandoc call
  RUST_LOG                   overrides the log filter, e.g. embedmath=debug
"#;

/// Embed LaTeX math in Markdown as inline SVG images, and back.
#[derive(Parser, Debug)]
#[command(
    name = "embedmath",
    version,
    about = "Embed LaTeX math in Markdown as inline SVG images, and back",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// pandoc executable.
    #[arg(long, global = true, env = "EMBEDMATH_PANDOC", default_value = "pandoc")]
    pandoc: String,

    /// latex executable.
    #[arg(long, global = true, env = "EMBEDMATH_LATEX", default_value = "latex")]
    latex: String,

    /// dvisvgm executable.
    #[arg(long, global = true, env = "EMBEDMATH_DVISVGM", default_value = "dvisvgm")]
    dvisvgm: String,

    /// Seconds allowed for each latex / dvisvgm call.
    #[arg(long, global = true, env = "EMBEDMATH_RENDER_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    render_timeout: u64,

    /// Seconds allowed for each pandoc call.
    #[arg(long, global = true, env = "EMBEDMATH_CONVERT_TIMEOUT", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    convert_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "EMBEDMATH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "EMBEDMATH_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace math in FILE with embedded SVG images; print the result.
    Encode {
        /// Markdown file to read.
        file: PathBuf,
    },

    /// Restore the math source of embedded images in FILE; print the result.
    Decode {
        /// Markdown file to read.
        file: PathBuf,
    },

    /// Filter a pandoc JSON document from stdin to stdout.
    Filter {
        #[arg(value_enum)]
        direction: Direction,

        /// Target format pandoc passes to filters; accepted and ignored.
        format: Option<String>,
    },

    /// Print the versions of pandoc, latex and dvisvgm.
    Check {
        /// Output JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Encode,
    Decode,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    match cli.command {
        Command::Encode { ref file } => {
            let markdown = encode_file(file, &config)
                .with_context(|| format!("Failed to embed math in {}", file.display()))?;
            write_stdout(&markdown)?;
        }
        Command::Decode { ref file } => {
            let markdown = decode_file(file, &config)
                .with_context(|| format!("Failed to restore math in {}", file.display()))?;
            write_stdout(&markdown)?;
        }
        Command::Filter { direction, .. } => run_filter(direction, config)?,
        Command::Check { json } => check(&config, json)?,
    }

    Ok(())
}

/// Map CLI args to `EmbedConfig`.
fn build_config(cli: &Cli) -> Result<EmbedConfig> {
    EmbedConfig::builder()
        .pandoc(&cli.pandoc)
        .latex(&cli.latex)
        .dvisvgm(&cli.dvisvgm)
        .render_timeout_secs(cli.render_timeout)
        .convert_timeout_secs(cli.convert_timeout)
        .build()
        .context("Invalid configuration")
}

fn run_filter(direction: Direction, config: EmbedConfig) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let filtered = match direction {
        Direction::Encode => {
            let runner = SystemRunner::new().context("Failed to start process runtime")?;
            let mut filter = EncodingFilter::new(Renderer::new(runner, config));
            apply_json_filter(stdin.lock(), stdout.lock(), &mut filter)
        }
        Direction::Decode => {
            apply_json_filter(stdin.lock(), stdout.lock(), &mut DecodingFilter::new())
        }
    };
    filtered.context("Filter failed")
}

fn check(config: &EmbedConfig, json: bool) -> Result<()> {
    let runner = SystemRunner::new().context("Failed to start process runtime")?;
    let tools = probe_tools(&runner, config);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tools).context("Failed to serialise versions")?
        );
    } else {
        for tool in &tools {
            match tool.version {
                Some(ref v) => println!("{} {:<10} {}", green("✓"), tool.program, dim(v)),
                None => println!("{} {:<10} {}", red("✗"), tool.program, red("not found")),
            }
        }
    }

    let missing: Vec<String> = tools
        .into_iter()
        .filter(|t| t.version.is_none())
        .map(|t| t.requirement)
        .collect();
    if !missing.is_empty() {
        return Err(embedmath::EmbedMathError::MissingDependency { tools: missing }.into());
    }
    Ok(())
}

fn write_stdout(markdown: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !markdown.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
