//! External tool execution: the seam between embedmath and pandoc / latex /
//! dvisvgm.
//!
//! Everything that spawns a process goes through the [`ToolRunner`] trait.
//! The renderer and the converter driver only build [`Invocation`]s and read
//! [`ToolOutput`]s, so tests can substitute a scripted runner and exercise the
//! whole pipeline without a TeX installation.
//!
//! ## Why a tokio runtime in a synchronous tool?
//!
//! `std::process` has no way to wait for a child with a deadline. The
//! [`SystemRunner`] owns a current-thread runtime and uses
//! `tokio::process::Command` under `tokio::time::timeout`; `kill_on_drop`
//! makes sure a timed-out child does not outlive the call. The filters stay
//! synchronous and strictly sequential.

use crate::error::{EmbedMathError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; inherits the current one when `None`.
    pub cwd: Option<PathBuf>,
    /// Bytes written to the child's stdin. The child gets `/dev/null` when `None`.
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    /// Human-readable command line, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

impl From<std::process::Output> for ToolOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

/// Runs external programs on behalf of the renderer and the converter driver.
///
/// Implementations must report a program that does not exist as
/// [`EmbedMathError::ToolNotFound`] and an overrun as
/// [`EmbedMathError::ToolTimedOut`]. A non-zero exit status is *not* an
/// error at this level; callers decide what a failed run means.
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput>;
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        (**self).run(invocation)
    }
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug)]
pub struct SystemRunner {
    runtime: tokio::runtime::Runtime,
}

impl SystemRunner {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { runtime })
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        debug!("Running: {}", invocation.command_line());
        self.runtime.block_on(run_with_timeout(invocation))
    }
}

async fn run_with_timeout(invocation: &Invocation) -> Result<ToolOutput> {
    let program = &invocation.program;
    let io_err = |source: std::io::Error| EmbedMathError::ToolIo {
        program: program.clone(),
        source,
    };

    let mut cmd = Command::new(program);
    cmd.args(&invocation.args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = invocation.cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EmbedMathError::ToolNotFound {
                program: program.clone(),
            }
        } else {
            io_err(e)
        }
    })?;

    // Feed stdin concurrently with draining stdout so a chatty child cannot
    // deadlock on a full pipe.
    let pipe = child.stdin.take();
    let feed = async {
        if let (Some(mut pipe), Some(bytes)) = (pipe, invocation.stdin.as_deref()) {
            pipe.write_all(bytes).await?;
            pipe.shutdown().await?;
        }
        Ok::<_, std::io::Error>(())
    };

    let run = async { tokio::join!(feed, child.wait_with_output()) };
    let (fed, output) = tokio::time::timeout(invocation.timeout, run)
        .await
        .map_err(|_| EmbedMathError::ToolTimedOut {
            program: program.clone(),
            secs: invocation.timeout.as_secs(),
        })?;

    if let Err(e) = fed {
        // The child may legitimately exit before reading all of its input.
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(io_err(e));
        }
        debug!("'{}' closed stdin early", program);
    }

    Ok(output.map_err(io_err)?.into())
}

/// Run `<program> --version` and return the first line of its output.
///
/// Returns `None` when the program is absent, fails, or prints nothing.
pub fn probe_version<R: ToolRunner>(runner: &R, program: &str, timeout: Duration) -> Option<String> {
    let invocation = Invocation::new(program, timeout).arg("--version");
    match runner.run(&invocation) {
        Ok(output) => {
            let stdout = output.stdout_text();
            let first = stdout.lines().next().unwrap_or("").trim();
            if first.is_empty() {
                None
            } else {
                Some(first.to_string())
            }
        }
        Err(EmbedMathError::ToolNotFound { .. }) => None,
        Err(e) => {
            warn!("Version probe for '{}' failed: {}", program, e);
            None
        }
    }
}
