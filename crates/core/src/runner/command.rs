//! Process execution interface and shared types.
//!
//! Defines [`ProcessRunner`], the seam between the orchestrator and the
//! external tools, along with [`ToolCommand`], [`ToolOutput`],
//! [`PipelineOutput`] and [`RunnerError`].

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Argument prefixes whose values must never reach the logs.
const SECRET_ARG_PREFIXES: &[&str] = &["--password=", "--access_key=", "--secret_key="];

/// Where a command's stdout goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Discard stdout (the default).
    Discard,
    /// Capture stdout into [`ToolOutput::stdout`].
    Capture,
    /// Truncate and write stdout to the given file.
    File(PathBuf),
}

/// A single external tool invocation.
///
/// Arguments are passed to the program verbatim; no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// File fed to the program's stdin (stdin is null if `None`).
    pub stdin: Option<PathBuf>,
    pub stdout: StdoutTarget,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            stdout: StdoutTarget::Discard,
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

    pub fn stdin_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn stdout_file(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout = StdoutTarget::File(path.as_ref().to_path_buf());
        self
    }

    pub fn capture_stdout(mut self) -> Self {
        self.stdout = StdoutTarget::Capture;
        self
    }

    /// Render the command line for logging with credential values masked.
    pub fn redacted(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&redact_arg(arg));
        }
        if let Some(path) = &self.stdin {
            rendered.push_str(&format!(" < {}", path.display()));
        }
        if let StdoutTarget::File(path) = &self.stdout {
            rendered.push_str(&format!(" > {}", path.display()));
        }
        rendered
    }
}

fn redact_arg(arg: &str) -> String {
    SECRET_ARG_PREFIXES
        .iter()
        .find(|prefix| arg.starts_with(*prefix))
        .map(|prefix| format!("{prefix}***"))
        .unwrap_or_else(|| arg.to_string())
}

/// Captured result of one finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub program: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Captured stdout; empty unless [`StdoutTarget::Capture`] was requested.
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Results of a two-stage `producer | consumer` pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub producer: ToolOutput,
    pub consumer: ToolOutput,
}

impl PipelineOutput {
    /// A pipeline succeeds only if both stages exit with code 0.
    pub fn success(&self) -> bool {
        self.first_failure().is_none()
    }

    /// The earliest stage that exited non-zero, if any.
    pub fn first_failure(&self) -> Option<&ToolOutput> {
        [&self.producer, &self.consumer]
            .into_iter()
            .find(|stage| !stage.success())
    }
}

/// Errors raised before a process could produce an exit status.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {} for redirection: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs external tools on behalf of the orchestrator.
///
/// A non-zero exit is reported through [`ToolOutput::exit_code`], not as an
/// error; [`RunnerError`] is reserved for failures to run the process at all.
pub trait ProcessRunner: Send + Sync {
    /// Run `cmd` to completion.
    fn run(
        &self,
        cmd: &ToolCommand,
    ) -> impl Future<Output = Result<ToolOutput, RunnerError>> + Send;

    /// Run `producer | consumer`, streaming the producer's stdout into the
    /// consumer's stdin. The producer's own stdout target is ignored.
    fn run_piped(
        &self,
        producer: &ToolCommand,
        consumer: &ToolCommand,
    ) -> impl Future<Output = Result<PipelineOutput, RunnerError>> + Send;
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
