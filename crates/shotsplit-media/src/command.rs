//! Media tool command builder and runner.
//!
//! The gateway between the pipeline and the ffmpeg/ffprobe binaries. A
//! [`MediaCommand`] is a plain argv; a [`CommandRunner`] executes it to
//! completion and hands back the captured output. A non-zero exit code is
//! data, not an error, until a caller escalates it through [`run_or_fail`].

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// One ffmpeg/ffprobe invocation, built up as a plain argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCommand {
    program: String,
    args: Vec<String>,
}

impl MediaCommand {
    /// Create a command for an arbitrary program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Create an ffmpeg command.
    pub fn ffmpeg() -> Self {
        Self::new("ffmpeg")
    }

    /// Create an ffprobe command.
    pub fn ffprobe() -> Self {
        Self::new("ffprobe")
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a filesystem path as one argument.
    pub fn path_arg(mut self, path: impl AsRef<Path>) -> Self {
        self.args.push(path.as_ref().to_string_lossy().into_owned());
        self
    }

    /// The program this command runs.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The assembled argument vector.
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Check whether any argument equals `arg`.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Captured result of a finished tool invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout and nothing on stderr.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Check if the invocation exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Executes media commands.
///
/// The rest of the crate never spawns the binary directly, which keeps every
/// media operation drivable by a scripted runner in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit is not an error at this level; only a missing binary
    /// or a spawn/IO failure is.
    async fn run(&self, command: &MediaCommand) -> MediaResult<CommandOutput>;
}

/// Runner backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &MediaCommand) -> MediaResult<CommandOutput> {
        which::which(command.program())
            .map_err(|_| MediaError::ToolNotFound(command.program().to_string()))?;

        debug!("running {} {}", command.program(), command.argv().join(" "));

        let output = Command::new(command.program())
            .args(command.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Run a command and escalate a non-zero exit into a fatal, labeled error.
///
/// The label names the pipeline step for diagnostics; stderr is carried
/// verbatim on the error.
pub async fn run_or_fail(
    runner: &dyn CommandRunner,
    command: &MediaCommand,
    label: &str,
) -> MediaResult<CommandOutput> {
    let output = runner.run(command).await?;
    if !output.success() {
        return Err(MediaError::tool_failed(label, output.exit_code, output.stderr));
    }
    Ok(output)
}
