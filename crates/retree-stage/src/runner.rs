//! Command execution seam.
//!
//! [`CommandRunner`] abstracts process execution so the stager can be driven
//! by test doubles that simulate tool failures without touching the disk.
//! [`SystemRunner`] is the production implementation.

use std::process::Command;

use tracing::debug;

use crate::command::ShellCommand;
use crate::error::StageError;

/// Tracing target for command execution.
pub(crate) const COMMAND_TARGET: &str = "retree_stage::command";

/// Exit status and captured streams of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, absent when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Builds a successful output carrying `stdout`.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Builds an output with the given exit code and standard error.
    #[must_use]
    pub fn exited(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true when the process exited with status zero.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs a structured command to completion.
///
/// Implementations report a non-zero exit through [`CommandOutput::status`];
/// only a failure to start the process is an error.
pub trait CommandRunner {
    /// Executes the command and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Spawn`] when the program cannot be started.
    fn run(&self, command: &ShellCommand) -> Result<CommandOutput, StageError>;
}

/// Executes commands as host processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ShellCommand) -> Result<CommandOutput, StageError> {
        debug!(
            target: COMMAND_TARGET,
            program = command.program(),
            command = %command,
            "running command"
        );

        let output = Command::new(command.program())
            .args(command.args())
            .output()
            .map_err(|error| StageError::spawn(command.program(), error))?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        };

        debug!(
            target: COMMAND_TARGET,
            program = command.program(),
            status = ?result.status,
            stdout_bytes = result.stdout.len(),
            "command finished"
        );
        Ok(result)
    }
}
