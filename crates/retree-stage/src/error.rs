//! Error types for staging operations.
//!
//! I/O errors are wrapped in `Arc` to keep the enum cheap to clone and to
//! satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised by the directory stager and its command runner.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// The program could not be started at all.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that was invoked.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A file operation exited unsuccessfully.
    #[error("command `{command}` failed with status {}: {stderr}", status_label(.status))]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Exit status, absent when the process was killed by a signal.
        status: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The diff tool reported trouble rather than differences.
    #[error("diff failed with status {}: {stderr}", status_label(.status))]
    DiffFailed {
        /// Exit status, absent when the process was killed by a signal.
        status: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// One or more required external tools are not on `PATH`.
    #[error("required tools not found on PATH: {}", .tools.join(", "))]
    MissingTools {
        /// Names of the missing tools.
        tools: Vec<String>,
    },

    /// A scratch location for the working copy could not be reserved.
    #[error("failed to reserve working copy in {path}: {source}")]
    Reserve {
        /// Scratch directory that was used.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// An operation required a working copy that has not been created.
    #[error("no working copy exists")]
    NoWorkingCopy,

    /// A working copy was requested twice in the same run.
    #[error("a working copy already exists at {path}")]
    AlreadyStaged {
        /// The existing working copy.
        path: PathBuf,
    },

    /// A results copy was requested while one is still live.
    #[error("a results copy already exists at {path}")]
    ResultsCopyExists {
        /// The existing results copy.
        path: PathBuf,
    },

    /// Something already occupies the location commit moves the root to.
    #[error("commit backup location {path} already exists; move it aside first")]
    BackupExists {
        /// The occupied backup location.
        path: PathBuf,
    },

    /// The staging directories were already committed, discarded, or left
    /// behind by a failed teardown.
    #[error("staging area has already been torn down")]
    Finished,
}

fn status_label(status: &Option<i32>) -> String {
    status.map_or_else(|| String::from("signal"), |code| code.to_string())
}

impl StageError {
    pub(crate) fn spawn(program: &str, error: std::io::Error) -> Self {
        Self::Spawn {
            program: program.to_owned(),
            source: Arc::new(error),
        }
    }

    pub(crate) fn reserve(path: PathBuf, error: std::io::Error) -> Self {
        Self::Reserve {
            path,
            source: Arc::new(error),
        }
    }
}
