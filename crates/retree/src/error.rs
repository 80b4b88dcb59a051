//! Errors that abort a run.
//!
//! Rule-level problems that leave the tree in a known state are reported as
//! warnings instead; everything here is fatal.

use std::path::PathBuf;
use std::sync::Arc;

use retree_config::ScratchDirError;
use retree_replace::ReplaceError;
use retree_stage::StageError;
use thiserror::Error;

/// Fatal errors raised while building or running an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule list was supplied as text that is not valid JSON.
    #[error("rules are not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    /// The rules or the root failed structural validation.
    #[error("invalid input: {message}")]
    Validation {
        /// What was wrong.
        message: String,
    },

    /// A rule named an action with no registered handler.
    #[error("no handler registered for action '{action}'")]
    HandlerNotFound {
        /// The unknown action name.
        action: String,
    },

    /// The engine already ran; engines are single-use.
    #[error("engine has already run")]
    AlreadyRun,

    /// A rule was applied before the working copy existed.
    #[error("rules can only be applied to a staged working copy")]
    NotStaged,

    /// The root path could not be made absolute.
    #[error("cannot resolve root {path}: {source}")]
    Root {
        /// The root as supplied.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// No location for the working copy could be derived.
    #[error(transparent)]
    Scratch(#[from] ScratchDirError),

    /// A staging operation failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Content replacement failed.
    #[error(transparent)]
    Replace(#[from] ReplaceError),
}

impl EngineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
