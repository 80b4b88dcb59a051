//! Errors raised while discovering or rewriting files.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors from the content replacer.
///
/// Any per-file failure fails the whole operation, so each variant names the
/// file involved.
#[derive(Debug, Clone, Error)]
pub enum ReplaceError {
    /// The search text was empty.
    #[error("search text must not be empty")]
    EmptySearch,

    /// Reading and writing the same tree would corrupt files mid-stream.
    #[error("read root and write root must differ: {path}")]
    SameRoot {
        /// The shared root.
        path: PathBuf,
    },

    /// Directory traversal failed.
    #[error("failed to walk {path}: {source}")]
    Walk {
        /// Entry being visited when the walk failed.
        path: PathBuf,
        /// Underlying traversal error.
        #[source]
        source: Arc<walkdir::Error>,
    },

    /// A candidate file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A rewritten file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl ReplaceError {
    pub(crate) fn read(path: PathBuf, error: std::io::Error) -> Self {
        Self::Read {
            path,
            source: Arc::new(error),
        }
    }

    pub(crate) fn write(path: PathBuf, error: std::io::Error) -> Self {
        Self::Write {
            path,
            source: Arc::new(error),
        }
    }
}
