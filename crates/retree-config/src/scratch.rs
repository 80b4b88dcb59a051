//! Fallback scratch-directory derivation.
//!
//! Working copies are placed next to the root by default so that the final
//! `mv working root` during commit stays on one filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while deriving the scratch directory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScratchDirError {
    /// The root has no parent directory to host working copies.
    #[error("root '{path}' has no parent directory; configure a scratch directory")]
    NoParent {
        /// The root that was inspected.
        path: PathBuf,
    },
}

pub(crate) fn parent_of(root: &Path) -> Result<PathBuf, ScratchDirError> {
    root.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| ScratchDirError::NoParent {
            path: root.to_path_buf(),
        })
}
