//! Shared configuration for the retree engine and command-line interface.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then an
//! optional configuration file, then `RETREE_*` environment variables, then
//! command-line flags. Every field is optional so that an absent layer never
//! masks a lower one; accessors apply the defaults.

mod defaults;
mod logging;
mod scratch;

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::DEFAULT_LOG_FILTER;
pub use logging::LogFormat;
pub use scratch::ScratchDirError;

/// Runtime configuration shared by the CLI and library callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "RETREE")]
pub struct Config {
    /// Tracing filter expression, for example `info` or `retree=debug`.
    pub log_filter: Option<String>,
    /// Output format for log records.
    pub log_format: Option<LogFormat>,
    /// Directory that receives working copies. Defaults to the parent of the
    /// transformed root.
    pub scratch_dir: Option<PathBuf>,
}

impl Config {
    /// Returns the effective log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Returns the effective log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_default()
    }

    /// Returns the directory in which working copies for `root` are created.
    ///
    /// # Errors
    ///
    /// Returns [`ScratchDirError::NoParent`] when no scratch directory is
    /// configured and `root` has no parent directory to fall back to.
    pub fn scratch_dir_for(&self, root: &Path) -> Result<PathBuf, ScratchDirError> {
        match self.scratch_dir.as_ref() {
            Some(dir) => Ok(dir.clone()),
            None => scratch::parent_of(root),
        }
    }
}

#[cfg(test)]
mod tests;
