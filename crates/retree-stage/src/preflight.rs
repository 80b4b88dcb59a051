//! Preflight checks for the external tools the stager shells out to.

use tracing::debug;

use crate::error::StageError;
use crate::runner::COMMAND_TARGET;

/// Tools every run needs on `PATH`.
pub const REQUIRED_TOOLS: &[&str] = &["cp", "mv", "rm", "mkdir", "diff"];

/// Verifies that each named tool resolves on `PATH`.
///
/// All tools are checked before reporting, so the error names every missing
/// tool at once.
///
/// # Errors
///
/// Returns [`StageError::MissingTools`] listing the tools that were not found.
pub fn ensure_tools<S: AsRef<str>>(tools: &[S]) -> Result<(), StageError> {
    let missing: Vec<String> = tools
        .iter()
        .map(AsRef::as_ref)
        .filter(|&tool| match which::which(tool) {
            Ok(path) => {
                debug!(target: COMMAND_TARGET, tool, path = %path.display(), "found tool");
                false
            }
            Err(_) => true,
        })
        .map(str::to_owned)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StageError::MissingTools { tools: missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_tools_are_present_on_the_test_host() {
        ensure_tools(REQUIRED_TOOLS).expect("coreutils and diffutils should be installed");
    }

    #[test]
    fn reports_every_missing_tool() {
        let error = ensure_tools(["sh", "retree-missing-a", "retree-missing-b"].as_slice())
            .expect_err("missing tools should fail");
        match error {
            StageError::MissingTools { tools } => {
                assert_eq!(tools, vec!["retree-missing-a", "retree-missing-b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
