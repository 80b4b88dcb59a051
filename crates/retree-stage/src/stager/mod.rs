//! Working/results staging for a single run.
//!
//! A [`Stager`] owns the root, working and results locations of one run. It
//! creates the working copy, optionally layers a results copy on top for text
//! rewrites, and finally either commits (promotes working over root) or
//! discards. All file operations go through the configured
//! [`CommandRunner`], so every mutation is observable and replayable.
//!
//! # Partial failure
//!
//! Commit is three steps: `mv root root.bak`, `mv working root`, then removal
//! of `root.bak` and any results copy. A failure between steps is not rolled
//! back; the stager moves to [`StageState::Failed`] and the directories stay on
//! disk for an operator to inspect.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::command::ShellCommand;
use crate::error::StageError;
use crate::paths::StagingPaths;
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};

/// Tracing target for staging lifecycle events.
const STAGE_TARGET: &str = "retree_stage::stager";

/// Lifecycle of the staging area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Nothing staged yet.
    Idle,
    /// A working copy exists.
    Staged,
    /// The working copy replaced the root.
    Committed,
    /// The staging directories were deleted.
    Discarded,
    /// Commit or discard failed partway.
    Failed,
}

/// Creates, mutates and tears down the staging trees of one run.
pub struct Stager {
    paths: StagingPaths,
    scratch: PathBuf,
    state: StageState,
    runner: Box<dyn CommandRunner>,
}

impl std::fmt::Debug for Stager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stager")
            .field("paths", &self.paths)
            .field("scratch", &self.scratch)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Stager {
    /// Creates a stager for `root` that places working copies in `scratch`
    /// and runs host commands.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        Self::with_runner(root, scratch, Box::new(SystemRunner))
    }

    /// Creates a stager with a custom command runner.
    #[must_use]
    pub fn with_runner(
        root: impl Into<PathBuf>,
        scratch: impl Into<PathBuf>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            paths: StagingPaths::new(root),
            scratch: scratch.into(),
            state: StageState::Idle,
            runner,
        }
    }

    /// Current staging locations.
    #[must_use]
    pub const fn paths(&self) -> &StagingPaths {
        &self.paths
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> StageState {
        self.state
    }

    /// The tree being transformed.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// The working copy, once created.
    #[must_use]
    pub fn working(&self) -> Option<&Path> {
        self.paths.working()
    }

    /// The results copy, while one is live.
    #[must_use]
    pub fn results(&self) -> Option<&Path> {
        self.paths.results()
    }

    /// Copies the root to a fresh `.<name>.work.<suffix>` directory in the
    /// scratch area and returns its location.
    ///
    /// The location is reserved atomically, retrying with new random suffixes
    /// until an unused name is found, and the root's contents are then copied
    /// into it.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::AlreadyStaged`] when called twice,
    /// [`StageError::Reserve`] when the scratch directory is unusable, and a
    /// command error when the copy fails.
    pub fn create_working_copy(&mut self) -> Result<PathBuf, StageError> {
        if let Some(existing) = self.paths.working() {
            return Err(StageError::AlreadyStaged {
                path: existing.to_path_buf(),
            });
        }
        self.ensure_live()?;

        let working = self.reserve_working_path()?;
        let copy = ShellCommand::copy(&self.paths.root().join("."), &working);
        if let Err(error) = self.run_checked(&copy) {
            // The reservation never received the root's contents.
            if let Err(cleanup) = std::fs::remove_dir_all(&working) {
                warn!(
                    target: STAGE_TARGET,
                    working = %working.display(),
                    error = %cleanup,
                    "failed to remove partial working copy"
                );
            }
            return Err(error);
        }

        info!(
            target: STAGE_TARGET,
            root = %self.paths.root().display(),
            working = %working.display(),
            "created working copy"
        );
        self.paths.set_working(Some(working.clone()));
        self.state = StageState::Staged;
        Ok(working)
    }

    fn reserve_working_path(&self) -> Result<PathBuf, StageError> {
        let name = self
            .paths
            .root()
            .file_name()
            .map_or_else(|| String::from("root"), |n| n.to_string_lossy().into_owned());
        let reserved = tempfile::Builder::new()
            .prefix(&format!(".{name}.work."))
            .rand_bytes(8)
            .tempdir_in(&self.scratch)
            .map_err(|error| StageError::reserve(self.scratch.clone(), error))?;
        Ok(reserved.keep())
    }

    /// Copies the working tree to `<working>.results` and returns its
    /// location.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NoWorkingCopy`] before a working copy exists,
    /// [`StageError::ResultsCopyExists`] while a results copy is live, and a
    /// command error when the copy fails.
    pub fn create_results_copy(&mut self) -> Result<PathBuf, StageError> {
        self.ensure_live()?;
        let working = self.require_working()?;
        if let Some(existing) = self.paths.results() {
            return Err(StageError::ResultsCopyExists {
                path: existing.to_path_buf(),
            });
        }
        let results = StagingPaths::results_path_for(&working);
        self.run_checked(&ShellCommand::copy(&working, &results))?;
        debug!(target: STAGE_TARGET, results = %results.display(), "created results copy");
        self.paths.set_results(Some(results.clone()));
        Ok(results)
    }

    /// Makes the results copy the new working copy.
    ///
    /// The previous working tree is removed and the results directory is moved
    /// into its place, so later rules observe the rewritten content.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NoWorkingCopy`] when nothing is staged and a
    /// command error when the removal or move fails.
    pub fn promote_results(&mut self) -> Result<(), StageError> {
        self.ensure_live()?;
        let working = self.require_working()?;
        let Some(results) = self.paths.results().map(Path::to_path_buf) else {
            return Ok(());
        };
        self.run_checked(&ShellCommand::remove(&working))?;
        self.run_checked(&ShellCommand::rename(&results, &working))?;
        self.paths.set_results(None);
        debug!(target: STAGE_TARGET, working = %working.display(), "promoted results copy");
        Ok(())
    }

    /// Deletes a live results copy, leaving the working copy as it was.
    ///
    /// # Errors
    ///
    /// Returns a command error when the removal fails.
    pub fn drop_results(&mut self) -> Result<(), StageError> {
        if let Some(results) = self.paths.results().map(Path::to_path_buf) {
            self.run_checked(&ShellCommand::remove(&results))?;
            self.paths.set_results(None);
        }
        Ok(())
    }

    /// Resolves `path` against the latest staged tree.
    ///
    /// Absolute paths pass through; relative paths resolve against the
    /// results copy if present, else the working copy, else the root.
    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.paths.resolve(path)
    }

    /// Resolves `path` inside the latest staged tree, or `None` when it
    /// would escape it. See [`StagingPaths::confine`].
    #[must_use]
    pub fn confine_path(&self, path: &Path) -> Option<PathBuf> {
        self.paths.confine(path)
    }

    /// Converts a path under any of the three trees to a root-relative path.
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> Option<PathBuf> {
        self.paths.relative(path)
    }

    /// Returns true when something exists at the resolved path. Dangling
    /// symlinks count as present.
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).symlink_metadata().is_ok()
    }

    /// Runs a file operation and returns its replay form.
    ///
    /// The replay command has results and working prefixes rebased onto the
    /// root, so it reproduces the operation against the real tree.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Spawn`] or [`StageError::CommandFailed`].
    pub fn execute(&self, command: &ShellCommand) -> Result<String, StageError> {
        self.run_checked(command)?;
        let replay = self.replay_form(command);
        debug!(target: STAGE_TARGET, command = %replay, "executed");
        Ok(replay)
    }

    /// Rebases staging prefixes in `command` onto the root and renders it.
    #[must_use]
    pub fn replay_form(&self, command: &ShellCommand) -> String {
        let root = self.paths.root();
        let mut replay = command.clone();
        if let Some(results) = self.paths.results() {
            replay = replay.rebase(results, root);
        }
        if let Some(working) = self.paths.working() {
            replay = replay.rebase(working, root);
        }
        replay.render()
    }

    /// Produces a recursive unified diff between two resolved paths.
    ///
    /// Exit status 0 (identical) and 1 (differences found) both succeed; the
    /// returned text is empty when the inputs are identical. Staging prefixes
    /// are stripped from the diff headers.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::DiffFailed`] for exit statuses above 1.
    pub fn diff(&self, left: &Path, right: &Path) -> Result<String, StageError> {
        let command = ShellCommand::diff(&self.resolve_path(left), &self.resolve_path(right));
        let output = self.runner.run(&command)?;
        match output.status {
            Some(0) => Ok(String::new()),
            Some(1) => Ok(self.paths.strip_prefixes(&output.stdout)),
            status => Err(StageError::DiffFailed {
                status,
                stderr: output.stderr,
            }),
        }
    }

    /// Checks that nothing occupies `<root>.bak`, where commit parks the
    /// root while the working copy moves into place.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::BackupExists`] when the location is taken.
    pub fn ensure_backup_free(&self) -> Result<(), StageError> {
        let backup = self.paths.backup_path();
        if backup.symlink_metadata().is_ok() {
            return Err(StageError::BackupExists { path: backup });
        }
        Ok(())
    }

    /// Promotes the working copy over the root.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::NoWorkingCopy`] when nothing is staged,
    /// [`StageError::BackupExists`] when `<root>.bak` is already taken,
    /// [`StageError::Finished`] after a previous teardown, and a command error
    /// when any step fails. A failed step leaves the stager in
    /// [`StageState::Failed`] without rolling back earlier steps.
    pub fn commit(&mut self) -> Result<(), StageError> {
        self.ensure_live()?;
        let working = self.require_working()?;
        self.ensure_backup_free()?;
        let root = self.paths.root().to_path_buf();
        let backup = self.paths.backup_path();
        let results = self.paths.results().map(Path::to_path_buf);

        let outcome = self
            .run_checked(&ShellCommand::rename(&root, &backup))
            .and_then(|()| self.run_checked(&ShellCommand::rename(&working, &root)))
            .and_then(|()| self.run_checked(&ShellCommand::remove(&backup)))
            .and_then(|()| match results.as_deref() {
                Some(path) => self.run_checked(&ShellCommand::remove(path)),
                None => Ok(()),
            });
        self.finish(outcome, StageState::Committed)?;
        info!(target: STAGE_TARGET, root = %root.display(), "committed working copy");
        Ok(())
    }

    /// Deletes the working and results copies, leaving the root untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::Finished`] after a previous teardown and a
    /// command error when a removal fails.
    pub fn discard(&mut self) -> Result<(), StageError> {
        self.ensure_live()?;
        let targets: Vec<PathBuf> = self
            .paths
            .working()
            .into_iter()
            .chain(self.paths.results())
            .map(Path::to_path_buf)
            .collect();
        let outcome = targets
            .iter()
            .try_for_each(|path| self.run_checked(&ShellCommand::remove(path)));
        self.finish(outcome, StageState::Discarded)?;
        info!(target: STAGE_TARGET, root = %self.paths.root().display(), "discarded working copy");
        Ok(())
    }

    fn finish(&mut self, outcome: Result<(), StageError>, done: StageState) -> Result<(), StageError> {
        match outcome {
            Ok(()) => {
                self.state = done;
                self.paths.set_working(None);
                self.paths.set_results(None);
                Ok(())
            }
            Err(error) => {
                self.state = StageState::Failed;
                Err(error)
            }
        }
    }

    fn ensure_live(&self) -> Result<(), StageError> {
        match self.state {
            StageState::Idle | StageState::Staged => Ok(()),
            StageState::Committed | StageState::Discarded | StageState::Failed => {
                Err(StageError::Finished)
            }
        }
    }

    fn require_working(&self) -> Result<PathBuf, StageError> {
        self.paths
            .working()
            .map(Path::to_path_buf)
            .ok_or(StageError::NoWorkingCopy)
    }

    fn run_checked(&self, command: &ShellCommand) -> Result<(), StageError> {
        let output: CommandOutput = self.runner.run(command)?;
        if output.succeeded() {
            Ok(())
        } else {
            Err(StageError::CommandFailed {
                command: command.render(),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}
