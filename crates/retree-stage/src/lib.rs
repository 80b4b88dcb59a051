//! Transactional staging of a directory tree.
//!
//! A run never edits its root directly. The [`Stager`] copies the root to a
//! working copy, lets callers mutate that copy through structured
//! [`ShellCommand`]s, and finally commits the copy over the root or discards
//! it. Text rewrites use a second, short-lived results copy so that each rule
//! can be diffed against the state it started from.
//!
//! Every mutation runs through a [`CommandRunner`]; the production
//! [`SystemRunner`] shells out to `cp`, `mv`, `rm`, `mkdir` and `diff`, and
//! [`ensure_tools`] checks they are installed before a run starts.

mod command;
mod error;
mod paths;
mod preflight;
mod runner;
mod stager;

pub use command::{ShellCommand, quote};
pub use error::StageError;
pub use paths::{StagingPaths, normalise};
pub use preflight::{REQUIRED_TOOLS, ensure_tools};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use stager::{StageState, Stager};
