//! Literal search and replace across a directory tree.
//!
//! A [`Replacer`] walks a read root, skipping [`BUILTIN_IGNORES`], any paths
//! in an [`IgnoreSet`] and binary files, and reports each text file that
//! contains the search text as a [`Candidate`] with the lines its occurrences
//! start on. [`Replacer::apply`] then streams selected files into a separate
//! write root, replacing occurrences except on lines a [`FileEdit`] asks to
//! keep. Files are scanned and rewritten concurrently; the first failure fails
//! the whole operation.

mod error;
mod ignore;
mod probe;
mod replacer;
mod stream;

pub use error::ReplaceError;
pub use ignore::{BUILTIN_IGNORES, IgnoreSet, is_builtin};
pub use probe::{PROBE_LEN, is_binary};
pub use replacer::{Candidate, FileEdit, Replacer, Rewrite};
