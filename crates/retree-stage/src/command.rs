//! Structured shell-level commands.
//!
//! Commands are argument vectors, never concatenated strings. Shell quoting is
//! applied only when a command is rendered for logs or replay scripts.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

/// A program invocation described as a program name plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<OsString>,
}

impl ShellCommand {
    /// Creates a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Recursive copy preserving modes and timestamps.
    #[must_use]
    pub fn copy(source: &Path, dest: &Path) -> Self {
        Self::new("cp").arg("-Rp").arg(source).arg(dest)
    }

    /// Move or rename.
    #[must_use]
    pub fn rename(source: &Path, dest: &Path) -> Self {
        Self::new("mv").arg(source).arg(dest)
    }

    /// Recursive, forced removal.
    #[must_use]
    pub fn remove(path: &Path) -> Self {
        Self::new("rm").arg("-rf").arg(path)
    }

    /// Creates a directory and any missing parents.
    #[must_use]
    pub fn make_dirs(path: &Path) -> Self {
        Self::new("mkdir").arg("-p").arg(path)
    }

    /// Recursive unified diff that treats absent files as empty.
    #[must_use]
    pub fn diff(left: &Path, right: &Path) -> Self {
        Self::new("diff").arg("-ruN").arg(left).arg(right)
    }

    /// Program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument vector.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns a copy in which every argument that is a path under `from` is
    /// rebased onto `to`. Comparison is component-wise, so `/a/work` does not
    /// match `/a/work.results`.
    #[must_use]
    pub fn rebase(&self, from: &Path, to: &Path) -> Self {
        let args = self
            .args
            .iter()
            .map(|arg| {
                Path::new(arg)
                    .strip_prefix(from)
                    .map_or_else(|_| arg.clone(), |rest| rebased(to, rest))
            })
            .collect();
        Self {
            program: self.program.clone(),
            args,
        }
    }

    /// Renders the command as a single POSIX shell line.
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = quote(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote(&arg.to_string_lossy()));
        }
        line
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn rebased(to: &Path, rest: &Path) -> OsString {
    if rest.as_os_str().is_empty() {
        to.as_os_str().to_os_string()
    } else {
        to.join(rest).into_os_string()
    }
}

/// Quotes `word` for a POSIX shell, leaving plain words untouched.
#[must_use]
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if plain {
        return word.to_owned();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
