//! Discovery and rewriting across a file tree.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::ReplaceError;
use crate::ignore::IgnoreSet;
use crate::probe;
use crate::stream::{Pattern, StreamError};

/// Tracing target for replacement events.
const REPLACE_TARGET: &str = "retree_replace::replacer";

/// A text file containing at least one occurrence of the search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the read root.
    pub path: PathBuf,
    /// 1-based start line of each occurrence, in file order.
    pub lines: Vec<usize>,
}

/// A file to rewrite, with the lines whose occurrences must be kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEdit {
    /// Path relative to the read root.
    pub path: PathBuf,
    /// Occurrences starting on these 1-based lines are left untouched.
    pub skip_lines: BTreeSet<usize>,
}

impl FileEdit {
    /// Rewrites every occurrence in `path`.
    #[must_use]
    pub fn whole(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip_lines: BTreeSet::new(),
        }
    }
}

/// Outcome of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// Path relative to the write root.
    pub path: PathBuf,
    /// Occurrences found.
    pub occurrences: usize,
    /// Occurrences replaced.
    pub replaced: usize,
}

/// Literal search and replace from a read root into a write root.
///
/// Files are streamed from `read_root` and written to the same relative path
/// under `write_root`; the read root is never modified.
#[derive(Debug, Clone)]
pub struct Replacer {
    read_root: PathBuf,
    write_root: PathBuf,
    search: String,
    replacement: String,
    pattern: Pattern,
}

impl Replacer {
    /// Prepares a replacement of `search` by `replacement`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplaceError::EmptySearch`] for an empty search and
    /// [`ReplaceError::SameRoot`] when both roots are the same path.
    pub fn new(
        read: impl Into<PathBuf>,
        write: impl Into<PathBuf>,
        search: &str,
        replacement: &str,
    ) -> Result<Self, ReplaceError> {
        if search.is_empty() {
            return Err(ReplaceError::EmptySearch);
        }
        let read_root = read.into();
        let write_root = write.into();
        if read_root == write_root {
            return Err(ReplaceError::SameRoot { path: read_root });
        }
        Ok(Self {
            read_root,
            write_root,
            search: search.to_owned(),
            replacement: replacement.to_owned(),
            pattern: Pattern::new(search, replacement),
        })
    }

    /// Tree that files are read from.
    #[must_use]
    pub fn read_root(&self) -> &Path {
        &self.read_root
    }

    /// Tree that rewritten files are written to.
    #[must_use]
    pub fn write_root(&self) -> &Path {
        &self.write_root
    }

    /// The literal search text.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// The literal replacement text.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Finds every text file under the read root that contains the search
    /// text, sorted by path.
    ///
    /// Ignored paths are pruned from the walk and binary files are skipped.
    /// Files are scanned concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first walk or read error; no partial result is returned.
    pub fn find(&self, ignore: &IgnoreSet) -> Result<Vec<Candidate>, ReplaceError> {
        let files = self.walk(ignore)?;
        let scanned = files
            .par_iter()
            .map(|relative| self.scan(relative))
            .collect::<Result<Vec<_>, _>>()?;
        let candidates: Vec<Candidate> = scanned.into_iter().flatten().collect();
        info!(
            target: REPLACE_TARGET,
            root = %self.read_root.display(),
            files = files.len(),
            candidates = candidates.len(),
            "search complete"
        );
        Ok(candidates)
    }

    /// Rewrites each file in `edits` concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if any single file fails; other files may already
    /// have been written.
    pub fn apply(&self, edits: &[FileEdit]) -> Result<Vec<Rewrite>, ReplaceError> {
        edits.par_iter().map(|edit| self.rewrite(edit)).collect()
    }

    /// Finds and rewrites every candidate in full.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::find`] and [`Self::apply`].
    pub fn replace_all(&self, ignore: &IgnoreSet) -> Result<Vec<Rewrite>, ReplaceError> {
        let edits: Vec<FileEdit> = self
            .find(ignore)?
            .into_iter()
            .map(|candidate| FileEdit::whole(candidate.path))
            .collect();
        self.apply(&edits)
    }

    fn walk(&self, ignore: &IgnoreSet) -> Result<Vec<PathBuf>, ReplaceError> {
        let root = &self.read_root;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !ignore.is_ignored(relative_to(root, entry.path())));

        let mut files = Vec::new();
        for result in walker {
            let entry = result.map_err(|error| ReplaceError::Walk {
                path: error.path().map_or_else(|| root.clone(), Path::to_path_buf),
                source: Arc::new(error),
            })?;
            if entry.file_type().is_file() {
                files.push(relative_to(root, entry.path()).to_path_buf());
            }
        }
        Ok(files)
    }

    fn scan(&self, relative: &Path) -> Result<Option<Candidate>, ReplaceError> {
        let path = self.read_root.join(relative);
        let read_error = |error| ReplaceError::read(path.clone(), error);
        let mut file = File::open(&path).map_err(read_error)?;
        let head = probe::read_head(&mut file).map_err(read_error)?;
        if probe::is_binary(&head) {
            debug!(target: REPLACE_TARGET, file = %relative.display(), "skipping binary file");
            return Ok(None);
        }

        let reader = Cursor::new(head).chain(BufReader::new(file));
        let lines = self
            .pattern
            .substitute(reader, io::sink(), &BTreeSet::new())
            .map_err(|error| match error {
                StreamError::Read(source) | StreamError::Write(source) => read_error(source),
            })?;
        Ok((!lines.is_empty()).then(|| Candidate {
            path: relative.to_path_buf(),
            lines,
        }))
    }

    fn rewrite(&self, edit: &FileEdit) -> Result<Rewrite, ReplaceError> {
        let source = self.read_root.join(&edit.path);
        let target = self.write_root.join(&edit.path);

        let reader = File::open(&source).map_err(|error| ReplaceError::read(source.clone(), error))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|error| ReplaceError::write(target.clone(), error))?;
        }
        let writer = File::create(&target).map_err(|error| ReplaceError::write(target.clone(), error))?;

        let lines = self
            .pattern
            .substitute(BufReader::new(reader), BufWriter::new(writer), &edit.skip_lines)
            .map_err(|error| match error {
                StreamError::Read(source_error) => ReplaceError::read(source.clone(), source_error),
                StreamError::Write(target_error) => ReplaceError::write(target.clone(), target_error),
            })?;

        let replaced = lines
            .iter()
            .filter(|line| !edit.skip_lines.contains(*line))
            .count();
        debug!(
            target: REPLACE_TARGET,
            file = %edit.path.display(),
            occurrences = lines.len(),
            replaced,
            "rewrote file"
        );
        Ok(Rewrite {
            path: edit.path.clone(),
            occurrences: lines.len(),
            replaced,
        })
    }
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
