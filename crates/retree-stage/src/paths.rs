//! The three trees a run works across and the translations between them.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Root, working and results locations for one run.
///
/// `working` and `results` are absent until the stager creates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingPaths {
    root: PathBuf,
    working: Option<PathBuf>,
    results: Option<PathBuf>,
}

impl StagingPaths {
    /// Describes a run over `root` with nothing staged yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            working: None,
            results: None,
        }
    }

    /// The tree being transformed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The working copy, once created.
    #[must_use]
    pub fn working(&self) -> Option<&Path> {
        self.working.as_deref()
    }

    /// The results copy, while one is live.
    #[must_use]
    pub fn results(&self) -> Option<&Path> {
        self.results.as_deref()
    }

    pub(crate) fn set_working(&mut self, working: Option<PathBuf>) {
        self.working = working;
    }

    pub(crate) fn set_results(&mut self, results: Option<PathBuf>) {
        self.results = results;
    }

    /// Location of the results copy for the current working copy.
    #[must_use]
    pub fn results_path_for(working: &Path) -> PathBuf {
        suffixed(working, ".results")
    }

    /// Location of the root backup taken during commit.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        suffixed(&self.root, ".bak")
    }

    /// The most recently staged tree: results, else working, else root.
    #[must_use]
    pub fn active(&self) -> &Path {
        self.results
            .as_deref()
            .or(self.working.as_deref())
            .unwrap_or(&self.root)
    }

    /// Resolves `path` against the active tree; absolute paths pass through.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.active().join(path)
        }
    }

    /// Resolves `path` into the active tree, refusing anything that would
    /// land outside it.
    ///
    /// The path is normalised lexically first. Absolute paths under the root,
    /// working or results trees are rebased onto the active tree; relative
    /// paths may use `..` as long as they stay inside it. Returns `None` for
    /// paths that escape, and for the active tree itself.
    #[must_use]
    pub fn confine(&self, path: &Path) -> Option<PathBuf> {
        let active = self.active();
        let resolved = if path.is_absolute() {
            let relative = self.relative(&normalise(path))?;
            active.join(relative)
        } else {
            normalise(&active.join(path))
        };
        match resolved.strip_prefix(active) {
            Ok(inner) if !inner.as_os_str().is_empty() => Some(resolved),
            _ => None,
        }
    }

    /// Strips whichever staging prefix `path` lives under, yielding a
    /// root-relative path. Returns `None` for paths outside all three trees.
    #[must_use]
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        self.prefixes()
            .find_map(|prefix| path.strip_prefix(prefix).ok())
            .map(Path::to_path_buf)
    }

    /// Rewrites staging prefixes in the header lines of diff output so that
    /// every reported path is tree-relative.
    ///
    /// Hunk bodies are copied verbatim: the `@@ -a,b +c,d @@` counts say how
    /// many lines follow, so a removed content line such as `-- /x` is never
    /// mistaken for a `--- ` header.
    #[must_use]
    pub fn strip_prefixes(&self, diff: &str) -> String {
        let mut stripped = String::with_capacity(diff.len());
        let mut hunk = Hunk::default();
        for line in diff.split_inclusive('\n') {
            if hunk.is_open() && hunk.consume(line) {
                stripped.push_str(line);
            } else if let Some(next) = Hunk::parse(line) {
                hunk = next;
                stripped.push_str(line);
            } else if is_diff_header(line) {
                stripped.push_str(&self.strip_line(line));
            } else {
                stripped.push_str(line);
            }
        }
        stripped
    }

    fn strip_line(&self, line: &str) -> String {
        let mut rewritten = line.to_owned();
        for prefix in self.prefixes() {
            let text = prefix.to_string_lossy();
            rewritten = rewritten.replace(&format!("{text}/"), "");
        }
        rewritten
    }

    /// Prefixes ordered longest-first: results extends working by suffix.
    fn prefixes(&self) -> impl Iterator<Item = &Path> {
        self.results
            .as_deref()
            .into_iter()
            .chain(self.working.as_deref())
            .chain(std::iter::once(self.root.as_path()))
    }
}

/// Lines still owed to the current hunk, per side.
#[derive(Debug, Default, Clone, Copy)]
struct Hunk {
    old: usize,
    new: usize,
}

impl Hunk {
    /// Reads the line counts from an `@@ -a[,b] +c[,d] @@` header.
    fn parse(line: &str) -> Option<Self> {
        let (ranges, _) = line.strip_prefix("@@ -")?.split_once(" @@")?;
        let (old, new) = ranges.split_once(" +")?;
        Some(Self {
            old: span(old)?,
            new: span(new)?,
        })
    }

    const fn is_open(self) -> bool {
        self.old > 0 || self.new > 0
    }

    /// Accounts for one body line. Returns false for a line that cannot
    /// belong to a hunk, which closes it.
    fn consume(&mut self, line: &str) -> bool {
        match line.as_bytes().first() {
            Some(b' ') => {
                self.old = self.old.saturating_sub(1);
                self.new = self.new.saturating_sub(1);
            }
            Some(b'-') => self.old = self.old.saturating_sub(1),
            Some(b'+') => self.new = self.new.saturating_sub(1),
            Some(b'\\') => {}
            _ => {
                *self = Self::default();
                return false;
            }
        }
        true
    }
}

fn span(range: &str) -> Option<usize> {
    match range.split_once(',') {
        Some((_, count)) => count.parse().ok(),
        None => Some(1),
    }
}

fn is_diff_header(line: &str) -> bool {
    ["diff ", "--- ", "+++ ", "Only in ", "Binary files "]
        .iter()
        .any(|marker| line.starts_with(marker))
}

/// Collapses `.` and `..` components without touching the filesystem.
/// `..` at the filesystem root stays at the root.
#[must_use]
pub fn normalise(path: &Path) -> PathBuf {
    let mut normalised = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalised.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalised.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::CurDir | Component::ParentDir) | None => {
                    normalised.push(component);
                }
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalised.push(component);
            }
        }
    }
    normalised
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}
