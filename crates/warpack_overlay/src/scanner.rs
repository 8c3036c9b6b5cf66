//! Pattern-based selection of files under a directory.
//!
//! Patterns use Ant-style wildcards relative to the scanned directory:
//! `*` matches within one path segment, `**` matches any number of segments
//! (including none), and a pattern ending in `/` selects everything below that
//! directory. A file is selected when it matches at least one include and no
//! exclude. Version-control metadata and editor droppings are always excluded
//! unless default excludes are turned off.

use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::paths::{normalize, PathSet};

/// Patterns excluded from every scan unless disabled.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/SCCS",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn",
    "**/.svn/**",
    "**/.bzr",
    "**/.bzr/**",
    "**/.hg",
    "**/.hg/**",
    "**/.hgignore",
    "**/.git",
    "**/.git/**",
    "**/.gitignore",
    "**/.gitattributes",
    "**/.DS_Store",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compile one Ant-style pattern.
///
/// Returns `Ok(None)` for blank patterns, which select nothing.
pub fn compile_pattern(pattern: &str) -> Result<Option<Pattern>> {
    let mut normalized = normalize(pattern.trim());
    if normalized.is_empty() {
        return Ok(None);
    }
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    while normalized.contains("**/**") {
        normalized = normalized.replace("**/**", "**");
    }

    Pattern::new(&normalized)
        .map(Some)
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>> {
    let mut compiled = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        if let Some(p) = compile_pattern(pattern.as_ref())? {
            compiled.push(p);
        }
    }
    Ok(compiled)
}

/// Walks a directory and returns the relative paths selected by its patterns.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    base_dir: Utf8PathBuf,
    includes: Vec<String>,
    excludes: Vec<String>,
    default_excludes: bool,
}

impl DirectoryScanner {
    /// Scanner selecting every file under `base_dir`.
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            includes: vec!["**".to_string()],
            excludes: Vec::new(),
            default_excludes: true,
        }
    }

    /// Replace the include patterns. An empty list selects everything.
    pub fn with_includes<S: AsRef<str>>(mut self, includes: &[S]) -> Self {
        self.includes = if includes.is_empty() {
            vec!["**".to_string()]
        } else {
            includes.iter().map(|s| s.as_ref().to_string()).collect()
        };
        self
    }

    pub fn with_excludes<S: AsRef<str>>(mut self, excludes: &[S]) -> Self {
        self.excludes = excludes.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn with_default_excludes(mut self, enabled: bool) -> Self {
        self.default_excludes = enabled;
        self
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Selected regular files. A missing base directory yields an empty set.
    pub fn scan(&self) -> Result<PathSet> {
        self.scan_entries(false)
    }

    /// Selected files and directories.
    pub fn scan_with_directories(&self) -> Result<PathSet> {
        self.scan_entries(true)
    }

    fn scan_entries(&self, include_dirs: bool) -> Result<PathSet> {
        let mut selected = PathSet::new();
        if !self.base_dir.is_dir() {
            tracing::debug!("Scan root {} does not exist", self.base_dir);
            return Ok(selected);
        }

        let includes = compile_all(&self.includes)?;
        let mut excludes = compile_all(&self.excludes)?;
        if self.default_excludes {
            excludes.extend(compile_all(DEFAULT_EXCLUDES)?);
        }

        for entry in WalkDir::new(self.base_dir.as_std_path())
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_dir() && !include_dirs {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(self.base_dir.as_std_path())
                .map_err(|_| Error::NonUtf8Path(entry.path().to_path_buf()))?;
            let relative = relative
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(entry.path().to_path_buf()))?;
            let relative = normalize(relative);

            let included = includes
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS));
            let excluded = excludes
                .iter()
                .any(|p| p.matches_with(&relative, MATCH_OPTIONS));
            if included && !excluded {
                selected.add(relative);
            }
        }

        tracing::trace!(
            "Scanned {}: {} entries selected",
            self.base_dir,
            selected.len()
        );
        Ok(selected)
    }
}
