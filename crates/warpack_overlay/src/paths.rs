//! Normalized relative paths.
//!
//! Every path that crosses an overlay boundary (scanner output, webapp targets,
//! cached ownership) is stored in one canonical form: forward slashes, no
//! leading slash. Two spellings of the same relative path therefore compare
//! equal regardless of platform.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Canonical form of a relative path.
///
/// Backslashes become forward slashes and all leading slashes are stripped:
///
/// - `WEB-INF\lib\a.jar` -> `WEB-INF/lib/a.jar`
/// - `/index.html` -> `index.html`
/// - `//static/app.js` -> `static/app.js`
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// A set of normalized relative paths.
///
/// Iteration follows insertion order. Equality is set equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PathSet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.add_all(paths);
        set
    }

    /// Insert a path. Returns `false` if it was already present.
    pub fn add(&mut self, path: impl AsRef<str>) -> bool {
        let normalized = normalize(path.as_ref());
        if self.members.contains(&normalized) {
            return false;
        }
        self.members.insert(normalized.clone());
        self.order.push(normalized);
        true
    }

    pub fn add_all<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.add(path);
        }
    }

    /// Insert `prefix + path` for every path.
    pub fn add_all_with_prefix<I, S>(&mut self, paths: I, prefix: &str)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.add(format!("{}{}", prefix, path.as_ref()));
        }
    }

    /// Union with another set.
    pub fn extend(&mut self, other: &PathSet) {
        self.add_all(other.iter());
    }

    pub fn contains(&self, path: impl AsRef<str>) -> bool {
        self.members.contains(&normalize(path.as_ref()))
    }

    /// Rewrite every member to `prefix + member`.
    pub fn add_prefix(&mut self, prefix: &str) {
        let old = std::mem::take(&mut self.order);
        self.members.clear();
        self.add_all_with_prefix(old, prefix);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Members in lexicographic order.
    pub fn sorted(&self) -> Vec<String> {
        let mut paths = self.order.clone();
        paths.sort();
        paths
    }
}

impl PartialEq for PathSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for PathSet {}

impl From<Vec<String>> for PathSet {
    fn from(paths: Vec<String>) -> Self {
        Self::from_paths(paths)
    }
}

impl From<PathSet> for Vec<String> {
    fn from(set: PathSet) -> Self {
        set.order
    }
}

impl<S: AsRef<str>> FromIterator<S> for PathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_paths(iter)
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.order
            .iter()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}
