//! Ownership of webapp files across builds.
//!
//! A [`WebappStructure`] records, for every file written to the webapp, the
//! overlay that wrote it. When the cache is enabled the structure is saved as
//! `webapp-cache.json` in the work directory after a successful build, and
//! the next build compares its registrations against the previous one to
//! report files whose owner changed.
//!
//! Ownership is informational. Which overlay wins a path is decided by the
//! builder's protected set, never by this cache.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::paths::{normalize, PathSet};

const STRUCTURE_VERSION: u32 = 1;

/// Outcome of [`WebappStructure::register_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// First registration of the path, and the previous build had no owner for it.
    Registered,
    /// The previous build registered the path to the same owner.
    AlreadyRegistered,
    /// Another owner already registered the path during this build.
    ///
    /// Only direct callers see this. The webapp builder never registers a
    /// path that an earlier overlay already protects.
    Refused { owner: String },
    /// The previous build's owner is still part of this build.
    Superseded { previous: String },
    /// The previous build's owner is no longer part of this build.
    SupersededUnknownOwner { previous: String },
}

/// Persisted webapp ownership map.
///
/// # JSON format
///
/// ```json
/// {
///   "version": 1,
///   "registeredFiles": {
///     "currentBuild": ["index.html", "WEB-INF/web.xml"],
///     "com.example:theme": ["css/theme.css"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebappStructure {
    pub version: u32,

    registered_files: BTreeMap<String, PathSet>,

    #[serde(skip)]
    all_files: PathSet,

    #[serde(skip)]
    cache: Option<Box<WebappStructure>>,
}

impl Default for WebappStructure {
    fn default() -> Self {
        Self {
            version: STRUCTURE_VERSION,
            registered_files: BTreeMap::new(),
            all_files: PathSet::new(),
            cache: None,
        }
    }
}

impl WebappStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh structure that compares registrations against `previous`.
    pub fn with_cache(previous: Option<WebappStructure>) -> Self {
        Self {
            cache: previous.map(Box::new),
            ..Self::default()
        }
    }

    /// Declare the owners taking part in this build.
    ///
    /// Owners without files still count when deciding whether a cached owner
    /// is known.
    pub fn register_owners<I, S>(&mut self, owners: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for owner in owners {
            self.registered_files.entry(owner.into()).or_default();
        }
    }

    /// Register `path` as written by `owner`.
    pub fn register_file(&mut self, owner: &str, path: &str) -> Registration {
        let path = normalize(path);
        if let Some(current) = self.owner(&path) {
            return Registration::Refused {
                owner: current.to_string(),
            };
        }

        self.all_files.add(&path);
        self.registered_files
            .entry(owner.to_string())
            .or_default()
            .add(&path);

        let previous = self
            .cache
            .as_ref()
            .and_then(|cache| cache.owner(&path))
            .map(str::to_string);
        match previous {
            None => Registration::Registered,
            Some(previous) if previous == owner => Registration::AlreadyRegistered,
            Some(previous) if self.registered_files.contains_key(&previous) => {
                Registration::Superseded { previous }
            }
            Some(previous) => Registration::SupersededUnknownOwner { previous },
        }
    }

    pub fn is_registered(&self, path: &str) -> bool {
        self.all_files.contains(path)
    }

    /// The owner that registered `path`, if any.
    pub fn owner(&self, path: &str) -> Option<&str> {
        if !self.is_registered(path) {
            return None;
        }
        self.registered_files
            .iter()
            .find(|(_, files)| files.contains(path))
            .map(|(owner, _)| owner.as_str())
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.registered_files.keys().map(String::as_str)
    }

    /// Every registered path.
    pub fn full_structure(&self) -> &PathSet {
        &self.all_files
    }

    /// Paths registered by `owner`.
    pub fn structure(&self, owner: &str) -> Option<&PathSet> {
        self.registered_files.get(owner)
    }

    pub fn cache(&self) -> Option<&WebappStructure> {
        self.cache.as_deref()
    }

    /// Load a structure from a file.
    ///
    /// Returns `Ok(None)` if the file doesn't exist or was written by a
    /// different format version.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path.as_std_path())?;
        let mut structure: Self = serde_json::from_str(&contents)?;
        if structure.version != STRUCTURE_VERSION {
            tracing::info!(
                "Ignoring webapp cache {} with version {}",
                path,
                structure.version
            );
            return Ok(None);
        }

        for files in structure.registered_files.values() {
            structure.all_files.extend(files);
        }
        Ok(Some(structure))
    }

    /// Save the structure, creating parent directories if needed.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_first_registration_wins() {
        let mut structure = WebappStructure::new();
        assert_eq!(
            structure.register_file("a", "index.html"),
            Registration::Registered
        );
        assert_eq!(
            structure.register_file("b", "/index.html"),
            Registration::Refused {
                owner: "a".to_string()
            }
        );
        assert_eq!(structure.owner("index.html"), Some("a"));
        assert!(structure.structure("b").is_none());
    }

    #[test]
    fn test_registration_against_cache() {
        let mut previous = WebappStructure::new();
        previous.register_file("currentBuild", "index.html");
        previous.register_file("theme", "css/a.css");
        previous.register_file("legacy", "old.js");
        previous.register_file("theme", "shared.txt");

        let mut structure = WebappStructure::with_cache(Some(previous));
        structure.register_owners(["currentBuild", "theme"]);

        assert_eq!(
            structure.register_file("currentBuild", "index.html"),
            Registration::AlreadyRegistered
        );
        assert_eq!(
            structure.register_file("currentBuild", "shared.txt"),
            Registration::Superseded {
                previous: "theme".to_string()
            }
        );
        assert_eq!(
            structure.register_file("theme", "old.js"),
            Registration::SupersededUnknownOwner {
                previous: "legacy".to_string()
            }
        );
        assert_eq!(
            structure.register_file("theme", "new.js"),
            Registration::Registered
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("work/webapp-cache.json")).unwrap();
        assert!(WebappStructure::load(&path).unwrap().is_none());

        let mut structure = WebappStructure::new();
        structure.register_owners(["empty"]);
        structure.register_file("currentBuild", "WEB-INF/web.xml");
        structure.register_file("theme", "css/theme.css");
        structure.save(&path).unwrap();

        let loaded = WebappStructure::load(&path).unwrap().unwrap();
        assert_eq!(loaded.owner("css/theme.css"), Some("theme"));
        assert!(loaded.is_registered("WEB-INF/web.xml"));
        assert_eq!(loaded.full_structure().len(), 2);
        assert_eq!(
            loaded.owners().collect::<Vec<_>>(),
            vec!["currentBuild", "empty", "theme"]
        );
    }

    #[test]
    fn test_load_ignores_other_versions() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("cache.json")).unwrap();
        std::fs::write(&path, r#"{"version": 99, "registeredFiles": {}}"#).unwrap();

        assert!(WebappStructure::load(&path).unwrap().is_none());
    }
}
