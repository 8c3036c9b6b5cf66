//! Types and helpers for warpack project definitions.
//!
//! A project is described by a `war.config.json` or `war.config.toml` file next
//! to the sources. It names the project's coordinates, the directories used
//! during assembly, the dependencies (with their backing files) and the
//! overlays to apply.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub mod artifact;
pub mod error;

pub use artifact::{compare_versions, normalize_classifier, Artifact, ArtifactType};
pub use error::ProjectError;

pub type Result<T> = std::result::Result<T, ProjectError>;

/// Config file names, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["war.config.json", "war.config.toml"];

/// Includes applied to dependent WARs when no legacy includes are configured.
pub const DEFAULT_DEPENDENT_WAR_INCLUDES: &[&str] = &["**/**"];

/// Excludes applied to dependent WARs when no legacy excludes are configured.
pub const DEFAULT_DEPENDENT_WAR_EXCLUDES: &[&str] = &["META-INF/**"];

/// Describes a web application project.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct WarProject {
    /// Example: `com.example`
    pub group_id: String,

    /// Example: `storefront`
    pub artifact_id: String,

    /// Example: `1.0.0`
    pub version: String,

    /// Base name of the assembled webapp and of the produced archive.
    /// Defaults to `<artifact_id>-<version>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,

    /// Classifier appended to the produced archive name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    /// Directory layout used during assembly
    #[serde(default)]
    pub directories: ProjectDirectories,

    /// Patterns selecting the files copied from the webapp source directory
    #[serde(default = "default_includes")]
    pub war_source_includes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub war_source_excludes: Vec<String>,

    /// Legacy include patterns for dependent WARs.
    /// Cannot be combined with `overlays`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_war_includes: Option<Vec<String>>,

    /// Legacy exclude patterns for dependent WARs.
    /// Cannot be combined with `overlays`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_war_excludes: Option<Vec<String>>,

    /// Patterns selecting the webapp files that go into the archive
    #[serde(default = "default_includes")]
    pub packaging_includes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packaging_excludes: Vec<String>,

    /// Whether to fail packaging when `WEB-INF/web.xml` is missing
    #[serde(default = "default_true")]
    pub fail_on_missing_web_xml: bool,

    /// Persist which overlay owns which webapp file across runs
    #[serde(default)]
    pub use_cache: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyConfig>,

    /// Overlays in precedence order (earlier wins)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overlays: Vec<OverlayConfig>,
}

/// Directories used while assembling the webapp.
///
/// Relative paths are resolved against the config file's directory by
/// [`WarProject::resolve_paths`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ProjectDirectories {
    /// Webapp sources (JSPs, static files, `WEB-INF/web.xml`)
    #[serde(default = "default_war_source_directory")]
    pub war_source: Utf8PathBuf,

    /// Compiled classes copied to `WEB-INF/classes`
    #[serde(default = "default_classes_directory")]
    pub classes: Utf8PathBuf,

    /// Where dependent WARs are unpacked
    #[serde(default = "default_work_directory")]
    pub work: Utf8PathBuf,

    /// Where the produced archive is written
    #[serde(default = "default_output_directory")]
    pub output: Utf8PathBuf,

    /// Where the webapp is assembled. Defaults to `<output>/<final_name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webapp: Option<Utf8PathBuf>,

    /// Webapp structure cache. Defaults to `<work>/webapp-cache.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<Utf8PathBuf>,
}

impl Default for ProjectDirectories {
    fn default() -> Self {
        Self {
            war_source: default_war_source_directory(),
            classes: default_classes_directory(),
            work: default_work_directory(),
            output: default_output_directory(),
            webapp: None,
            cache_file: None,
        }
    }
}

/// A build dependency and the file backing it.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct DependencyConfig {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    /// Type string such as `war`, `zip` or `jar`
    #[serde(default = "default_type", rename = "type")]
    pub artifact_type: String,

    /// Path to the dependency's archive
    pub file: Utf8PathBuf,
}

/// A configured overlay.
///
/// An overlay with neither `group_id` nor `artifact_id` stands for the
/// current project.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct OverlayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    #[serde(default = "default_type", rename = "type")]
    pub artifact_type: String,

    #[serde(default = "default_includes")]
    pub includes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,

    /// Keep the overlay in the list but copy nothing from it
    #[serde(default)]
    pub skip: bool,

    /// Directory inside the webapp the overlay's files are copied to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            id: None,
            group_id: None,
            artifact_id: None,
            classifier: None,
            artifact_type: default_type(),
            includes: default_includes(),
            excludes: Vec::new(),
            skip: false,
            target_path: None,
        }
    }
}

fn default_includes() -> Vec<String> {
    vec!["**".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_type() -> String {
    "war".to_string()
}

fn default_war_source_directory() -> Utf8PathBuf {
    Utf8PathBuf::from("src/main/webapp")
}

fn default_classes_directory() -> Utf8PathBuf {
    Utf8PathBuf::from("target/classes")
}

fn default_work_directory() -> Utf8PathBuf {
    Utf8PathBuf::from("target/war/work")
}

fn default_output_directory() -> Utf8PathBuf {
    Utf8PathBuf::from("target")
}

impl WarProject {
    /// Load and validate a project from a `.json` or `.toml` file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let project: WarProject = match path.extension() {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content)?
            }
            Some("toml") => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => return Err(ProjectError::UnsupportedConfigFormat(path.to_path_buf())),
        };

        project.validate()?;
        Ok(project)
    }

    /// Find the config file in a directory. JSON is preferred over TOML.
    pub fn find_config(project_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| project_dir.join(name))
            .find(|path| path.exists())
    }

    /// Check every type string maps to a known [`ArtifactType`].
    pub fn validate(&self) -> Result<()> {
        self.dependency_artifacts()?;
        for overlay in &self.overlays {
            parse_type(&overlay.artifact_type, || {
                format!(
                    "overlay {}:{}",
                    overlay.group_id.as_deref().unwrap_or("-"),
                    overlay.artifact_id.as_deref().unwrap_or("-")
                )
            })?;
        }
        Ok(())
    }

    /// `<final_name>` or `<artifact_id>-<version>`
    pub fn final_name(&self) -> String {
        self.final_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.artifact_id, self.version))
    }

    /// `<final_name>[-<classifier>].war`
    pub fn war_file_name(&self) -> String {
        match normalize_classifier(self.classifier.as_deref()) {
            Some(classifier) if classifier.starts_with('-') => {
                format!("{}{}.war", self.final_name(), classifier)
            }
            Some(classifier) => format!("{}-{}.war", self.final_name(), classifier),
            None => format!("{}.war", self.final_name()),
        }
    }

    pub fn webapp_directory(&self) -> Utf8PathBuf {
        self.directories
            .webapp
            .clone()
            .unwrap_or_else(|| self.directories.output.join(self.final_name()))
    }

    pub fn cache_file(&self) -> Utf8PathBuf {
        self.directories
            .cache_file
            .clone()
            .unwrap_or_else(|| self.directories.work.join("webapp-cache.json"))
    }

    /// Make every relative directory and dependency file absolute against `base_dir`.
    pub fn resolve_paths(&mut self, base_dir: &Utf8Path) {
        let resolve = |path: &mut Utf8PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };

        let dirs = &mut self.directories;
        resolve(&mut dirs.war_source);
        resolve(&mut dirs.classes);
        resolve(&mut dirs.work);
        resolve(&mut dirs.output);
        if let Some(webapp) = dirs.webapp.as_mut() {
            resolve(webapp);
        }
        if let Some(cache_file) = dirs.cache_file.as_mut() {
            resolve(cache_file);
        }
        for dependency in &mut self.dependencies {
            resolve(&mut dependency.file);
        }
    }

    /// Map the configured dependencies to [`Artifact`]s.
    pub fn dependency_artifacts(&self) -> Result<Vec<Artifact>> {
        self.dependencies
            .iter()
            .map(|dep| {
                let artifact_type = parse_type(&dep.artifact_type, || {
                    format!("{}:{}:{}", dep.group_id, dep.artifact_id, dep.version)
                })?;
                Ok(Artifact::new(
                    dep.group_id.clone(),
                    dep.artifact_id.clone(),
                    dep.version.clone(),
                    artifact_type,
                    dep.file.clone(),
                )
                .with_classifier(dep.classifier.as_deref()))
            })
            .collect()
    }

    /// Legacy includes, or the default `**/**`.
    pub fn dependent_war_includes(&self) -> Vec<String> {
        self.dependent_war_includes
            .clone()
            .unwrap_or_else(|| to_strings(DEFAULT_DEPENDENT_WAR_INCLUDES))
    }

    /// Legacy excludes, or the default `META-INF/**`.
    pub fn dependent_war_excludes(&self) -> Vec<String> {
        self.dependent_war_excludes
            .clone()
            .unwrap_or_else(|| to_strings(DEFAULT_DEPENDENT_WAR_EXCLUDES))
    }

    /// Whether either legacy pattern list was set explicitly.
    pub fn uses_legacy_overlay_patterns(&self) -> bool {
        self.dependent_war_includes.is_some() || self.dependent_war_excludes.is_some()
    }
}

impl OverlayConfig {
    pub fn artifact_type(&self) -> Result<ArtifactType> {
        parse_type(&self.artifact_type, || {
            format!(
                "overlay {}:{}",
                self.group_id.as_deref().unwrap_or("-"),
                self.artifact_id.as_deref().unwrap_or("-")
            )
        })
    }
}

fn parse_type(type_name: &str, artifact: impl FnOnce() -> String) -> Result<ArtifactType> {
    type_name
        .parse()
        .map_err(|_| ProjectError::UnknownArtifactType {
            type_name: type_name.to_string(),
            artifact: artifact(),
        })
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const EXAMPLE_JSON: &str = r#"
    {
        "group_id": "com.example",
        "artifact_id": "storefront",
        "version": "1.2.0",
        "directories": { "work": "build/work" },
        "dependencies": [
            { "group_id": "com.example", "artifact_id": "theme", "version": "3.0", "file": "libs/theme-3.0.war" },
            { "group_id": "com.example", "artifact_id": "util", "version": "1.0", "type": "jar", "file": "libs/util-1.0.jar" }
        ],
        "overlays": [
            { "group_id": "com.example", "artifact_id": "theme", "excludes": ["META-INF/**"] },
            {}
        ]
    }
    "#;

    const EXAMPLE_TOML: &str = r#"
group_id = "com.example"
artifact_id = "storefront"
version = "1.2.0"

[directories]
work = "build/work"

[[dependencies]]
group_id = "com.example"
artifact_id = "theme"
version = "3.0"
file = "libs/theme-3.0.war"

[[dependencies]]
group_id = "com.example"
artifact_id = "util"
version = "1.0"
type = "jar"
file = "libs/util-1.0.jar"

[[overlays]]
group_id = "com.example"
artifact_id = "theme"
excludes = ["META-INF/**"]

[[overlays]]
"#;

    #[test]
    fn test_json_parsing() {
        let project: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();

        assert_eq!(project.artifact_id, "storefront");
        assert_eq!(project.directories.work, Utf8PathBuf::from("build/work"));
        assert_eq!(
            project.directories.war_source,
            Utf8PathBuf::from("src/main/webapp")
        );
        assert_eq!(project.dependencies.len(), 2);
        assert_eq!(project.dependencies[0].artifact_type, "war");
        assert_eq!(project.overlays.len(), 2);
        assert_eq!(project.overlays[0].includes, vec!["**".to_string()]);
        assert_eq!(project.overlays[1], OverlayConfig::default());
        assert!(project.fail_on_missing_web_xml);
        assert!(!project.use_cache);
    }

    #[test]
    fn test_toml_matches_json() {
        let from_json: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();
        let from_toml: WarProject = toml::from_str(EXAMPLE_TOML).unwrap();

        assert_eq!(from_json, from_toml);
    }

    #[test]
    fn test_load_rejects_unknown_type() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("war.config.json")).unwrap();
        let config = EXAMPLE_JSON.replace(r#""type": "jar""#, r#""type": "tarball""#);
        fs::write(&path, config).unwrap();

        let err = WarProject::load(&path).unwrap_err();
        match err {
            ProjectError::UnknownArtifactType {
                type_name,
                artifact,
            } => {
                assert_eq!(type_name, "tarball");
                assert_eq!(artifact, "com.example:util:1.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("war.config.yaml")).unwrap();
        fs::write(&path, "").unwrap();

        assert!(matches!(
            WarProject::load(&path),
            Err(ProjectError::UnsupportedConfigFormat(_))
        ));
    }

    #[test]
    fn test_find_config_prefers_json() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        assert_eq!(WarProject::find_config(&root), None);

        fs::write(root.join("war.config.toml"), EXAMPLE_TOML).unwrap();
        assert_eq!(
            WarProject::find_config(&root),
            Some(root.join("war.config.toml"))
        );

        fs::write(root.join("war.config.json"), EXAMPLE_JSON).unwrap();
        assert_eq!(
            WarProject::find_config(&root),
            Some(root.join("war.config.json"))
        );
    }

    #[test]
    fn test_names_and_directories() {
        let mut project: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert_eq!(project.final_name(), "storefront-1.2.0");
        assert_eq!(project.war_file_name(), "storefront-1.2.0.war");
        assert_eq!(
            project.webapp_directory(),
            Utf8PathBuf::from("target/storefront-1.2.0")
        );
        assert_eq!(
            project.cache_file(),
            Utf8PathBuf::from("build/work/webapp-cache.json")
        );

        project.classifier = Some("prod".to_string());
        assert_eq!(project.war_file_name(), "storefront-1.2.0-prod.war");

        project.classifier = Some(String::new());
        assert_eq!(project.war_file_name(), "storefront-1.2.0.war");
    }

    #[test]
    fn test_resolve_paths() {
        let mut project: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();
        project.directories.output = Utf8PathBuf::from("/abs/out");
        project.resolve_paths(Utf8Path::new("/projects/store"));

        assert_eq!(
            project.directories.work,
            Utf8PathBuf::from("/projects/store/build/work")
        );
        assert_eq!(project.directories.output, Utf8PathBuf::from("/abs/out"));
        assert_eq!(
            project.dependencies[0].file,
            Utf8PathBuf::from("/projects/store/libs/theme-3.0.war")
        );
    }

    #[test]
    fn test_dependency_artifacts() {
        let project: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();
        let artifacts = project.dependency_artifacts().unwrap();

        assert_eq!(artifacts[0].artifact_type, ArtifactType::War);
        assert_eq!(artifacts[0].classifier(), None);
        assert_eq!(artifacts[1].artifact_type, ArtifactType::Jar);
    }

    #[test]
    fn test_legacy_pattern_defaults() {
        let mut project: WarProject = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert!(!project.uses_legacy_overlay_patterns());
        assert_eq!(project.dependent_war_includes(), vec!["**/**".to_string()]);
        assert_eq!(
            project.dependent_war_excludes(),
            vec!["META-INF/**".to_string()]
        );

        project.dependent_war_excludes = Some(vec![]);
        assert!(project.uses_legacy_overlay_patterns());
        assert!(project.dependent_war_excludes().is_empty());
    }
}
