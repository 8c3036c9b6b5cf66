//! Overlays: sources of webapp files layered in precedence order.
//!
//! An overlay is either the current project (its own compiled webapp) or a
//! dependency archive unpacked into the work directory. Each carries its own
//! include/exclude patterns and an optional target path inside the webapp.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use warpack_project::{normalize_classifier, Artifact, ArtifactType, OverlayConfig};

use crate::archive::ArchiverManager;
use crate::error::{Error, Result};
use crate::paths::{normalize, PathSet};
use crate::scanner::DirectoryScanner;

/// Id of the overlay standing for the current project.
pub const CURRENT_PROJECT_ID: &str = "currentBuild";

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    id: Option<String>,
    group_id: Option<String>,
    artifact_id: Option<String>,
    classifier: Option<String>,
    artifact_type: ArtifactType,
    includes: Vec<String>,
    excludes: Vec<String>,
    skip: bool,
    target_path: Option<String>,
    artifact: Option<Artifact>,
}

impl Overlay {
    /// The overlay representing the project being built.
    pub fn current_project() -> Self {
        Self {
            id: None,
            group_id: None,
            artifact_id: None,
            classifier: None,
            artifact_type: ArtifactType::War,
            includes: vec!["**".to_string()],
            excludes: Vec::new(),
            skip: false,
            target_path: None,
            artifact: None,
        }
    }

    /// An overlay bound to a dependency, with the given patterns.
    pub fn for_artifact(artifact: &Artifact, includes: Vec<String>, excludes: Vec<String>) -> Self {
        Self {
            id: None,
            group_id: Some(artifact.group_id.clone()),
            artifact_id: Some(artifact.artifact_id.clone()),
            classifier: artifact.classifier().map(str::to_string),
            artifact_type: artifact.artifact_type,
            includes,
            excludes,
            skip: false,
            target_path: None,
            artifact: Some(artifact.clone()),
        }
    }

    /// Build an unresolved overlay from its configuration.
    pub fn from_config(config: &OverlayConfig) -> Result<Self> {
        let artifact_type = config.artifact_type()?;
        let blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            id: blank(&config.id),
            group_id: blank(&config.group_id),
            artifact_id: blank(&config.artifact_id),
            classifier: normalize_classifier(config.classifier.as_deref()).map(str::to_string),
            artifact_type,
            includes: config.includes.clone(),
            excludes: config.excludes.clone(),
            skip: config.skip,
            target_path: blank(&config.target_path),
            artifact: None,
        })
    }

    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_target_path(mut self, target_path: Option<&str>) -> Self {
        self.target_path = target_path
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// No coordinates at all means the current project.
    pub fn is_current_project(&self) -> bool {
        self.group_id.is_none() && self.artifact_id.is_none()
    }

    /// The configured id, else `groupId:artifactId[:classifier]`, else
    /// [`CURRENT_PROJECT_ID`].
    pub fn id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        match (&self.group_id, &self.artifact_id) {
            (None, None) => CURRENT_PROJECT_ID.to_string(),
            (group, artifact) => {
                let mut id = format!(
                    "{}:{}",
                    group.as_deref().unwrap_or_default(),
                    artifact.as_deref().unwrap_or_default()
                );
                if let Some(classifier) = &self.classifier {
                    id.push(':');
                    id.push_str(classifier);
                }
                id
            }
        }
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn artifact_id(&self) -> Option<&str> {
        self.artifact_id.as_deref()
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// A skipped overlay keeps its place in the list but contributes no files.
    pub fn is_skipped(&self) -> bool {
        self.skip
    }

    /// Normalized target directory with a trailing `/`, or `""` for the webapp root.
    pub fn target_path(&self) -> String {
        match &self.target_path {
            Some(path) => {
                let mut path = normalize(path);
                if !path.is_empty() && !path.ends_with('/') {
                    path.push('/');
                }
                path
            }
            None => String::new(),
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Bind this overlay to the dependency matching its coordinates.
    ///
    /// Does nothing for the current project or an overlay that is already
    /// bound. Otherwise both coordinates must be set; setting only one is a
    /// configuration error. Classifiers are compared after collapsing empty
    /// ones to `None`.
    pub fn resolve_artifact(&mut self, candidates: &[Artifact]) -> Result<()> {
        if self.artifact.is_some() || self.is_current_project() {
            return Ok(());
        }

        let (group_id, artifact_id) = match (&self.group_id, &self.artifact_id) {
            (Some(group_id), Some(artifact_id)) => (group_id, artifact_id),
            _ => {
                return Err(Error::InvalidOverlay(format!(
                    "overlay [{}] must set both group_id and artifact_id",
                    self.id()
                )))
            }
        };

        let found = candidates
            .iter()
            .find(|a| {
                a.matches(
                    group_id,
                    artifact_id,
                    self.classifier.as_deref(),
                    self.artifact_type,
                )
            })
            .cloned()
            .ok_or_else(|| Error::OverlayArtifactNotFound { overlay: self.id() })?;

        tracing::debug!("Overlay [{}] resolved to {}", self.id(), found);
        self.artifact = Some(found);
        Ok(())
    }

    /// `<work_dir>/<archive file name without its 4-character extension>`
    pub fn unpack_directory(&self, work_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let artifact = self.bound_artifact()?;
        let file_name = artifact.file().file_name().unwrap_or(artifact.artifact_id.as_str());
        let cut = file_name.len().saturating_sub(4);
        let base = if cut > 0 && file_name.is_char_boundary(cut) {
            &file_name[..cut]
        } else {
            file_name
        };
        Ok(work_dir.join(base))
    }

    /// Files this overlay contributes, relative to its root.
    ///
    /// The current project's root is `dir` itself; a dependency's root is its
    /// unpack directory below `dir`.
    pub fn files_in_overlay(&self, dir: &Utf8Path) -> Result<PathSet> {
        let root = if self.is_current_project() {
            dir.to_path_buf()
        } else {
            self.unpack_directory(dir)?
        };
        DirectoryScanner::new(root)
            .with_includes(&self.includes)
            .with_excludes(&self.excludes)
            .scan()
    }

    /// Unpack the bound archive into its unpack directory.
    ///
    /// Extraction is skipped when the directory exists and is at least as new
    /// as the archive.
    pub fn unpack(&self, archivers: &dyn ArchiverManager, work_dir: &Utf8Path) -> Result<Utf8PathBuf> {
        let artifact = self.bound_artifact()?;
        let archive = artifact.file();
        let destination = self.unpack_directory(work_dir)?;

        if destination.is_dir() {
            let archive_modified = fs::metadata(archive.as_std_path())?.modified()?;
            let unpacked_modified = fs::metadata(destination.as_std_path())?.modified()?;
            if archive_modified <= unpacked_modified {
                tracing::debug!(
                    "Overlay [{}] is up to date in {}",
                    self.id(),
                    destination
                );
                return Ok(destination);
            }
        }

        let extension = archive
            .extension()
            .unwrap_or(artifact.artifact_type.extension());
        let unarchiver = archivers.unarchiver(extension)?;

        tracing::info!("Unpacking overlay [{}] to {}", self.id(), destination);
        if let Err(source) = unarchiver.extract(archive, &destination) {
            // A partial directory would look up to date on the next run.
            if let Err(e) = fs::remove_dir_all(destination.as_std_path()) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove partial unpack of {}: {}", destination, e);
                }
            }
            return Err(Error::Unpack {
                archive: archive.to_path_buf(),
                destination,
                source: Box::new(source),
            });
        }
        Ok(destination)
    }

    fn bound_artifact(&self) -> Result<&Artifact> {
        self.artifact.as_ref().ok_or_else(|| {
            Error::InvalidOverlay(format!(
                "overlay [{}] is not bound to an artifact",
                self.id()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::DefaultArchiverManager;
    use std::fs::File;
    use std::io::Write;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn war(group: &str, artifact: &str, classifier: Option<&str>) -> Artifact {
        Artifact::new(
            group,
            artifact,
            "1.0",
            ArtifactType::War,
            format!("/repo/{artifact}-1.0.war"),
        )
        .with_classifier(classifier)
    }

    fn config(group: &str, artifact: &str) -> OverlayConfig {
        OverlayConfig {
            group_id: Some(group.to_string()),
            artifact_id: Some(artifact.to_string()),
            ..OverlayConfig::default()
        }
    }

    fn write_war(path: &Utf8Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, content) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_ids() {
        assert_eq!(Overlay::current_project().id(), "currentBuild");
        assert!(Overlay::current_project().is_current_project());

        let overlay = Overlay::from_config(&config("com.example", "theme")).unwrap();
        assert_eq!(overlay.id(), "com.example:theme");

        let mut with_classifier = config("com.example", "theme");
        with_classifier.classifier = Some("dark".to_string());
        let overlay = Overlay::from_config(&with_classifier).unwrap();
        assert_eq!(overlay.id(), "com.example:theme:dark");

        let mut named = config("com.example", "theme");
        named.id = Some("skin".to_string());
        assert_eq!(Overlay::from_config(&named).unwrap().id(), "skin");
    }

    #[test]
    fn test_empty_config_is_current_project() {
        let overlay = Overlay::from_config(&OverlayConfig::default()).unwrap();
        assert!(overlay.is_current_project());
        assert_eq!(overlay.id(), CURRENT_PROJECT_ID);
    }

    #[test]
    fn test_resolve_artifact() {
        let candidates = vec![war("g", "a", None), war("g", "b", None)];
        let mut overlay = Overlay::from_config(&config("g", "b")).unwrap();

        overlay.resolve_artifact(&candidates).unwrap();
        assert_eq!(overlay.artifact().unwrap().artifact_id, "b");

        // Resolution happens once; later candidates are ignored.
        overlay.resolve_artifact(&[war("g", "a", None)]).unwrap();
        assert_eq!(overlay.artifact().unwrap().artifact_id, "b");
    }

    #[test]
    fn test_resolve_treats_empty_classifier_as_none() {
        let candidates = vec![war("g", "a", None)];

        let mut overlay_config = config("g", "a");
        overlay_config.classifier = Some(String::new());
        let mut overlay = Overlay::from_config(&overlay_config).unwrap();
        assert!(overlay.resolve_artifact(&candidates).is_ok());

        let candidates = vec![war("g", "a", Some(""))];
        let mut overlay = Overlay::from_config(&config("g", "a")).unwrap();
        assert!(overlay.resolve_artifact(&candidates).is_ok());
    }

    #[test]
    fn test_resolve_requires_matching_classifier() {
        let candidates = vec![war("g", "a", Some("dark"))];
        let mut overlay = Overlay::from_config(&config("g", "a")).unwrap();

        assert!(matches!(
            overlay.resolve_artifact(&candidates),
            Err(Error::OverlayArtifactNotFound { overlay }) if overlay == "g:a"
        ));
    }

    #[test]
    fn test_resolve_is_noop_for_current_project() {
        let mut overlay = Overlay::current_project();
        overlay.resolve_artifact(&[]).unwrap();
        assert!(overlay.artifact().is_none());
    }

    #[test]
    fn test_resolve_requires_both_coordinates() {
        let mut overlay_config = OverlayConfig::default();
        overlay_config.group_id = Some("g".to_string());
        let mut overlay = Overlay::from_config(&overlay_config).unwrap();

        assert!(!overlay.is_current_project());
        assert!(matches!(
            overlay.resolve_artifact(&[war("g", "a", None)]),
            Err(Error::InvalidOverlay(_))
        ));
    }

    #[test]
    fn test_unpack_directory_strips_extension() {
        let overlay = Overlay::for_artifact(&war("g", "theme", None), vec![], vec![]);
        assert_eq!(
            overlay.unpack_directory(Utf8Path::new("/work")).unwrap(),
            Utf8PathBuf::from("/work/theme-1.0")
        );

        assert!(Overlay::current_project()
            .unpack_directory(Utf8Path::new("/work"))
            .is_err());
    }

    #[test]
    fn test_target_path_normalized() {
        let overlay = Overlay::current_project().with_target_path(Some("\\static"));
        assert_eq!(overlay.target_path(), "static/");

        let overlay = Overlay::current_project().with_target_path(Some("WEB-INF/"));
        assert_eq!(overlay.target_path(), "WEB-INF/");

        assert_eq!(Overlay::current_project().target_path(), "");
    }

    #[test]
    fn test_unpack_and_files_in_overlay() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = root.join("theme-3.0.war");
        write_war(
            &archive,
            &[
                ("index.html", "theme"),
                ("META-INF/MANIFEST.MF", "Manifest-Version: 1.0"),
            ],
        );

        let artifact = Artifact::new("g", "theme", "3.0", ArtifactType::War, archive.clone());
        let overlay = Overlay::for_artifact(&artifact, vec!["**/**".into()], vec!["META-INF/**".into()]);

        let work = root.join("work");
        let unpacked = overlay.unpack(&DefaultArchiverManager, &work).unwrap();
        assert_eq!(unpacked, work.join("theme-3.0"));

        let files = overlay.files_in_overlay(&work).unwrap();
        assert_eq!(files.sorted(), vec!["index.html"]);
    }

    #[test]
    fn test_unpack_skips_up_to_date_directory() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = root.join("theme-3.0.war");
        write_war(&archive, &[("index.html", "original")]);

        let artifact = Artifact::new("g", "theme", "3.0", ArtifactType::War, archive.clone());
        let overlay = Overlay::for_artifact(&artifact, vec![], vec![]);
        let work = root.join("work");

        let unpacked = overlay.unpack(&DefaultArchiverManager, &work).unwrap();
        fs::write(unpacked.join("index.html"), "edited").unwrap();

        File::options()
            .write(true)
            .open(&archive)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();
        overlay.unpack(&DefaultArchiverManager, &work).unwrap();
        assert_eq!(
            fs::read_to_string(unpacked.join("index.html")).unwrap(),
            "edited"
        );

        File::options()
            .write(true)
            .open(&archive)
            .unwrap()
            .set_modified(SystemTime::now() + Duration::from_secs(3600))
            .unwrap();
        overlay.unpack(&DefaultArchiverManager, &work).unwrap();
        assert_eq!(
            fs::read_to_string(unpacked.join("index.html")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_unpack_corrupt_archive() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = root.join("broken-1.0.war");
        fs::write(&archive, b"garbage").unwrap();

        let artifact = Artifact::new("g", "broken", "1.0", ArtifactType::War, archive);
        let overlay = Overlay::for_artifact(&artifact, vec![], vec![]);

        assert!(matches!(
            overlay.unpack(&DefaultArchiverManager, &root.join("work")),
            Err(Error::Unpack { .. })
        ));
    }

    /// Write a stored WAR whose last entry fails its checksum on extraction.
    fn write_war_with_bad_checksum(path: &Utf8Path) {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        zip.start_file("a.txt", options).unwrap();
        zip.write_all(b"first entry").unwrap();
        zip.start_file("b.txt", options).unwrap();
        zip.write_all(b"second entry body").unwrap();
        zip.finish().unwrap();

        let mut bytes = fs::read(path).unwrap();
        let needle = b"second entry body";
        let at = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        bytes[at..at + needle.len()].copy_from_slice(b"SECOND ENTRY BODY");
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_failed_unpack_leaves_no_directory() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = root.join("theme-1.0.war");
        write_war_with_bad_checksum(&archive);

        let artifact = Artifact::new("g", "theme", "1.0", ArtifactType::War, archive);
        let overlay = Overlay::for_artifact(&artifact, vec![], vec![]);
        let work = root.join("work");

        for _ in 0..2 {
            assert!(matches!(
                overlay.unpack(&DefaultArchiverManager, &work),
                Err(Error::Unpack { .. })
            ));
            assert!(!work.join("theme-1.0").exists());
        }
    }

    #[test]
    fn test_unpack_unknown_extension() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let archive = root.join("theme-1.0.tgz");
        fs::write(&archive, b"whatever").unwrap();

        let artifact = Artifact::new("g", "theme", "1.0", ArtifactType::War, archive);
        let overlay = Overlay::for_artifact(&artifact, vec![], vec![]);

        assert!(matches!(
            overlay.unpack(&DefaultArchiverManager, &root.join("work")),
            Err(Error::NoSuchArchiver { .. })
        ));
    }
}
