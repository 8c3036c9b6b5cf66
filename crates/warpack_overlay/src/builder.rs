//! Webapp assembly: layering overlays into the exploded webapp directory.
//!
//! The [`WebappBuilder`] runs the merge once the current project's own files
//! are already in the webapp directory.
//!
//! # Build Algorithm
//!
//! 1. Take the effective overlay list from the [`OverlayManager`].
//! 2. Unpack every dependency overlay (skipped ones excepted) into the work
//!    directory, reusing unpack directories that are newer than their archive.
//! 3. Filter the current project's files through the current-project overlay's
//!    patterns. Files the patterns reject are deleted from the webapp; the rest
//!    form the current project's protected set.
//! 4. Walk the overlays in order with an accumulator of protected paths. The
//!    current project contributes its protected set. Every other overlay copies
//!    each of its files whose target path is not yet protected, then adds all
//!    of its (target-prefixed) files to the accumulator. The first overlay to
//!    provide a path wins (first-writer-wins).
//! 5. When a cache file is configured, persist the [`WebappStructure`].

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use warpack_project::WarProject;

use crate::archive::{ArchiverManager, DefaultArchiverManager};
use crate::error::{Error, Result};
use crate::manager::OverlayManager;
use crate::overlay::Overlay;
use crate::paths::PathSet;
use crate::sources::copy_file;
use crate::structure::{Registration, WebappStructure};

/// Everything the merge needs, passed explicitly to the builder.
pub struct PackagingContext {
    /// The exploded webapp being assembled.
    pub webapp_directory: Utf8PathBuf,
    /// Where dependency overlays are unpacked.
    pub work_directory: Utf8PathBuf,
    pub overlay_manager: OverlayManager,
    pub archiver_manager: Box<dyn ArchiverManager>,
    /// Webapp structure cache; `None` disables it.
    pub cache_file: Option<Utf8PathBuf>,
}

impl PackagingContext {
    pub fn new(
        webapp_directory: Utf8PathBuf,
        work_directory: Utf8PathBuf,
        overlay_manager: OverlayManager,
    ) -> Self {
        Self {
            webapp_directory,
            work_directory,
            overlay_manager,
            archiver_manager: Box::new(DefaultArchiverManager),
            cache_file: None,
        }
    }

    /// Context for a loaded project, using its directories and cache setting.
    pub fn from_project(project: &WarProject) -> Result<Self> {
        let mut context = Self::new(
            project.webapp_directory(),
            project.directories.work.clone(),
            OverlayManager::from_project(project)?,
        );
        if project.use_cache {
            context.cache_file = Some(project.cache_file());
        }
        Ok(context)
    }

    pub fn with_archiver_manager(mut self, manager: Box<dyn ArchiverManager>) -> Self {
        self.archiver_manager = manager;
        self
    }

    pub fn with_cache_file(mut self, cache_file: Option<Utf8PathBuf>) -> Self {
        self.cache_file = cache_file;
        self
    }
}

/// Webapp paths already claimed by an earlier overlay.
///
/// Threaded by value through [`WebappBuilder::apply_overlay`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedFiles(PathSet);

impl ProtectedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(path)
    }

    pub fn extend(&mut self, paths: &PathSet) {
        self.0.extend(paths);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> PathSet {
        self.0
    }
}

impl From<PathSet> for ProtectedFiles {
    fn from(paths: PathSet) -> Self {
        Self(paths)
    }
}

/// Progress information emitted during webapp assembly.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebappProgress {
    pub stage: WebappStage,
    /// Id of the overlay being processed, when the stage has one.
    pub current_overlay: Option<String>,
    /// 1-based index within the stage.
    pub current: u32,
    pub total: u32,
}

/// Stages of the assembly, emitted in order:
/// `Unpacking` (repeated) -> `Protecting` -> `ApplyingOverlay` (repeated) -> `Complete`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WebappStage {
    Unpacking,
    Protecting,
    ApplyingOverlay,
    Complete,
}

/// Summary returned after a build completes.
#[derive(Debug)]
pub struct WebappBuildResult {
    pub webapp_directory: Utf8PathBuf,
    /// Ids of the overlays that took part, in order. Skipped overlays are absent.
    pub overlays_applied: Vec<String>,
    /// Files copied from dependency overlays.
    pub files_copied: usize,
    /// Dependency files not copied because an earlier overlay owns the path.
    pub files_shadowed: usize,
    /// Current-project files removed by the current-project overlay's patterns.
    pub files_deleted: PathSet,
    /// Every path claimed by an overlay.
    pub protected: PathSet,
    pub build_time: Duration,
}

/// Counts for a single overlay application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayOutcome {
    pub copied: usize,
    pub shadowed: usize,
}

type ProgressCallback = Arc<dyn Fn(WebappProgress) + Send + Sync>;

/// Runs the overlay merge for one [`PackagingContext`].
pub struct WebappBuilder {
    context: PackagingContext,
    progress_callback: Option<ProgressCallback>,
}

impl WebappBuilder {
    pub fn new(context: PackagingContext) -> Self {
        Self {
            context,
            progress_callback: None,
        }
    }

    /// Register a progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(WebappProgress) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    pub fn context(&self) -> &PackagingContext {
        &self.context
    }

    /// Merge the overlays into the webapp directory.
    ///
    /// `current_project_files` are the paths the current project already wrote
    /// to the webapp directory. Any failure aborts the build; files written or
    /// deleted before the failure stay as they are.
    pub fn build(&self, current_project_files: &PathSet) -> Result<WebappBuildResult> {
        let start_time = std::time::Instant::now();
        let context = &self.context;
        let overlays = context.overlay_manager.overlays();

        tracing::info!("Assembling webapp in {}", context.webapp_directory);
        tracing::info!("Overlays: {}", overlays.len());
        fs::create_dir_all(context.webapp_directory.as_std_path())?;

        let previous = match &context.cache_file {
            Some(cache_file) => WebappStructure::load(cache_file)?,
            None => None,
        };
        let mut structure = WebappStructure::with_cache(previous);
        structure.register_owners(context.overlay_manager.overlay_ids());

        // Stage 2: unpack
        let to_unpack: Vec<&Overlay> = overlays
            .iter()
            .filter(|o| !o.is_current_project() && !o.is_skipped())
            .collect();
        let total = to_unpack.len() as u32;
        for (idx, overlay) in to_unpack.into_iter().enumerate() {
            self.emit_progress(WebappProgress {
                stage: WebappStage::Unpacking,
                current_overlay: Some(overlay.id()),
                current: idx as u32 + 1,
                total,
            });
            overlay.unpack(context.archiver_manager.as_ref(), &context.work_directory)?;
        }

        // Stage 3: protect current project files
        self.emit_progress(WebappProgress {
            stage: WebappStage::Protecting,
            current_overlay: None,
            current: 0,
            total: 0,
        });
        let current_overlay = overlays
            .iter()
            .find(|o| o.is_current_project())
            .ok_or_else(|| {
                Error::InvalidOverlay("overlay list has no current-project overlay".to_string())
            })?;
        let (project_files, files_deleted) = protect_current_project(
            &context.webapp_directory,
            current_overlay,
            current_project_files,
        )?;

        // Stage 4: layered copy
        let mut protected = ProtectedFiles::new();
        let mut overlays_applied = Vec::new();
        let mut files_copied = 0;
        let mut files_shadowed = 0;
        let total = overlays.len() as u32;
        for (idx, overlay) in overlays.iter().enumerate() {
            if overlay.is_skipped() && !overlay.is_current_project() {
                tracing::info!("Skipping overlay [{}]", overlay.id());
                continue;
            }

            self.emit_progress(WebappProgress {
                stage: WebappStage::ApplyingOverlay,
                current_overlay: Some(overlay.id()),
                current: idx as u32 + 1,
                total,
            });

            let (next, outcome) =
                self.apply_overlay(protected, overlay, &project_files, &mut structure)?;
            protected = next;
            files_copied += outcome.copied;
            files_shadowed += outcome.shadowed;
            overlays_applied.push(overlay.id());
        }

        if let Some(cache_file) = &context.cache_file {
            structure.save(cache_file)?;
            tracing::debug!("Saved webapp structure to {}", cache_file);
        }

        self.emit_progress(WebappProgress {
            stage: WebappStage::Complete,
            current_overlay: None,
            current: total,
            total,
        });

        let build_time = start_time.elapsed();
        tracing::info!(
            "Webapp assembled in {:?}: {} copied, {} shadowed, {} deleted",
            build_time,
            files_copied,
            files_shadowed,
            files_deleted.len()
        );

        Ok(WebappBuildResult {
            webapp_directory: context.webapp_directory.clone(),
            overlays_applied,
            files_copied,
            files_shadowed,
            files_deleted,
            protected: protected.into_inner(),
            build_time,
        })
    }

    /// Apply one overlay on top of the already protected paths.
    ///
    /// Takes the accumulator by value and returns the extended one.
    pub fn apply_overlay(
        &self,
        mut protected: ProtectedFiles,
        overlay: &Overlay,
        project_files: &ProtectedFiles,
        structure: &mut WebappStructure,
    ) -> Result<(ProtectedFiles, OverlayOutcome)> {
        let id = overlay.id();
        let mut outcome = OverlayOutcome::default();

        if overlay.is_current_project() {
            for path in project_files.0.iter() {
                structure.register_file(&id, path);
            }
            protected.extend(&project_files.0);
            tracing::debug!(
                "Overlay [{}]: {} current project files protected",
                id,
                project_files.len()
            );
            return Ok((protected, outcome));
        }

        let context = &self.context;
        let source_dir = overlay.unpack_directory(&context.work_directory)?;
        let files = overlay.files_in_overlay(&context.work_directory)?;
        let prefix = overlay.target_path();
        tracing::info!("Applying overlay [{}] ({} files)", id, files.len());

        for path in files.iter() {
            let target = format!("{prefix}{path}");
            if protected.contains(&target) {
                tracing::debug!(
                    " - {} wasn't copied because it has already been packaged for overlay [{}]",
                    target,
                    structure.owner(&target).unwrap_or("unknown")
                );
                outcome.shadowed += 1;
                continue;
            }

            match structure.register_file(&id, &target) {
                Registration::Superseded { previous } => tracing::info!(
                    "File {} belonged to overlay [{}] and is now provided by [{}]",
                    target,
                    previous,
                    id
                ),
                Registration::SupersededUnknownOwner { previous } => tracing::warn!(
                    "File {} belonged to overlay [{}] which is no longer part of the build",
                    target,
                    previous
                ),
                _ => {}
            }

            copy_file(
                &source_dir.join(path),
                &context.webapp_directory.join(&target),
            )?;
            outcome.copied += 1;
        }

        let mut claimed = files;
        claimed.add_prefix(&prefix);
        protected.extend(&claimed);
        Ok((protected, outcome))
    }

    fn emit_progress(&self, progress: WebappProgress) {
        if let Some(callback) = &self.progress_callback {
            callback(progress);
        }
    }
}

/// Remove current-project files the current-project overlay excludes.
///
/// Scans `webapp_dir` with the overlay's patterns. Files in
/// `current_project_files` that the scan does not select are deleted. Returns
/// the surviving files as the initial protected set, and the deleted paths.
pub fn protect_current_project(
    webapp_dir: &Utf8Path,
    overlay: &Overlay,
    current_project_files: &PathSet,
) -> Result<(ProtectedFiles, PathSet)> {
    let selected = overlay.files_in_overlay(webapp_dir)?;
    let mut kept = PathSet::new();
    let mut deleted = PathSet::new();

    for path in current_project_files.iter() {
        if selected.contains(path) {
            kept.add(path);
            continue;
        }

        let file = webapp_dir.join(path);
        if file.is_file() {
            fs::remove_file(file.as_std_path())?;
            tracing::debug!(" - {} excluded by overlay [{}], deleted", path, overlay.id());
        }
        deleted.add(path);
    }

    Ok((ProtectedFiles::from(kept), deleted))
}
