//! Overlay resolution and merging for exploded web applications.
//!
//! A webapp is assembled from the current project's own files plus the
//! contents of its WAR dependencies ("overlays"). This crate provides:
//!
//! - **Overlay resolution**: bind configured overlays to dependencies and
//!   complete the list with one overlay per unreferenced WAR
//! - **First-writer-wins merging**: earlier overlays own a path, later ones
//!   never overwrite it
//! - **Pattern filtering**: Ant-style includes/excludes per overlay
//! - **Incremental unpacking**: dependency archives are only re-extracted
//!   when they change
//! - **Ownership cache**: optionally remember which overlay wrote each file
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use warpack_overlay::{copy_project_sources, PackagingContext, ProjectSources, WebappBuilder};
//! use warpack_project::WarProject;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut project = WarProject::load(Utf8Path::new("war.config.json"))?;
//! project.resolve_paths(Utf8Path::new("."));
//!
//! let context = PackagingContext::from_project(&project)?;
//! let project_files =
//!     copy_project_sources(&ProjectSources::from_project(&project), &context.webapp_directory)?;
//!
//! let result = WebappBuilder::new(context)
//!     .with_progress(|progress| {
//!         println!("Stage: {:?}, Progress: {}/{}",
//!             progress.stage, progress.current, progress.total);
//!     })
//!     .build(&project_files)?;
//! println!("Copied {} files, {} shadowed", result.files_copied, result.files_shadowed);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod builder;
pub mod error;
pub mod manager;
pub mod overlay;
pub mod paths;
pub mod scanner;
pub mod sources;
pub mod structure;

// Re-export main types
pub use archive::{
    ArchiverManager, DefaultArchiverManager, UnArchiver, WarArchiver, WarSummary, ZipUnArchiver,
};
pub use builder::{
    protect_current_project, OverlayOutcome, PackagingContext, ProtectedFiles, WebappBuildResult,
    WebappBuilder, WebappProgress, WebappStage,
};
pub use error::{Error, Result};
pub use manager::{LegacyPatterns, OverlayManager};
pub use overlay::{Overlay, CURRENT_PROJECT_ID};
pub use paths::{normalize, PathSet};
pub use scanner::DirectoryScanner;
pub use sources::{copy_project_sources, ProjectSources};
pub use structure::{Registration, WebappStructure};
