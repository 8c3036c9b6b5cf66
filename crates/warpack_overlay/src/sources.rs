//! Copies the current project's own files into the webapp directory.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use warpack_project::WarProject;

use crate::error::{Error, Result};
use crate::paths::PathSet;
use crate::scanner::DirectoryScanner;

const CLASSES_PREFIX: &str = "WEB-INF/classes/";

/// Where the current project's webapp sources and classes come from.
#[derive(Debug, Clone)]
pub struct ProjectSources {
    pub war_source_directory: Utf8PathBuf,
    pub war_source_includes: Vec<String>,
    pub war_source_excludes: Vec<String>,
    pub classes_directory: Utf8PathBuf,
}

impl ProjectSources {
    pub fn from_project(project: &WarProject) -> Self {
        Self {
            war_source_directory: project.directories.war_source.clone(),
            war_source_includes: project.war_source_includes.clone(),
            war_source_excludes: project.war_source_excludes.clone(),
            classes_directory: project.directories.classes.clone(),
        }
    }
}

/// Copy the project's webapp sources and compiled classes into `webapp_dir`.
///
/// Returns every path written, relative to `webapp_dir`. Missing source
/// directories contribute nothing.
pub fn copy_project_sources(sources: &ProjectSources, webapp_dir: &Utf8Path) -> Result<PathSet> {
    let mut written = PathSet::new();

    let war_files = DirectoryScanner::new(&sources.war_source_directory)
        .with_includes(&sources.war_source_includes)
        .with_excludes(&sources.war_source_excludes)
        .scan()?;
    for path in war_files.iter() {
        copy_file(
            &sources.war_source_directory.join(path),
            &webapp_dir.join(path),
        )?;
        written.add(path);
    }
    tracing::debug!(
        "Copied {} webapp source files from {}",
        war_files.len(),
        sources.war_source_directory
    );

    let classes = DirectoryScanner::new(&sources.classes_directory).scan()?;
    for path in classes.iter() {
        let target = format!("{CLASSES_PREFIX}{path}");
        copy_file(
            &sources.classes_directory.join(path),
            &webapp_dir.join(&target),
        )?;
        written.add(target);
    }
    tracing::debug!(
        "Copied {} class files from {}",
        classes.len(),
        sources.classes_directory
    );

    Ok(written)
}

/// Copy one file, creating the destination's parent directories.
pub(crate) fn copy_file(from: &Utf8Path, to: &Utf8Path) -> Result<()> {
    let copy = || -> std::io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent.as_std_path())?;
        }
        fs::copy(from.as_std_path(), to.as_std_path())?;
        Ok(())
    };
    copy().map_err(|source| Error::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
