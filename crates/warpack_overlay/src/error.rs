//! Error types for overlay operations.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. External error types (`std::io::Error`, `serde_json::Error`,
//! zip and directory walking errors) are automatically converted via `From` impls.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving overlays or assembling a webapp.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (scanning, copying, deleting).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (webapp structure cache).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error from the `zip` crate while reading or writing an archive.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Directory traversal failed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The project definition is invalid.
    #[error(transparent)]
    Project(#[from] warpack_project::ProjectError),

    /// An include or exclude pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// An overlay is malformed (only one coordinate set, duplicated, unresolved).
    #[error("Invalid overlay: {0}")]
    InvalidOverlay(String),

    /// No dependency matches the overlay's coordinates.
    #[error("Overlay [{overlay}] does not match any WAR dependency")]
    OverlayArtifactNotFound { overlay: String },

    /// Two options that cannot be combined were both configured.
    #[error("Mutually exclusive options: {0}")]
    MutuallyExclusiveOptions(String),

    /// No extractor is registered for the archive's extension.
    #[error("No archiver registered for extension '{extension}'")]
    NoSuchArchiver { extension: String },

    /// Extracting an overlay archive failed.
    #[error("Failed to unpack {archive} to {destination}: {source}")]
    Unpack {
        archive: Utf8PathBuf,
        destination: Utf8PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Copying a file into the webapp failed.
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The webapp has no `WEB-INF/web.xml` and packaging requires one.
    #[error("Webapp {0} has no WEB-INF/web.xml")]
    MissingWebXml(Utf8PathBuf),

    /// A path found on disk is not valid UTF-8.
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    /// Catch-all for errors from archivers and other sources.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
