use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;
use warpack_overlay::Error as OverlayError;
use warpack_project::ProjectError;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Configuration file not found")]
    #[diagnostic(
        code(config::not_found),
        help("Create a war.config.json or war.config.toml file in your project directory, or pass --config-path")
    )]
    ConfigNotFound { search_path: Utf8PathBuf },

    #[error("Configuration file error: {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check your war.config.json or war.config.toml file for syntax errors and unknown dependency types")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: ProjectError,
    },

    #[error("Path is not valid UTF-8: {0}")]
    #[diagnostic(code(fs::non_utf8_path))]
    NonUtf8Path(String),

    #[error("Invalid overlay configuration")]
    #[diagnostic(
        code(overlay::invalid),
        help("Every overlay needs both group_id and artifact_id, must match a declared dependency, and may appear only once")
    )]
    InvalidOverlay {
        #[source]
        source: OverlayError,
    },

    #[error("Conflicting overlay options")]
    #[diagnostic(
        code(overlay::mutually_exclusive),
        help("Remove dependent_war_includes/dependent_war_excludes and put the patterns on the overlays instead")
    )]
    MutuallyExclusiveOptions {
        #[source]
        source: OverlayError,
    },

    #[error("Webapp has no WEB-INF/web.xml: {path}")]
    #[diagnostic(
        code(package::missing_web_xml),
        help("Add src/main/webapp/WEB-INF/web.xml, set fail_on_missing_web_xml = false, or pass --skip-web-xml-check")
    )]
    MissingWebXml { path: Utf8PathBuf },

    #[error("Failed to unpack overlay archive")]
    #[diagnostic(
        code(overlay::unpack_failed),
        help("Check that the dependency file exists and is a valid archive")
    )]
    UnpackFailed {
        #[source]
        source: OverlayError,
    },

    #[error("Webapp assembly failed")]
    #[diagnostic(code(webapp::build_failed))]
    BuildFailed {
        #[source]
        source: OverlayError,
    },
}

impl CliError {
    pub fn config_not_found(search_path: Utf8PathBuf) -> Self {
        Self::ConfigNotFound { search_path }
    }

    pub fn config_parse_error(path: Utf8PathBuf, source: ProjectError) -> Self {
        Self::ConfigParseError { path, source }
    }
}

impl From<OverlayError> for CliError {
    fn from(error: OverlayError) -> Self {
        match error {
            OverlayError::MissingWebXml(path) => Self::MissingWebXml { path },
            source @ OverlayError::MutuallyExclusiveOptions(_) => {
                Self::MutuallyExclusiveOptions { source }
            }
            source @ (OverlayError::InvalidOverlay(_)
            | OverlayError::OverlayArtifactNotFound { .. }) => Self::InvalidOverlay { source },
            source @ (OverlayError::Unpack { .. } | OverlayError::NoSuchArchiver { .. }) => {
                Self::UnpackFailed { source }
            }
            source => Self::BuildFailed { source },
        }
    }
}
