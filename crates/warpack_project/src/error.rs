use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a project definition.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration file has neither a `.json` nor a `.toml` extension.
    #[error("Unsupported config file extension: {0}")]
    UnsupportedConfigFormat(Utf8PathBuf),

    /// A dependency or overlay names a type string with no known mapping.
    #[error("Unknown artifact type '{type_name}' for {artifact}")]
    UnknownArtifactType { type_name: String, artifact: String },
}
