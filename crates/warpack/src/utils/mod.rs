use crate::errors::CliError;
use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result};
use warpack_project::WarProject;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// The `--config-path` value, or the config file found in the working directory.
pub fn resolve_config_path(config_path: Option<String>) -> Result<Utf8PathBuf> {
    match config_path {
        Some(path) => Ok(Utf8PathBuf::from(path)),
        None => {
            let cwd = std::env::current_dir().into_diagnostic()?;
            let cwd = Utf8PathBuf::from_path_buf(cwd)
                .map_err(|p| CliError::NonUtf8Path(p.display().to_string()))?;
            find_config(&cwd)
        }
    }
}

fn find_config(project_dir: &Utf8Path) -> Result<Utf8PathBuf> {
    WarProject::find_config(project_dir)
        .ok_or_else(|| CliError::config_not_found(project_dir.to_path_buf()).into())
}

/// Load a project and make its paths absolute against the config file's directory.
pub fn load_project(config_path: &Utf8Path) -> Result<WarProject> {
    if !config_path.exists() {
        return Err(CliError::config_not_found(config_path.to_path_buf()).into());
    }

    let mut project = WarProject::load(config_path)
        .map_err(|e| CliError::config_parse_error(config_path.to_path_buf(), e))?;

    let base_dir = match config_path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    project.resolve_paths(&base_dir);
    tracing::debug!("Loaded project {} from {}", project.final_name(), config_path);

    Ok(project)
}
