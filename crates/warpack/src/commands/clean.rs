use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use crate::utils::{load_project, resolve_config_path};

#[derive(Debug)]
pub struct CleanArgs {
    pub config_path: Option<String>,
}

pub fn clean_project(args: CleanArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config_path)?;
    let project = load_project(&config_path)?;

    for dir in [project.webapp_directory(), project.directories.work.clone()] {
        if dir.is_dir() {
            std::fs::remove_dir_all(dir.as_std_path()).into_diagnostic()?;
            println!(
                "{} {}",
                "🧹 Removed".bright_yellow(),
                dir.as_str().bright_white()
            );
        } else {
            tracing::debug!("Nothing to remove at {}", dir);
        }
    }

    Ok(())
}
