use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;
use warpack_overlay::{
    copy_project_sources, PackagingContext, ProjectSources, WebappBuildResult, WebappBuilder,
    WebappStage,
};
use warpack_project::WarProject;

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::{load_project, resolve_config_path};

#[derive(Debug)]
pub struct ExplodeArgs {
    pub config_path: Option<String>,
    pub webapp_dir: Option<String>,
}

pub fn explode_webapp(args: ExplodeArgs) -> Result<WebappBuildResult> {
    let config_path = resolve_config_path(args.config_path)?;
    let mut project = load_project(&config_path)?;
    if let Some(webapp_dir) = args.webapp_dir {
        project.directories.webapp = Some(Utf8PathBuf::from(webapp_dir));
    }

    let result = assemble_webapp(&project)?;
    print_summary(&result);
    Ok(result)
}

/// Copy the project's own files, then merge its overlays on top.
pub(crate) fn assemble_webapp(project: &WarProject) -> Result<WebappBuildResult> {
    println!(
        "{} {}",
        "🧩 Assembling webapp:".bright_blue().bold(),
        project.final_name().bright_cyan().bold()
    );

    let context = PackagingContext::from_project(project).map_err(CliError::from)?;
    let project_files =
        copy_project_sources(&ProjectSources::from_project(project), &context.webapp_directory)
            .map_err(CliError::from)?;

    let builder = WebappBuilder::new(context).with_progress(|progress| {
        if progress.stage == WebappStage::ApplyingOverlay {
            if let Some(id) = &progress.current_overlay {
                tracing::debug!("[{}/{}] {}", progress.current, progress.total, id);
            }
        }
    });

    let result = builder.build(&project_files).map_err(CliError::from)?;
    Ok(result)
}

fn print_summary(result: &WebappBuildResult) {
    println!(
        "{}\n{} {}",
        "✅ Webapp assembled successfully!".bright_green().bold(),
        "📍 Path:".bright_green(),
        result.webapp_directory.as_str().bright_white().bold()
    );
    println_pad!(
        "{} {}",
        "🧱 Overlays:".bright_magenta(),
        result.overlays_applied.join(" > ").bright_white()
    );
    println_pad!(
        "{} {}  {} {}  {} {}",
        "copied".bright_green(),
        result.files_copied,
        "shadowed".bright_yellow(),
        result.files_shadowed,
        "deleted".bright_red(),
        result.files_deleted.len()
    );
}
