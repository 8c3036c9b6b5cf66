use colored::Colorize;
use miette::Result;
use warpack_overlay::WarArchiver;

use crate::errors::CliError;
use crate::utils::{load_project, resolve_config_path};

use super::explode::assemble_webapp;

#[derive(Debug)]
pub struct PackageArgs {
    pub config_path: Option<String>,
    pub skip_web_xml_check: bool,
}

pub fn package_war(args: PackageArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config_path)?;
    let project = load_project(&config_path)?;

    let result = assemble_webapp(&project)?;

    let war_path = project.directories.output.join(project.war_file_name());
    println!(
        "{} {}",
        "📦 Packing webapp:".bright_blue().bold(),
        project.war_file_name().bright_cyan().bold()
    );

    let summary = WarArchiver::new()
        .with_includes(&project.packaging_includes)
        .with_excludes(&project.packaging_excludes)
        .with_fail_on_missing_web_xml(project.fail_on_missing_web_xml && !args.skip_web_xml_check)
        .create_archive(&result.webapp_directory, &war_path)
        .map_err(CliError::from)?;

    println!(
        "{} {}\n{} {}",
        "✅ WAR created successfully!".bright_green().bold(),
        format!("({} files)", summary.files).dimmed(),
        "📍 Path:".bright_green(),
        war_path.as_str().bright_white().bold()
    );

    Ok(())
}
