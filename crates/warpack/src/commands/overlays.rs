use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use warpack_overlay::{Overlay, OverlayManager};

use crate::errors::CliError;
use crate::println_pad;
use crate::utils::{load_project, resolve_config_path};

pub struct ListOverlaysArgs {
    pub config_path: Option<String>,
    pub json: bool,
}

pub fn list_overlays(args: ListOverlaysArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config_path)?;
    let project = load_project(&config_path)?;
    let manager = OverlayManager::from_project(&project).map_err(CliError::from)?;

    if args.json {
        let entries: Vec<_> = manager.overlays().iter().map(overlay_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).into_diagnostic()?
        );
        return Ok(());
    }

    println!(
        "{} {}",
        "🧱 Overlays for".bright_blue().bold(),
        project.final_name().bright_cyan().bold()
    );
    for (idx, overlay) in manager.overlays().iter().enumerate() {
        let source = match overlay.artifact() {
            Some(artifact) => artifact.file.as_str().to_string(),
            None => "current project".to_string(),
        };
        let skipped = if overlay.is_skipped() {
            " (skipped)".bright_red().to_string()
        } else {
            String::new()
        };

        println_pad!(
            "{} {}{} {}",
            format!("{}.", idx + 1).dimmed(),
            overlay.id().bright_cyan().bold(),
            skipped,
            format!("<- {source}").dimmed()
        );
        println_pad!(
            "   {} {}  {} {}",
            "includes".bright_green(),
            overlay.includes().join(", "),
            "excludes".bright_yellow(),
            overlay.excludes().join(", ")
        );
        let target_path = overlay.target_path();
        if !target_path.is_empty() {
            println_pad!("   {} {}", "target".bright_magenta(), target_path);
        }
    }

    Ok(())
}

fn overlay_json(overlay: &Overlay) -> serde_json::Value {
    json!({
        "id": overlay.id(),
        "currentProject": overlay.is_current_project(),
        "artifact": overlay.artifact().map(|a| a.id()),
        "file": overlay.artifact().map(|a| a.file.as_str().to_string()),
        "includes": overlay.includes(),
        "excludes": overlay.excludes(),
        "skip": overlay.is_skipped(),
        "targetPath": overlay.target_path(),
    })
}
