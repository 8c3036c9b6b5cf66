use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    clean_project, explode_webapp, list_overlays, package_war, CleanArgs, ExplodeArgs,
    ListOverlaysArgs, PackageArgs,
};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble the exploded webapp from the project and its overlays
    Explode {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// Assemble into this directory instead of the configured one
        #[arg(short, long)]
        webapp_dir: Option<String>,
    },
    /// Assemble the webapp and pack it into a .war file
    Package {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// Do not require WEB-INF/web.xml
        #[arg(long)]
        skip_web_xml_check: bool,
    },
    /// Show the effective overlay list in precedence order
    Overlays {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,

        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove the assembled webapp and the unpacked overlays
    Clean {
        /// The path to the project config file
        #[arg(short, long)]
        config_path: Option<String>,
    },
}

fn parse_args() -> Result<Args> {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).into_diagnostic()
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warpack=info,warpack_overlay=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let args = parse_args()?;

    match args.command {
        Commands::Explode {
            config_path,
            webapp_dir,
        } => explode_webapp(ExplodeArgs {
            config_path,
            webapp_dir,
        })
        .map(|_| ()),
        Commands::Package {
            config_path,
            skip_web_xml_check,
        } => package_war(PackageArgs {
            config_path,
            skip_web_xml_check,
        }),
        Commands::Overlays { config_path, json } => {
            list_overlays(ListOverlaysArgs { config_path, json })
        }
        Commands::Clean { config_path } => clean_project(CleanArgs { config_path }),
    }
}
