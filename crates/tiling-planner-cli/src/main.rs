use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

/// Top-level CLI argument parser for the `tp` command
#[derive(Parser)]
#[command(
    name = "tp",
    about = "tiling-planner: lane partitions, sub-tiles and plan records for device kernels",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `tp` CLI
#[derive(Subcommand)]
enum Commands {
    /// Compute the tiling plan for one operator invocation
    Plan {
        /// Path to the platform profile YAML file
        #[arg(long)]
        platform: PathBuf,
        /// Path to the operator family YAML file
        #[arg(long)]
        family: PathBuf,
        /// Path to the plan request YAML file
        #[arg(long)]
        request: PathBuf,
        /// Output format: text (default), json, or hex
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Validate an operator family, optionally against a platform
    Validate {
        /// Path to the operator family YAML file
        family: PathBuf,
        /// Path to a platform profile YAML file to check the fit against
        #[arg(long)]
        platform: Option<PathBuf>,
    },
    /// List every kernel variant of an operator family with its key
    Catalog {
        /// Path to the operator family YAML file
        family: PathBuf,
    },
    /// Show the binary layout of a plan record
    Layout {
        /// Output format: text (default), json, or c
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Split a unit count across lanes
    Split {
        /// Number of work units
        total_units: i64,
        /// Number of lanes
        lanes: u32,
    },
}

/// Dispatch a parsed CLI subcommand to its handler
fn run_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Plan {
            platform,
            family,
            request,
            format,
        } => match commands::plan::OutputFormat::from_str(&format) {
            Ok(fmt) => commands::plan::run(&platform, &family, &request, fmt),
            Err(e) => Err(e.into()),
        },
        Commands::Validate { family, platform } => {
            commands::validate::run(&family, platform.as_deref())
        }
        Commands::Catalog { family } => commands::catalog::run(&family),
        Commands::Layout { format } => match commands::layout::LayoutFormat::from_str(&format) {
            Ok(fmt) => commands::layout::run(fmt),
            Err(e) => Err(e.into()),
        },
        Commands::Split { total_units, lanes } => commands::split::run(total_units, lanes),
    }
}

/// Entry point: parse CLI arguments and run the selected subcommand
fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run_command(cli.command) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
