//! # formflow CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formflow_cli::config::CliConfig;
use formflow_cli::fill::{run_fill, FillArgs};
use formflow_cli::inspect::{run_check, run_defaults, run_pages, CheckArgs, DefaultsArgs, PagesArgs};
use formflow_cli::validate::{run_validate, ValidateArgs};
use formflow_cli::EXIT_FAILURE;

/// formflow: dynamic form schemas from the command line.
///
/// Validates form-schema documents, shows the default record and page
/// partition they compile to, checks data records against them, and fills
/// and submits a form non-interactively.
#[derive(Parser, Debug)]
#[command(name = "formflow", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a form schema.
    Validate(ValidateArgs),

    /// Print the default record of a schema.
    Defaults(DefaultsArgs),

    /// Print how a schema splits into pages.
    Pages(PagesArgs),

    /// Validate a data record against a schema.
    Check(CheckArgs),

    /// Fill a form page by page from an answers file and submit it.
    Fill(FillArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match CliConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &config),
        Commands::Defaults(args) => run_defaults(&args, &config),
        Commands::Pages(args) => run_pages(&args, &config),
        Commands::Check(args) => run_check(&args, &config),
        Commands::Fill(args) => run_fill(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
