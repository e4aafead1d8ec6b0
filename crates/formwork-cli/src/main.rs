//! # formwork CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use formwork_cli::check::{run_check, CheckArgs};
use formwork_cli::path::{run_path, PathArgs};
use formwork_cli::show::{run_show, ShowArgs};
use formwork_cli::validate::{run_validate, ValidateArgs};

/// formwork: structural schema registry and validator.
///
/// Loads schema declarations from YAML/JSON files, resolves forward and
/// circular references, and validates data documents and field paths.
#[derive(Parser, Debug)]
#[command(name = "formwork", version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register and resolve declarations, then list the schemas.
    Check(CheckArgs),

    /// Print schema snapshots as JSON.
    Show(ShowArgs),

    /// Validate a data document against a schema.
    Validate(ValidateArgs),

    /// Check a dotted field path against a schema.
    Path(PathArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "formwork CLI starting");

    let config = cli.config.as_deref();
    let result = match &cli.command {
        Commands::Check(args) => run_check(args, config),
        Commands::Show(args) => run_show(args, config),
        Commands::Validate(args) => run_validate(args, config),
        Commands::Path(args) => run_path(args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
