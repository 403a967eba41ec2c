//! cloudsweep CLI
//!
//! Audits a batch of AWS accounts for resources left running.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// cloudsweep - find leftover resources across AWS accounts
#[derive(Parser)]
#[command(name = "cloudsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json); defaults to the config file's setting
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan every account in the credential file
    Scan(commands::scan::ScanArgs),

    /// List the resource checks
    Checks,

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let format = commands::resolve_format(cli.format.as_deref(), &config)?;

    match cli.command {
        Commands::Scan(args) => commands::scan::run(args, config, format),
        Commands::Checks => commands::checks::run(&config, format),
        Commands::Config => commands::config::run(&config),
    }
}
