//! Cascade CLI - rule-based build option resolution
//!
//! This CLI gives model developers a terminal interface to:
//! - Resolve application profiles into compiler defines or headers
//! - Validate the option catalog and shipped profiles
//! - List the option registry
//! - Explain why a flag ended up on or off

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod output;

use commands::{check, explain, options, resolve};
use config::CliConfig;
use error::CliResult;
use output::{print_error, OutputFormat};

/// Cascade CLI application
#[derive(Parser)]
#[command(name = "cascade")]
#[command(about = "Cascade - resolve build options from declared rules", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CASCADE_CONFIG", global = true)]
    config: Option<String>,

    /// Output format (table, json, yaml, defines, header, trace)
    #[arg(short, long, global = true)]
    output: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Resolve profiles into a full flag assignment
    Resolve(resolve::ResolveArgs),

    /// Validate the catalog and verify profiles resolve to a fixed point
    Check(check::CheckArgs),

    /// List registered options
    #[command(alias = "ls")]
    Options(options::OptionsArgs),

    /// Explain the value of one flag in a profile
    Explain(explain::ExplainArgs),

    /// Show configuration
    Config,
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let format = cli.output.or(config.default_format).unwrap_or_default();

    match cli.command {
        Commands::Resolve(args) => resolve::execute(args, &config, format).await,
        Commands::Check(args) => check::execute(args, &config),
        Commands::Options(args) => options::execute(args, &config, format),
        Commands::Explain(args) => explain::execute(args, &config, format),
        Commands::Config => {
            println!("Catalog: {}", config.catalog_path(None).display());
            println!("Profiles: {}", config.profile_dir().display());
            println!("Format: {:?}", format);
            println!("Bundles: {:?}", config.bundles);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
