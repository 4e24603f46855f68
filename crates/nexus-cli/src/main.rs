//! nexus - command-line entry point.

use std::process::ExitCode;

use clap::Parser;
use nexus_cli::{commands, Cli, Commands};
use nexus_core::{NexusConfig, NexusError};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(verbose: bool, config: Option<&NexusConfig>) {
    let default_level = if verbose {
        Level::DEBUG.to_string()
    } else {
        config
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|| Level::INFO.to_string())
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let ansi = config.map_or(true, |c| c.logging.ansi);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(ansi).with_target(false))
        .with(filter)
        .init();
}

fn report_error(error: &anyhow::Error) {
    eprintln!("Error: {:#}", error);
    if let Some(suggestion) = error
        .downcast_ref::<NexusError>()
        .and_then(NexusError::suggestion)
    {
        eprintln!("Hint: {}", suggestion);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = NexusConfig::load(cli.config.as_deref());
    init_tracing(cli.verbose, config.as_ref().ok());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            report_error(&e.into());
            return ExitCode::FAILURE;
        }
    };

    let outcome = match cli.command {
        Commands::Sync(args) => commands::sync::run(args, config).await,
        Commands::Context(args) => commands::context::run(args, config).await,
        Commands::Priorities(args) => commands::priorities::run(args, config).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
