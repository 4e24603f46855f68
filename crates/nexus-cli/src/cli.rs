//! Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use nexus_core::Period;

#[derive(Debug, Parser)]
#[command(
    name = "nexus",
    author,
    version,
    about = "Keep Notion in step with your calendar and conversations",
    long_about = "Syncs Google Calendar events and Limitless meeting notes into Notion, \
                  and turns recent conversations into prioritized to-dos.\n\nConfiguration \
                  is read from --config, config/config.toml or the user config directory, \
                  then overridden by environment variables (a .env file is honoured)."
)]
pub struct Cli {
    /// Configuration file (.toml, .json or .yaml)
    #[arg(short, long, global = true, env = "NEXUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Sync calendar events and meeting notes into Notion")]
    Sync(SyncArgs),

    #[command(about = "Show upcoming events, open tasks and recent memories")]
    Context(ContextArgs),

    #[command(about = "Detect commitments, requests and deadlines in recent conversations")]
    Priorities(PrioritiesArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Minutes between cycles (overrides sync.interval_minutes)
    #[arg(long, value_name = "MINUTES", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ContextArgs {
    /// How many days ahead to look
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,
}

#[derive(Debug, Args)]
pub struct PrioritiesArgs {
    /// Period to analyze: today or week
    #[arg(default_value = "today", value_parser = parse_period)]
    pub period: Period,

    /// Detect and report without creating to-dos
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_period(value: &str) -> Result<Period, String> {
    value
        .parse()
        .map_err(|_| format!("unknown period '{}', expected 'today' or 'week'", value))
}
