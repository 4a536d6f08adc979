mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vexsync::config::VexsyncConfig;

#[derive(Parser)]
#[command(
    name = "vexsync",
    version,
    about = "Keep a derived vector index consistent with a canonical key-value store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a record to the canonical store (the index catches up via reconciliation)
    Put {
        key: String,
        value: String,
        /// Mark the record sensitive: it is never embedded into the index
        #[arg(long)]
        sensitive: bool,
    },
    /// Read a record from the canonical store
    Get { key: String },
    /// Tombstone a record (soft delete; the key is retained)
    Rm { key: String },
    /// Run one reconciliation cycle and print the report
    Cycle {
        /// Override the configured mode (off|propose|apply)
        #[arg(long)]
        mode: Option<String>,
        /// Override the configured ruleset (strict|lenient)
        #[arg(long)]
        ruleset: Option<String>,
    },
    /// Run the continuous heartbeat loop until interrupted
    Run,
    /// Show recent reconciliation audit events
    Log {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show store, index, and drift statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = VexsyncConfig::load()?;

    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Put {
            key,
            value,
            sensitive,
        } => cli::kv::put(&config, &key, &value, sensitive)?,
        Command::Get { key } => cli::kv::get(&config, &key)?,
        Command::Rm { key } => cli::kv::rm(&config, &key)?,
        Command::Cycle { mode, ruleset } => cli::cycle::cycle(&config, mode, ruleset)?,
        Command::Run => cli::run::run(&config).await?,
        Command::Log { limit } => cli::log::log(&config, limit)?,
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
