mod config;
mod feed;
mod manager;
mod record;
mod report;
mod series;
mod snapshot;
mod store;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch today's statistics and persist the daily snapshot.
    Snapshot {
        /// Read feed documents from this directory instead of the network.
        #[arg(long)]
        offline_dir: Option<PathBuf>,
    },

    /// Print the report for today's snapshot.
    Report,

    /// List headline metrics of recent snapshots.
    History {
        #[arg(long, default_value_t = 14)]
        days: usize,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.data_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Snapshot { offline_dir } => mgr.take_snapshot(offline_dir)?,
        Command::Report => mgr.print_report()?,
        Command::History { days } => mgr.print_history(days)?,
    }

    Ok(())
}
