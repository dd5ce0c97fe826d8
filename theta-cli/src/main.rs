//! Theta save-file tool
//!
//! Usage:
//!   theta smoke --count 100
//!   theta list --limit 10
//!   theta inspect 1760000000
//!
//! The data directory comes from `--data-dir`, then `--config`, then
//! `THETA_DATA_DIR`, then the platform data directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use theta_cli::demo::demo_catalog;
use theta_cli::report::render_saves;
use theta_registry::HandleRegistry;
use theta_storage::{SaveStore, StoreConfig, default_data_dir};
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "theta")]
#[command(about = "Save, load and inspect Theta entity graphs")]
struct Args {
    /// Directory holding save files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON store configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a demo world, save it, reload it and verify every reference
    Smoke {
        /// Number of player/monster pairs
        #[arg(long, default_value = "3")]
        count: usize,
    },
    /// Load a save into a fresh registry and summarize it
    Inspect {
        /// Save identifier, with or without the .ths extension
        id: String,
    },
    /// List recent saves, newest first
    List {
        /// Maximum number of saves (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = load_config(&args)?;
    debug!("Store config: {:?}", config);
    let catalog = demo_catalog().context("failed to build type catalog")?;
    let store = SaveStore::open(config, catalog, HandleRegistry::new())
        .context("failed to open save directory")?;
    info!("Data directory: {}", store.data_dir().display());

    match args.command {
        Command::Smoke { count } => {
            let report = theta_cli::smoke(&store, count).await?;
            emit(args.json, &report)?;
        }
        Command::Inspect { id } => {
            let report = theta_cli::inspect(&store, &id)?;
            emit(args.json, &report)?;
        }
        Command::List { limit } => {
            let saves = theta_cli::list(&store, limit)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&saves)?);
            } else {
                println!("{}", render_saves(&saves));
            }
        }
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => StoreConfig::new(default_data_dir()),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn emit<T: Serialize + Display>(json: bool, report: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
