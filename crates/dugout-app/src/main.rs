// dugout entry point.
//
// 1. Parse the command line
// 2. Initialize tracing (append to logs/dugout.log, stdout is for reports)
// 3. Load config
// 4. Run a pass (raced against Ctrl+C) or a query

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use dugout_app::cli::{Cli, Command};
use dugout_app::commands::{self, PassOutcome};
use dugout_app::config;
use dugout_app::report;
use dugout_core::ContainerSlot;
use dugout_scrape::HttpPageSource;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_path = init_tracing()?;
    info!(command = ?cli.command, log = %log_path.display(), "dugout starting");

    let config =
        config::load_config(cli.config.as_deref()).context("failed to load configuration")?;
    info!(
        store = %config.store.path.display(),
        leagues = config.leagues.len(),
        "config loaded"
    );

    let mut slot = ContainerSlot::new();
    let result = match &cli.command {
        Command::Build | Command::Update => run_pass(&config, &mut slot, &cli.command).await,
        query => commands::query(&config, &mut slot, query).map(|text| println!("{text}")),
    };
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

async fn run_pass(
    config: &config::Config,
    slot: &mut ContainerSlot,
    command: &Command,
) -> anyhow::Result<()> {
    let source = HttpPageSource::new(config.fetch.timeout(), &config.fetch.user_agent)
        .context("failed to create HTTP client")?;

    let outcome = match command {
        Command::Build => commands::build(config, slot, &source, shutdown_signal()).await?,
        _ => commands::update(config, slot, &source, shutdown_signal()).await?,
    };

    match outcome {
        PassOutcome::Completed { report, saved } => {
            println!("{}", report::pass(&report, &saved));
        }
        PassOutcome::Interrupted => {
            eprintln!("Interrupted; the stored season was not modified.");
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

const LOG_FILE: &str = "dugout.log";
/// Overrides the default filter, e.g. `DUGOUT_LOG=dugout_scrape=debug`.
const LOG_ENV: &str = "DUGOUT_LOG";
const DEFAULT_FILTER: &str = "dugout_app=info,dugout_core=info,dugout_scrape=info,warn";

/// Append to `logs/dugout.log` so stdout carries only report output and
/// successive passes keep one history.
fn init_tracing() -> anyhow::Result<PathBuf> {
    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join(LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))?;

    Ok(log_path)
}
