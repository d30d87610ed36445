// Subcommand runners.
//
// Build and update accumulate the whole pass in memory and save once at the
// end. An interrupted or failed pass returns before `save`, so the store file
// on disk is whatever the last completed pass left there.
//
// Every runner goes through the caller's ContainerSlot: a store already loaded
// for the configured path is reused, and a finished pass leaves its container
// there for whatever runs next.

use std::future::Future;

use anyhow::{bail, Context};
use tracing::{info, warn};

use dugout_core::model::DataStore;
use dugout_core::query::QuerySession;
use dugout_core::{ContainerSlot, DataStoreContainer, SaveOutcome, StoreError};
use dugout_scrape::{PageSource, PassReport, Pipeline};

use crate::cli::Command;
use crate::config::Config;
use crate::report;

#[derive(Debug)]
pub enum PassOutcome {
    Completed {
        report: PassReport,
        saved: SaveOutcome,
    },
    /// Shutdown fired before the pass finished. Nothing was written.
    Interrupted,
}

/// Scrape the configured catalog into a fresh store and save it.
pub async fn build(
    config: &Config,
    slot: &mut ContainerSlot,
    source: &dyn PageSource,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<PassOutcome> {
    let catalog = config.catalog();
    info!(leagues = catalog.len(), "starting build pass");
    let pipeline = Pipeline::new(source, config.pass_options());

    let (store, report) = tokio::select! {
        biased;
        _ = shutdown => {
            warn!("build interrupted, store left untouched");
            return Ok(PassOutcome::Interrupted);
        }
        result = pipeline.build(&catalog) => result.context("build pass failed")?,
    };

    let saved = persist_build(config, slot, store)?;
    Ok(PassOutcome::Completed { report, saved })
}

/// Refresh the stored season and save it over the old file.
pub async fn update(
    config: &Config,
    slot: &mut ContainerSlot,
    source: &dyn PageSource,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<PassOutcome> {
    let container = open_store(config, slot)?;
    info!(
        leagues = container.store().league_schedules.len(),
        "starting update pass"
    );
    let pipeline = Pipeline::new(source, config.pass_options());

    let (store, report) = tokio::select! {
        biased;
        _ = shutdown => {
            warn!("update interrupted, store left untouched");
            return Ok(PassOutcome::Interrupted);
        }
        result = pipeline.update(container.store()) => result.context("update pass failed")?,
    };

    container.replace_store(store);
    let saved = container
        .save(None, true, &config.store.backup_dir)
        .context("failed to save updated store")?;
    Ok(PassOutcome::Completed { report, saved })
}

/// The container for the configured store file, loaded on first use.
pub fn open_store<'s>(
    config: &Config,
    slot: &'s mut ContainerSlot,
) -> anyhow::Result<&'s mut DataStoreContainer> {
    let path = &config.store.path;
    match slot.instance(path) {
        Ok(container) => Ok(container),
        Err(StoreError::NotFound { .. }) => {
            bail!("no store at {}; run `dugout build` first", path.display())
        }
        Err(e) => Err(e).with_context(|| format!("failed to open store {}", path.display())),
    }
}

/// Run a read-only subcommand and render its table.
pub fn query(
    config: &Config,
    slot: &mut ContainerSlot,
    command: &Command,
) -> anyhow::Result<String> {
    let container = open_store(config, slot)?;
    let session = QuerySession::new(container.store());

    let text = match command {
        Command::Counts => report::counts(container.counts()),
        Command::Players { scope, team } => {
            report::players(&session.player_totals(&scope.filter(), team.as_deref()))
        }
        Command::Standings { scope } => report::standings(&session.standings(&scope.filter())),
        Command::Rank {
            scope,
            stat,
            weight,
            min_pa,
        } => report::ranking(&session.rank(
            &scope.filter(),
            *stat,
            weight.unwrap_or(config.stats.weight),
            min_pa.unwrap_or(config.stats.min_plate_appearances),
        )),
        Command::Log { scope, player } => {
            report::game_log(player, &session.player_game_log(&scope.filter(), player))
        }
        Command::Build | Command::Update => bail!("{command:?} is a pass, not a query"),
    };
    Ok(text)
}

/// A rebuild replaces any existing store, which is backed up first. An
/// unreadable existing file is never overwritten.
fn persist_build(
    config: &Config,
    slot: &mut ContainerSlot,
    store: DataStore,
) -> anyhow::Result<SaveOutcome> {
    let path = &config.store.path;
    let backup_dir = &config.store.backup_dir;

    if path.exists() {
        let container = slot.instance(path).with_context(|| {
            format!(
                "existing store {} is unreadable; move it aside before rebuilding",
                path.display()
            )
        })?;
        container.replace_store(store);
        return container
            .save(None, true, backup_dir)
            .context("failed to save rebuilt store");
    }

    slot.install(DataStoreContainer::new(store))
        .save(Some(path), true, backup_dir)
        .context("failed to save new store")
}
