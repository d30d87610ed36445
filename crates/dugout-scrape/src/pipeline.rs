// Build and update passes.
//
// A pass never touches the caller's store. It works on its own copy and hands
// the finished DataStore back, so an aborted or interrupted pass leaves the
// persisted file exactly as it was. Result pages are fetched with bounded
// parallelism; their outcomes are applied to the copy one at a time.

use std::collections::HashSet;
use std::fmt;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, warn};

use dugout_core::model::{
    DataStore, FinalScore, GameResult, LeagueSchedule, ResultState, ScheduledGame,
};

use crate::catalog::LeagueCatalog;
use crate::error::ScrapeError;
use crate::result::GameResultBuilder;
use crate::retry::RetryPolicy;
use crate::schedule::ScheduleBuilder;
use crate::source::PageSource;

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOptions {
    pub retry: RetryPolicy,
    /// Result pages fetched at once.
    pub concurrency: usize,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            concurrency: 4,
        }
    }
}

/// What a pass did, for logging and the CLI summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub leagues_built: usize,
    pub leagues_refreshed: usize,
    pub leagues_skipped: usize,
    pub games_added: usize,
    pub games_fetched: usize,
    pub games_changed: usize,
    pub games_unchanged: usize,
    pub games_unavailable: usize,
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "leagues: {} built, {} refreshed, {} skipped; games: {} added, {} fetched \
             ({} changed, {} unchanged), {} unavailable",
            self.leagues_built,
            self.leagues_refreshed,
            self.leagues_skipped,
            self.games_added,
            self.games_fetched,
            self.games_changed,
            self.games_unchanged,
            self.games_unavailable,
        )
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline<'a> {
    source: &'a dyn PageSource,
    options: PassOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn PageSource, options: PassOptions) -> Self {
        Self { source, options }
    }

    /// Discover the whole season: every catalog league's schedule plus every
    /// linked result page.
    pub async fn build(
        &self,
        catalog: &LeagueCatalog,
    ) -> Result<(DataStore, PassReport), ScrapeError> {
        let schedules = ScheduleBuilder::new(self.source, self.options.retry);
        let mut store = DataStore::new(Vec::new());
        let mut report = PassReport::default();

        for entry in catalog.entries() {
            let mut schedule = match schedules.build(&entry.url).await {
                Ok(Some(schedule)) => schedule,
                Ok(None) => {
                    info!(label = %entry.label, "no schedule posted, skipping league");
                    report.leagues_skipped += 1;
                    continue;
                }
                Err(e) if e.is_skippable() => {
                    warn!(label = %entry.label, error = %e, "schedule unavailable, skipping league");
                    report.leagues_skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(label = %entry.label, error = %e, "schedule page could not be parsed");
                    return Err(e);
                }
            };

            if store.league(&schedule.identity.key()).is_some() {
                warn!(label = %entry.label, league = %schedule.identity, "league listed twice, skipping");
                report.leagues_skipped += 1;
                continue;
            }

            report.games_added += schedule.scheduled_games.len();
            self.refresh_games(&mut schedule, |g| g.result_page.is_some(), &mut report)
                .await?;
            store.league_schedules.push(schedule);
            report.leagues_built += 1;
        }

        info!(%report, "build pass complete");
        Ok((store, report))
    }

    /// Refresh an existing store: re-read each league's schedule, merge newly
    /// posted scores and games, and fetch results only for games that still
    /// need them.
    pub async fn update(
        &self,
        current: &DataStore,
    ) -> Result<(DataStore, PassReport), ScrapeError> {
        let schedules = ScheduleBuilder::new(self.source, self.options.retry);
        let mut store = current.clone();
        let mut report = PassReport::default();

        for schedule in store.league_schedules.iter_mut() {
            let url = schedule.identity.source.clone();
            match schedules.build(&url).await {
                Ok(Some(fresh)) => {
                    if !fresh.identity.same_league(&schedule.identity) {
                        error!(
                            url = %url,
                            stored = %schedule.identity,
                            scraped = %fresh.identity,
                            "schedule page now describes a different league"
                        );
                        return Err(ScrapeError::page_format(&url, "league token (identity changed)"));
                    }
                    report.games_added += merge_schedule(schedule, fresh);
                }
                Ok(None) => {
                    report.leagues_skipped += 1;
                    continue;
                }
                Err(e) if e.is_skippable() => {
                    warn!(league = %schedule.identity, error = %e, "schedule unavailable, keeping stored games");
                    report.leagues_skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(league = %schedule.identity, error = %e, "schedule page could not be parsed");
                    return Err(e);
                }
            }

            self.refresh_games(schedule, ScheduledGame::needs_refresh, &mut report)
                .await?;
            report.leagues_refreshed += 1;
        }

        info!(%report, "update pass complete");
        Ok((store, report))
    }

    /// Fetch results for every game in `schedule` selected by `wanted`.
    async fn refresh_games(
        &self,
        schedule: &mut LeagueSchedule,
        wanted: impl Fn(&ScheduledGame) -> bool,
        report: &mut PassReport,
    ) -> Result<(), ScrapeError> {
        let targets: Vec<(usize, ScheduledGame)> = schedule
            .scheduled_games
            .iter()
            .enumerate()
            .filter(|(_, g)| wanted(g))
            .map(|(i, g)| (i, g.clone()))
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let identity = schedule.identity.clone();
        let builder = GameResultBuilder::new(self.source, self.options.retry);
        let (identity, builder) = (&identity, &builder);

        let mut outcomes: Vec<(usize, Result<GameResult, ScrapeError>)> = stream::iter(targets)
            .map(|(idx, game)| async move {
                let outcome = match game.result {
                    ResultState::Fetched(_) => builder.update(identity, &game).await,
                    _ => builder.construct(identity, &game).await,
                };
                (idx, outcome)
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;
        outcomes.sort_by_key(|(idx, _)| *idx);

        for (idx, outcome) in outcomes {
            let game = &mut schedule.scheduled_games[idx];
            match outcome {
                Ok(result) => {
                    report.games_fetched += 1;
                    if apply_result(game, result) {
                        report.games_changed += 1;
                    } else {
                        report.games_unchanged += 1;
                    }
                }
                Err(e) if e.is_skippable() => {
                    warn!(
                        league = %identity,
                        date = %game.date,
                        visitor = %game.visitor,
                        home = %game.home,
                        error = %e,
                        "result unavailable"
                    );
                    report.games_unavailable += 1;
                    // A result already on file is kept.
                    if !matches!(game.result, ResultState::Fetched(_)) {
                        game.result = ResultState::Unavailable {
                            reason: e.to_string(),
                        };
                    }
                }
                Err(e) => {
                    error!(league = %identity, date = %game.date, error = %e, "result page could not be parsed");
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Store a fetched result on its game. Box-score runs become the final
/// score. Returns whether anything changed.
fn apply_result(game: &mut ScheduledGame, result: GameResult) -> bool {
    let before = game.clone();
    if let Some([visitor, home]) = &result.teams {
        game.scores = Some(FinalScore {
            visitor: visitor.runs_scored,
            home: home.runs_scored,
        });
    }
    game.result = ResultState::Fetched(result);
    *game != before
}

/// Fold a freshly scraped schedule into the stored one. Existing games pick
/// up newly posted scores and links; unseen rows are appended. Each stored
/// game absorbs at most one fresh row. Returns the number of games added.
pub fn merge_schedule(stored: &mut LeagueSchedule, fresh: LeagueSchedule) -> usize {
    let mut added = 0;
    let mut claimed = HashSet::new();
    for stub in fresh.scheduled_games {
        match stored.find_matching(&stub, &claimed) {
            Some(idx) => {
                claimed.insert(idx);
                let game = &mut stored.scheduled_games[idx];
                if !game.is_played() && stub.scores.is_some() {
                    game.scores = stub.scores;
                }
                if game.result_page.is_none() {
                    game.result_page = stub.result_page;
                }
            }
            None => {
                claimed.insert(stored.scheduled_games.len());
                stored.scheduled_games.push(stub);
                added += 1;
            }
        }
    }
    added
}
