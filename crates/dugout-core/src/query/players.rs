// Player aggregation: season lines per player and per-game logs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{BattingLine, LeagueKey, PlayerStatsView, LEAGUE_TOTALS_NAME};
use crate::query::scope::{LeagueFilter, QuerySession};

/// Summed counting stats for one player (or the league totals row).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub games: u32,
    pub line: BattingLine,
}

impl PlayerSummary {
    pub fn view(&self) -> PlayerStatsView {
        PlayerStatsView::new(self.line)
    }

    pub fn is_totals(&self) -> bool {
        self.name == LEAGUE_TOTALS_NAME
    }
}

/// One game's line for a single player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerGameLine {
    pub date: NaiveDate,
    #[serde(skip)]
    pub league: LeagueKey,
    pub team: String,
    pub opponent: String,
    pub line: BattingLine,
}

impl<'a> QuerySession<'a> {
    /// Sum every player's lines over the played games in scope, optionally
    /// restricted to one team's box scores. Rows are sorted by name and the
    /// last row is always the synthesized league totals.
    pub fn player_totals(&self, filter: &LeagueFilter, team: Option<&str>) -> Vec<PlayerSummary> {
        let mut by_name: BTreeMap<&str, PlayerSummary> = BTreeMap::new();
        let mut totals = PlayerSummary {
            name: LEAGUE_TOTALS_NAME.to_string(),
            games: 0,
            line: BattingLine::default(),
        };

        for (_, game) in self.played_games(filter) {
            let Some(box_score) = game.box_score() else {
                continue;
            };
            let mut counted = false;
            for side in box_score {
                if team.is_some_and(|t| t != side.name) {
                    continue;
                }
                counted = true;
                for player in side.batters() {
                    let entry = by_name.entry(player.name.as_str()).or_insert_with(|| {
                        PlayerSummary {
                            name: player.name.clone(),
                            games: 0,
                            line: BattingLine::default(),
                        }
                    });
                    entry.games += 1;
                    entry.line += player.stats;
                    totals.line += player.stats;
                }
            }
            if counted {
                totals.games += 1;
            }
        }

        let mut rows: Vec<PlayerSummary> = by_name.into_values().collect();
        rows.push(totals);
        rows
    }

    /// Every played-game line for `name` in scope, in date order.
    pub fn player_game_log(&self, filter: &LeagueFilter, name: &str) -> Vec<PlayerGameLine> {
        let mut log = Vec::new();
        for (identity, game) in self.played_games(filter) {
            let Some([first, second]) = game.box_score() else {
                continue;
            };
            for (side, opponent) in [(first, second), (second, first)] {
                for player in side.batters().filter(|p| p.name == name) {
                    log.push(PlayerGameLine {
                        date: game.date,
                        league: identity.key(),
                        team: side.name.clone(),
                        opponent: opponent.name.clone(),
                        line: player.stats,
                    });
                }
            }
        }
        log.sort_by_key(|l| l.date);
        log
    }
}
