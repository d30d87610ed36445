// Team standings computed from final scores.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{GameClass, Outcome};
use crate::query::scope::{LeagueFilter, QuerySession};
use crate::stats::math::rate;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TeamStanding {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub runs_for: u32,
    pub runs_against: u32,
}

impl TeamStanding {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ties
    }

    pub fn run_differential(&self) -> i64 {
        self.runs_for as i64 - self.runs_against as i64
    }

    /// Ties count as half a win.
    pub fn win_pct(&self) -> f64 {
        rate(2 * self.wins + self.ties, 2 * self.games())
    }

    fn record(&mut self, scored: u32, against: u32) {
        self.runs_for += scored;
        self.runs_against += against;
        match Outcome::from_runs(scored, against) {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }
}

impl<'a> QuerySession<'a> {
    /// Standings over every played or forfeited game in scope, best record
    /// first (ties broken by run differential, then name).
    pub fn standings(&self, filter: &LeagueFilter) -> Vec<TeamStanding> {
        let mut teams: BTreeMap<&str, TeamStanding> = BTreeMap::new();

        for schedule in self.schedules(filter) {
            for game in &schedule.scheduled_games {
                if !matches!(game.classify(), GameClass::Played | GameClass::Forfeited) {
                    continue;
                }
                let Some(score) = game.scores else {
                    continue;
                };
                for (name, scored, against) in [
                    (game.visitor.as_str(), score.visitor, score.home),
                    (game.home.as_str(), score.home, score.visitor),
                ] {
                    teams
                        .entry(name)
                        .or_insert_with(|| TeamStanding {
                            name: name.to_string(),
                            ..TeamStanding::default()
                        })
                        .record(scored, against);
                }
            }
        }

        let mut rows: Vec<TeamStanding> = teams.into_values().collect();
        rows.sort_by(|a, b| {
            b.win_pct()
                .partial_cmp(&a.win_pct())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.run_differential().cmp(&a.run_differential()))
                .then_with(|| a.name.cmp(&b.name))
        });
        rows
    }
}
