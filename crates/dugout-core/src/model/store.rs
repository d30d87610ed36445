// DataStore: the persisted aggregate root.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::game::ScheduledGame;
use crate::model::league::{LeagueIdentity, LeagueKey};

/// One league's full season schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSchedule {
    pub identity: LeagueIdentity,
    pub scheduled_games: Vec<ScheduledGame>,
}

impl LeagueSchedule {
    pub fn new(identity: LeagueIdentity) -> Self {
        Self {
            identity,
            scheduled_games: Vec::new(),
        }
    }

    pub fn played_games(&self) -> impl Iterator<Item = &ScheduledGame> {
        self.scheduled_games.iter().filter(|g| g.is_played())
    }

    /// Locate a stored game matching a freshly scraped schedule row: by result
    /// page when both have one, else by date and teams. Indices in `claimed`
    /// are skipped, so the rows of a doubleheader pair off in page order.
    pub fn find_matching(&self, stub: &ScheduledGame, claimed: &HashSet<usize>) -> Option<usize> {
        self.scheduled_games
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed.contains(i))
            .find(|(_, g)| match (&g.result_page, &stub.result_page) {
                (Some(a), Some(b)) => a == b,
                _ => g.same_slot(stub),
            })
            .map(|(i, _)| i)
    }
}

/// Build timestamp plus every league schedule of the season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    pub build_date: DateTime<Utc>,
    pub league_schedules: Vec<LeagueSchedule>,
}

impl DataStore {
    pub fn new(league_schedules: Vec<LeagueSchedule>) -> Self {
        Self {
            build_date: Utc::now(),
            league_schedules,
        }
    }

    pub fn league(&self, key: &LeagueKey) -> Option<&LeagueSchedule> {
        self.league_schedules
            .iter()
            .find(|s| &s.identity.key() == key)
    }

    pub fn league_mut(&mut self, key: &LeagueKey) -> Option<&mut LeagueSchedule> {
        self.league_schedules
            .iter_mut()
            .find(|s| &s.identity.key() == key)
    }

    pub fn games(&self) -> impl Iterator<Item = &ScheduledGame> {
        self.league_schedules
            .iter()
            .flat_map(|s| s.scheduled_games.iter())
    }

    pub fn touch(&mut self) {
        self.build_date = Utc::now();
    }
}
