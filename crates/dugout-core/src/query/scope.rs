// Scoped filtering of league schedules.

use std::collections::HashMap;

use chrono::Weekday;
use tracing::debug;

use crate::model::{Category, DataStore, LeagueIdentity, LeagueSchedule, ScheduledGame, Season};

/// Which leagues a query covers. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeagueFilter {
    pub category: Option<Category>,
    pub day: Option<Weekday>,
    pub season: Option<Season>,
    pub year: Option<u16>,
}

impl LeagueFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, identity: &LeagueIdentity) -> bool {
        self.category
            .as_ref()
            .map_or(true, |c| c.matches(&identity.category))
            && self.day.map_or(true, |d| d == identity.day)
            && self.season.map_or(true, |s| s == identity.season)
            && self.year.map_or(true, |y| y == identity.year)
    }
}

/// Valid weekdays per category, built once per query session.
#[derive(Debug, Clone, Default)]
pub struct DayIndex {
    days: HashMap<String, Vec<Weekday>>,
}

impl DayIndex {
    pub fn build(store: &DataStore) -> Self {
        let mut days: HashMap<String, Vec<Weekday>> = HashMap::new();
        for schedule in &store.league_schedules {
            let entry = days
                .entry(schedule.identity.category.as_str().to_ascii_lowercase())
                .or_default();
            if !entry.contains(&schedule.identity.day) {
                entry.push(schedule.identity.day);
            }
        }
        for list in days.values_mut() {
            list.sort_by_key(|d| d.num_days_from_monday());
        }
        Self { days }
    }

    pub fn knows_category(&self, category: &Category) -> bool {
        self.days
            .contains_key(&category.as_str().to_ascii_lowercase())
    }

    pub fn days_for(&self, category: &Category) -> &[Weekday] {
        self.days
            .get(&category.as_str().to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a filter can match anything at all. A day is only checked
    /// against a category when both are given.
    pub fn validate(&self, filter: &LeagueFilter) -> bool {
        match (&filter.category, filter.day) {
            (Some(category), Some(day)) => self.days_for(category).contains(&day),
            (Some(category), None) => self.knows_category(category),
            _ => true,
        }
    }
}

/// Read-only view over one DataStore for the duration of a set of queries.
pub struct QuerySession<'a> {
    store: &'a DataStore,
    days: DayIndex,
}

impl<'a> QuerySession<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            store,
            days: DayIndex::build(store),
        }
    }

    pub fn store(&self) -> &'a DataStore {
        self.store
    }

    pub fn day_index(&self) -> &DayIndex {
        &self.days
    }

    /// League schedules in scope. An impossible combination (a day the
    /// category never plays on, an unknown category) yields an empty list.
    pub fn schedules(&self, filter: &LeagueFilter) -> Vec<&'a LeagueSchedule> {
        if !self.days.validate(filter) {
            debug!(?filter, "filter matches no league");
            return Vec::new();
        }
        self.store
            .league_schedules
            .iter()
            .filter(|s| filter.matches(&s.identity))
            .collect()
    }

    /// Played games in scope, paired with their league.
    pub fn played_games(
        &self,
        filter: &LeagueFilter,
    ) -> Vec<(&'a LeagueIdentity, &'a ScheduledGame)> {
        self.schedules(filter)
            .into_iter()
            .flat_map(|s| s.played_games().map(move |g| (&s.identity, g)))
            .collect()
    }
}
