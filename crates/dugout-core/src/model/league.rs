// League identity: which category plays on which weekday, in which season.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Category / Season
// ---------------------------------------------------------------------------

/// Division of play, e.g. "Coed", "Mens", "Womens B". Free text on the
/// association's pages, so it stays a string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison; page tokens and CLI input disagree on case.
    pub fn matches(&self, other: &Category) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn display_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeasonError(pub String);

impl fmt::Display for ParseSeasonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown season `{}`", self.0)
    }
}

impl std::error::Error for ParseSeasonError {}

impl FromStr for Season {
    type Err = ParseSeasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spring" => Ok(Season::Spring),
            "summer" => Ok(Season::Summer),
            "fall" | "autumn" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            _ => Err(ParseSeasonError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// LeagueIdentity
// ---------------------------------------------------------------------------

/// The comparable part of a league identity. Two schedules with the same key
/// describe the same league even if they were scraped from different URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeagueKey {
    pub category: Category,
    pub day: Weekday,
    pub season: Season,
    pub year: u16,
}

impl fmt::Display for LeagueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.day, self.category, self.season, self.year
        )
    }
}

/// Identity of one league schedule. Built once from the schedule page and
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueIdentity {
    pub category: Category,
    pub day: Weekday,
    pub season: Season,
    pub year: u16,
    /// Schedule page this identity was scraped from.
    pub source: String,
}

impl LeagueIdentity {
    pub fn key(&self) -> LeagueKey {
        LeagueKey {
            category: self.category.clone(),
            day: self.day,
            season: self.season,
            year: self.year,
        }
    }

    /// Identity equality ignores the source location.
    pub fn same_league(&self, other: &LeagueIdentity) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for LeagueIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
