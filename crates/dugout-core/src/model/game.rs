// Scheduled games and their box-score results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::batting::PlayerLine;
use crate::model::league::LeagueIdentity;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Visitor,
    Home,
}

impl Side {
    /// Team-summary rows alternate visitor, home, visitor, ...
    pub fn from_row_index(index: usize) -> Self {
        if index % 2 == 0 {
            Side::Visitor
        } else {
            Side::Home
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    /// Parse the result-page outcome cell ("W", "Loss", "T", ...).
    pub fn from_str_outcome(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" | "WIN" => Some(Outcome::Win),
            "L" | "LOSS" => Some(Outcome::Loss),
            "T" | "TIE" => Some(Outcome::Tie),
            _ => None,
        }
    }

    /// Outcome implied by a final score, used when the page leaves it blank.
    pub fn from_runs(scored: u32, against: u32) -> Self {
        match scored.cmp(&against) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Loss,
            std::cmp::Ordering::Equal => Outcome::Tie,
        }
    }
}

/// Status banner printed on a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Scheduled,
    Final,
    Cancelled,
    Forfeit,
}

impl GameStatus {
    pub fn from_str_status(s: &str) -> Option<Self> {
        let lc = s.trim().to_ascii_lowercase();
        if lc.starts_with("final") {
            Some(GameStatus::Final)
        } else if lc.starts_with("cancel") || lc.starts_with("rain") {
            Some(GameStatus::Cancelled)
        } else if lc.starts_with("forfeit") {
            Some(GameStatus::Forfeit)
        } else if lc.starts_with("scheduled") || lc.starts_with("upcoming") || lc.is_empty() {
            Some(GameStatus::Scheduled)
        } else {
            None
        }
    }

    /// Whether the page has stopped changing for this game.
    pub fn is_settled(&self) -> bool {
        !matches!(self, GameStatus::Scheduled)
    }
}

/// How a scheduled game counts in aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameClass {
    Unplayed,
    Cancelled,
    Forfeited,
    Played,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub title: String,
    pub id: String,
    pub date: NaiveDate,
    pub league: LeagueIdentity,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResult {
    pub name: String,
    pub side: Side,
    pub runs_scored: u32,
    pub runs_against: u32,
    pub hits: u32,
    pub outcome: Outcome,
    /// Batting rows in page order, ending with the synthesized totals row.
    pub players: Vec<PlayerLine>,
}

impl TeamResult {
    /// Player rows without the totals row.
    pub fn batters(&self) -> impl Iterator<Item = &PlayerLine> {
        self.players.iter().filter(|p| !p.is_totals())
    }

    pub fn totals(&self) -> Option<&PlayerLine> {
        self.players.iter().find(|p| p.is_totals())
    }
}

/// A fetched result page. `teams` is `None` when the page carries no box
/// score (not yet played, cancelled, forfeited).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub info: GameInfo,
    pub teams: Option<[TeamResult; 2]>,
}

impl GameResult {
    pub fn without_box_score(info: GameInfo) -> Self {
        Self { info, teams: None }
    }

    pub fn has_box_score(&self) -> bool {
        self.teams.is_some()
    }
}

/// Fetch state of a game's result page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ResultState {
    #[default]
    NotFetched,
    Fetched(GameResult),
    /// The last attempt found the source down; retried on the next pass.
    Unavailable { reason: String },
}

impl ResultState {
    pub fn result(&self) -> Option<&GameResult> {
        match self {
            ResultState::Fetched(result) => Some(result),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ScheduledGame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub visitor: u32,
    pub home: u32,
}

impl FinalScore {
    pub fn is_zero_zero(&self) -> bool {
        self.visitor == 0 && self.home == 0
    }
}

/// One calendar entry. Created once by the build pass (or when it first
/// appears on a schedule) and afterwards only mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledGame {
    pub visitor: String,
    pub home: String,
    pub date: NaiveDate,
    /// Absolute URL of the result page, when the schedule links one.
    pub result_page: Option<String>,
    pub scores: Option<FinalScore>,
    #[serde(default)]
    pub result: ResultState,
}

impl ScheduledGame {
    pub fn new(visitor: impl Into<String>, home: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            visitor: visitor.into(),
            home: home.into(),
            date,
            result_page: None,
            scores: None,
            result: ResultState::NotFetched,
        }
    }

    /// Complete iff both final scores are present.
    pub fn is_complete(&self) -> bool {
        self.scores.is_some()
    }

    pub fn box_score(&self) -> Option<&[TeamResult; 2]> {
        self.result.result().and_then(|r| r.teams.as_ref())
    }

    /// Classification rule: a box score means played; otherwise a complete
    /// game scored 0-0 is cancelled and any other complete game is a forfeit.
    pub fn classify(&self) -> GameClass {
        let Some(scores) = self.scores else {
            return GameClass::Unplayed;
        };
        if self.box_score().is_some() {
            GameClass::Played
        } else if scores.is_zero_zero() {
            GameClass::Cancelled
        } else {
            GameClass::Forfeited
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.classify() == GameClass::Cancelled
    }

    pub fn is_played(&self) -> bool {
        self.classify() == GameClass::Played
    }

    /// Whether the update pass should fetch this game's result page again.
    pub fn needs_refresh(&self) -> bool {
        if self.result_page.is_none() {
            return false;
        }
        match &self.result {
            ResultState::NotFetched | ResultState::Unavailable { .. } => true,
            ResultState::Fetched(result) => {
                self.is_complete() && !result.has_box_score() && !result.info.status.is_settled()
            }
        }
    }

    /// Same calendar slot, used to match a re-scraped schedule row against a
    /// stored game when neither side links a result page.
    pub fn same_slot(&self, other: &ScheduledGame) -> bool {
        self.date == other.date && self.visitor == other.visitor && self.home == other.home
    }

    pub fn involves(&self, team: &str) -> bool {
        self.visitor == team || self.home == team
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
