// Box-score batting lines and the derived view computed over them.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::stats::math::{rate, round3};

/// Name given to the synthesized per-team totals row.
pub const TEAM_TOTALS_NAME: &str = "Team Totals";

/// Name given to the synthesized league-wide totals row in aggregations.
pub const LEAGUE_TOTALS_NAME: &str = "League Totals";

// ---------------------------------------------------------------------------
// BattingLine
// ---------------------------------------------------------------------------

/// Raw counting stats for one batter. Derived rates live on
/// [`PlayerStatsView`]; nothing here is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingLine {
    pub at_bats: u32,
    pub runs: u32,
    pub singles: u32,
    pub doubles: u32,
    pub triples: u32,
    pub home_runs: u32,
    pub bases_on_balls: u32,
    pub sacrifice_flies: u32,
}

impl AddAssign for BattingLine {
    fn add_assign(&mut self, rhs: Self) {
        self.at_bats += rhs.at_bats;
        self.runs += rhs.runs;
        self.singles += rhs.singles;
        self.doubles += rhs.doubles;
        self.triples += rhs.triples;
        self.home_runs += rhs.home_runs;
        self.bases_on_balls += rhs.bases_on_balls;
        self.sacrifice_flies += rhs.sacrifice_flies;
    }
}

impl Add for BattingLine {
    type Output = BattingLine;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for BattingLine {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BattingLine::default(), Add::add)
    }
}

impl<'a> Sum<&'a BattingLine> for BattingLine {
    fn sum<I: Iterator<Item = &'a BattingLine>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// PlayerLine
// ---------------------------------------------------------------------------

/// One row of a team box score. Names are "Last, First"; the final row of
/// every team is the synthesized [`TEAM_TOTALS_NAME`] row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLine {
    pub name: String,
    #[serde(flatten)]
    pub stats: BattingLine,
}

impl PlayerLine {
    pub fn new(name: impl Into<String>, stats: BattingLine) -> Self {
        Self {
            name: name.into(),
            stats,
        }
    }

    pub fn is_totals(&self) -> bool {
        self.name == TEAM_TOTALS_NAME || self.name == LEAGUE_TOTALS_NAME
    }

    /// Build the totals row for a list of player rows (any existing totals
    /// rows are excluded from the sum).
    pub fn totals_for(players: &[PlayerLine]) -> PlayerLine {
        let stats = players
            .iter()
            .filter(|p| !p.is_totals())
            .map(|p| &p.stats)
            .sum();
        PlayerLine::new(TEAM_TOTALS_NAME, stats)
    }
}

// ---------------------------------------------------------------------------
// PlayerStatsView
// ---------------------------------------------------------------------------

/// Derived batting stats over a line (or a sum of lines). Never persisted;
/// every accessor recomputes from the counting stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatsView {
    line: BattingLine,
}

impl PlayerStatsView {
    pub fn new(line: BattingLine) -> Self {
        Self { line }
    }

    pub fn of(player: &PlayerLine) -> Self {
        Self::new(player.stats)
    }

    /// Sum several lines into one view (season totals for a player).
    pub fn summed<'a>(lines: impl IntoIterator<Item = &'a BattingLine>) -> Self {
        Self::new(lines.into_iter().sum())
    }

    pub fn line(&self) -> &BattingLine {
        &self.line
    }

    pub fn plate_appearances(&self) -> u32 {
        self.line.at_bats + self.line.bases_on_balls + self.line.sacrifice_flies
    }

    pub fn hits(&self) -> u32 {
        self.line.singles + self.line.doubles + self.line.triples + self.line.home_runs
    }

    pub fn extra_base_hits(&self) -> u32 {
        self.line.doubles + self.line.triples + self.line.home_runs
    }

    pub fn total_bases(&self) -> u32 {
        self.line.singles
            + 2 * self.line.doubles
            + 3 * self.line.triples
            + 4 * self.line.home_runs
    }

    /// Hits per at-bat.
    pub fn average(&self) -> f64 {
        rate(self.hits(), self.line.at_bats)
    }

    /// Total bases per at-bat.
    pub fn slugging(&self) -> f64 {
        rate(self.total_bases(), self.line.at_bats)
    }

    /// (Hits + walks) per plate appearance (at-bats + walks + sac flies).
    pub fn on_base(&self) -> f64 {
        rate(
            self.hits() + self.line.bases_on_balls,
            self.plate_appearances(),
        )
    }

    /// On-base plus slugging, summed from the rounded components.
    pub fn ops(&self) -> f64 {
        round3(self.on_base() + self.slugging())
    }

    /// Slugging minus average.
    pub fn isolated_power(&self) -> f64 {
        round3(self.slugging() - self.average())
    }
}

impl From<&PlayerLine> for PlayerStatsView {
    fn from(player: &PlayerLine) -> Self {
        Self::of(player)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
