// Weighted league statistics, z-scores, and percentile rankings for players.
//
// Pool statistics come only from players above the plate-appearance
// threshold; every player is then scored against that pool.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::PlayerStatsView;
use crate::query::players::PlayerSummary;
use crate::query::scope::{LeagueFilter, QuerySession};
use crate::stats::{rank_ascending, DescriptiveStatistics, Placement};

// ---------------------------------------------------------------------------
// Stat and weight selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatKind {
    Average,
    Slugging,
    OnBase,
    Ops,
    IsolatedPower,
}

impl StatKind {
    pub fn value(&self, view: &PlayerStatsView) -> f64 {
        match self {
            StatKind::Average => view.average(),
            StatKind::Slugging => view.slugging(),
            StatKind::OnBase => view.on_base(),
            StatKind::Ops => view.ops(),
            StatKind::IsolatedPower => view.isolated_power(),
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            StatKind::Average => "AVG",
            StatKind::Slugging => "SLG",
            StatKind::OnBase => "OBP",
            StatKind::Ops => "OPS",
            StatKind::IsolatedPower => "ISO",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avg" | "average" => Ok(StatKind::Average),
            "slg" | "slugging" => Ok(StatKind::Slugging),
            "obp" | "onbase" | "on-base" => Ok(StatKind::OnBase),
            "ops" => Ok(StatKind::Ops),
            "iso" => Ok(StatKind::IsolatedPower),
            other => Err(format!("unknown stat `{other}` (expected avg, slg, obp, ops, iso)")),
        }
    }
}

/// What each player's value is weighted by in the pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBy {
    PlateAppearances,
    Games,
    Uniform,
}

impl WeightBy {
    pub fn weight(&self, summary: &PlayerSummary) -> f64 {
        match self {
            WeightBy::PlateAppearances => summary.view().plate_appearances() as f64,
            WeightBy::Games => summary.games as f64,
            WeightBy::Uniform => 1.0,
        }
    }
}

impl FromStr for WeightBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pa" | "plate_appearances" => Ok(WeightBy::PlateAppearances),
            "g" | "games" => Ok(WeightBy::Games),
            "uniform" | "none" => Ok(WeightBy::Uniform),
            other => Err(format!("unknown weight `{other}` (expected pa, games, uniform)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Standing {
    Ranked(Placement),
    /// At or below the plate-appearance threshold; kept but not ranked.
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedPlayer {
    pub name: String,
    pub games: u32,
    pub plate_appearances: u32,
    pub value: f64,
    pub z_score: f64,
    pub standing: Standing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    pub stat: StatKind,
    pub weight: WeightBy,
    pub min_plate_appearances: u32,
    /// Weighted statistics over the qualifying pool.
    pub pool: DescriptiveStatistics,
    /// Ranked players best-first, then unranked players by name.
    pub players: Vec<RankedPlayer>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Weighted summary of `stat` over the given players.
pub fn weighted_stat(players: &[PlayerSummary], stat: StatKind, weight: WeightBy) -> DescriptiveStatistics {
    let pairs: Vec<(f64, f64)> = players
        .iter()
        .filter(|p| !p.is_totals())
        .map(|p| (stat.value(&p.view()), weight.weight(p)))
        .collect();
    DescriptiveStatistics::weighted(&pairs)
}

/// Rank `players` by `stat`. Players need strictly more than
/// `min_plate_appearances` to enter the pool.
pub fn rank_players(
    players: &[PlayerSummary],
    stat: StatKind,
    weight: WeightBy,
    min_plate_appearances: u32,
) -> RankingTable {
    let players: Vec<&PlayerSummary> = players.iter().filter(|p| !p.is_totals()).collect();
    let (qualifying, unqualified): (Vec<&PlayerSummary>, Vec<&PlayerSummary>) = players
        .into_iter()
        .partition(|p| p.view().plate_appearances() > min_plate_appearances);

    let pool_rows: Vec<PlayerSummary> = qualifying.iter().map(|p| (*p).clone()).collect();
    let pool = weighted_stat(&pool_rows, stat, weight);

    let values: Vec<f64> = qualifying.iter().map(|p| stat.value(&p.view())).collect();
    let mut ranked: Vec<RankedPlayer> = rank_ascending(&values)
        .into_iter()
        .map(|(idx, placement)| {
            let p = qualifying[idx];
            RankedPlayer {
                name: p.name.clone(),
                games: p.games,
                plate_appearances: p.view().plate_appearances(),
                value: values[idx],
                z_score: pool.z_score(values[idx]),
                standing: Standing::Ranked(placement),
            }
        })
        .collect();
    // Best first.
    ranked.reverse();

    let mut unranked: Vec<RankedPlayer> = unqualified
        .into_iter()
        .map(|p| {
            let value = stat.value(&p.view());
            RankedPlayer {
                name: p.name.clone(),
                games: p.games,
                plate_appearances: p.view().plate_appearances(),
                value,
                z_score: pool.z_score(value),
                standing: Standing::InsufficientData,
            }
        })
        .collect();
    unranked.sort_by(|a, b| a.name.cmp(&b.name));
    ranked.extend(unranked);

    RankingTable {
        stat,
        weight,
        min_plate_appearances,
        pool,
        players: ranked,
    }
}

impl<'a> QuerySession<'a> {
    /// Rank every player in scope by `stat`.
    pub fn rank(
        &self,
        filter: &LeagueFilter,
        stat: StatKind,
        weight: WeightBy,
        min_plate_appearances: u32,
    ) -> RankingTable {
        let players = self.player_totals(filter, None);
        rank_players(&players, stat, weight, min_plate_appearances)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
