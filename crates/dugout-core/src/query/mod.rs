// Read-only queries over a DataStore: scoping, player totals, standings,
// and weighted rankings.

pub mod players;
pub mod ranking;
pub mod scope;
pub mod standings;

pub use players::{PlayerGameLine, PlayerSummary};
pub use ranking::{rank_players, weighted_stat, RankedPlayer, RankingTable, Standing, StatKind, WeightBy};
pub use scope::{DayIndex, LeagueFilter, QuerySession};
pub use standings::TeamStanding;
