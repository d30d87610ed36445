// Data model: leagues, scheduled games, box scores, and the store root.

pub mod batting;
pub mod game;
pub mod league;
pub mod store;

pub use batting::{BattingLine, PlayerLine, PlayerStatsView, LEAGUE_TOTALS_NAME, TEAM_TOTALS_NAME};
pub use game::{
    FinalScore, GameClass, GameInfo, GameResult, GameStatus, Outcome, ResultState, ScheduledGame,
    Side, TeamResult,
};
pub use league::{Category, LeagueIdentity, LeagueKey, Season};
pub use store::{DataStore, LeagueSchedule};
