// Command-line surface.

use std::path::PathBuf;

use chrono::Weekday;
use clap::{Args, Parser, Subcommand};

use dugout_core::model::{Category, Season};
use dugout_core::query::{LeagueFilter, StatKind, WeightBy};

#[derive(Debug, Parser)]
#[command(name = "dugout")]
#[command(version, about = "Scrape recreational league results and query player and team stats", long_about = None)]
pub struct Cli {
    /// Config file path (defaults to config/dugout.toml or the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrape every catalog league's schedule and results into a new store
    Build,
    /// Merge newly posted games and fetch only results that are still missing
    Update,
    /// Show aggregate counts for the stored season
    Counts,
    /// Season batting lines per player
    Players {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Only count box scores for this team
        #[arg(long)]
        team: Option<String>,
    },
    /// Team records from final scores
    Standings {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Rank qualifying players by a derived stat
    Rank {
        #[command(flatten)]
        scope: ScopeArgs,
        /// avg, obp, slg, ops or iso
        #[arg(long, default_value = "ops")]
        stat: StatKind,
        /// pa, games or uniform (default from config)
        #[arg(long)]
        weight: Option<WeightBy>,
        /// Plate appearances a player must exceed (default from config)
        #[arg(long = "min-pa")]
        min_pa: Option<u32>,
    },
    /// One player's game-by-game lines
    Log {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        player: String,
    },
}

/// Which leagues a query covers. Omitted flags match every league.
#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// League category, e.g. "coed"
    #[arg(long)]
    pub category: Option<String>,
    /// Weekday the league plays, e.g. "tue"
    #[arg(long)]
    pub day: Option<Weekday>,
    /// spring, summer, fall or winter
    #[arg(long)]
    pub season: Option<Season>,
    #[arg(long)]
    pub year: Option<u16>,
}

impl ScopeArgs {
    pub fn filter(&self) -> LeagueFilter {
        LeagueFilter {
            category: self.category.as_deref().map(Category::new),
            day: self.day,
            season: self.season,
            year: self.year,
        }
    }
}
