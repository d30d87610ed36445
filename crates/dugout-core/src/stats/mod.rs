// Statistics primitives: rounding and safe division, weighted summaries, ranks.

pub mod descriptive;
pub mod math;
pub mod rank;

pub use descriptive::DescriptiveStatistics;
pub use rank::{ordinal, placement, rank_ascending, Placement};
