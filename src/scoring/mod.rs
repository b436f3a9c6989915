// Scoring: per-week grading and season-level aggregation.

pub mod season;
pub mod week;

pub use season::{cumulative_from_results, rank_leaderboard, CumulativeScore};
pub use week::{score_picks, GameScoreDetail, ScoreResult};
