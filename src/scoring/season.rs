// Season aggregation: cumulative scores and the ranked leaderboard.

use std::cmp::Reverse;

use serde::Serialize;

use crate::scoring::week::{round2, ScoreResult};

/// A participant's totals through a given week, with the per-week results
/// that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct CumulativeScore {
    pub user_name: String,
    pub through_week: u32,
    pub year: u16,
    pub total_score: u32,
    pub total_possible: u32,
    pub total_correct: u32,
    pub total_picks: u32,
    /// Recomputed from the summed correct/total counts, not averaged from
    /// per-week accuracies — averaging would over-weight weeks with few
    /// picks.
    pub overall_accuracy: f64,
    pub weekly_results: Vec<ScoreResult>,
}

/// Fold per-week results into season totals. The results are expected to
/// cover weeks `1..=through_week` in order, but the fold itself just sums
/// whatever it is given.
pub fn cumulative_from_results(
    user_name: &str,
    through_week: u32,
    year: u16,
    weekly_results: Vec<ScoreResult>,
) -> CumulativeScore {
    let mut total_score = 0u32;
    let mut total_possible = 0u32;
    let mut total_correct = 0u32;
    let mut total_picks = 0u32;

    for result in &weekly_results {
        total_score += result.actual_score;
        total_possible += result.total_possible;
        total_correct += result.correct_picks;
        total_picks += result.total_picks;
    }

    let overall_accuracy = if total_picks > 0 {
        round2(f64::from(total_correct) / f64::from(total_picks) * 100.0)
    } else {
        0.0
    };

    CumulativeScore {
        user_name: user_name.to_string(),
        through_week,
        year,
        total_score,
        total_possible,
        total_correct,
        total_picks,
        overall_accuracy,
        weekly_results,
    }
}

/// Order leaderboard entries: total score descending, ties broken by name
/// ascending so the ranking is deterministic.
pub fn rank_leaderboard(mut entries: Vec<CumulativeScore>) -> Vec<CumulativeScore> {
    entries.sort_by(|a, b| {
        Reverse(a.total_score)
            .cmp(&Reverse(b.total_score))
            .then_with(|| a.user_name.cmp(&b.user_name))
    });
    entries
}
