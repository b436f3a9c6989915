// Week scoring: grade one user's picks against the official winners.

use serde::Serialize;

use crate::data::{Game, WinnersMap};
use crate::picks::record::PickSet;

/// One graded game: the pick, the official outcome, and the points awarded.
#[derive(Debug, Clone, Serialize)]
pub struct GameScoreDetail {
    pub game_id: String,
    pub matchup: String,
    pub picked_team: String,
    pub confidence: u32,
    /// `None` until the game has an official result.
    pub official_winner: Option<String>,
    pub points: u32,
    pub correct: bool,
}

/// The full grading of one user's week.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub user_name: String,
    pub week: u32,
    pub year: u16,
    /// Sum of confidence over all graded picks — the ceiling for the week.
    pub total_possible: u32,
    /// Sum of confidence over correct picks.
    pub actual_score: u32,
    pub correct_picks: u32,
    pub total_picks: u32,
    /// Percentage of picks that were correct, rounded to 2 decimals.
    /// 0 when no picks were made.
    pub accuracy: f64,
    pub details: Vec<GameScoreDetail>,
    pub message: String,
}

impl ScoreResult {
    /// A zeroed result for a week with nothing to grade.
    pub fn empty(user_name: &str, week: u32, year: u16, message: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            week,
            year,
            total_possible: 0,
            actual_score: 0,
            correct_picks: 0,
            total_picks: 0,
            accuracy: 0.0,
            details: Vec::new(),
            message: message.to_string(),
        }
    }
}

/// Grade `picks` against `winners` over the week's game list.
///
/// Only games that were actually picked are graded; an unpicked game
/// neither inflates the possible total nor counts against accuracy. A
/// picked game without a published winner contributes its confidence to
/// `total_possible` but earns no points yet.
pub fn score_picks(
    user_name: &str,
    week: u32,
    year: u16,
    picks: &PickSet,
    winners: &WinnersMap,
    games: &[Game],
) -> ScoreResult {
    if picks.is_empty() {
        return ScoreResult::empty(user_name, week, year, "No picks found for this week");
    }

    let mut total_possible = 0u32;
    let mut actual_score = 0u32;
    let mut correct_picks = 0u32;
    let mut total_picks = 0u32;
    let mut details = Vec::new();

    for game in games {
        let Some(pick) = picks.get(&game.id) else {
            continue;
        };

        total_picks += 1;
        total_possible += pick.confidence;

        let official_winner = winners.get(&game.id);
        let correct = official_winner.is_some_and(|winner| *winner == pick.team);
        let points = if correct { pick.confidence } else { 0 };
        if correct {
            actual_score += pick.confidence;
            correct_picks += 1;
        }

        details.push(GameScoreDetail {
            game_id: game.id.clone(),
            matchup: game.matchup(),
            picked_team: pick.team.clone(),
            confidence: pick.confidence,
            official_winner: official_winner.cloned(),
            points,
            correct,
        });
    }

    let accuracy = if total_picks > 0 {
        round2(f64::from(correct_picks) / f64::from(total_picks) * 100.0)
    } else {
        0.0
    };

    ScoreResult {
        user_name: user_name.to_string(),
        week,
        year,
        total_possible,
        actual_score,
        correct_picks,
        total_picks,
        accuracy,
        details,
        message: format!("Scored {actual_score} out of {total_possible} possible points"),
    }
}

/// Round to 2 decimal places.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
