// Non-blocking confidence validation.
//
// Confidence values are conventionally unique within a week and bounded by
// the week's game count. Violations produce warnings for the caller to
// surface; they never prevent a save.

use std::collections::HashSet;
use std::fmt;

use crate::picks::record::PickSet;

/// A user-facing, non-fatal problem with a week's confidence assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The same confidence value appears on more than one pick.
    DuplicateConfidence { values: Vec<u32> },
    /// Confidence values outside `1..=max` (the week's game count).
    OutOfRangeConfidence { values: Vec<u32>, max: u32 },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::DuplicateConfidence { values } => {
                write!(f, "Duplicate confidence values: {}", join(values))
            }
            ValidationWarning::OutOfRangeConfidence { values, max } => {
                write!(
                    f,
                    "Confidence values must be between 1 and {max}, got: {}",
                    join(values)
                )
            }
        }
    }
}

fn join(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check a week's picks against the uniqueness and range conventions.
/// Unset confidences (0) are ignored — a pick in progress is not a problem.
pub fn validate_confidence(picks: &PickSet, game_count: usize) -> Vec<ValidationWarning> {
    let assigned: Vec<u32> = picks.values().map(|p| p.confidence).filter(|&c| c > 0).collect();

    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    let mut duplicates: Vec<u32> = assigned
        .iter()
        .copied()
        .filter(|&c| !seen.insert(c))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    duplicates.sort_unstable();
    if !duplicates.is_empty() {
        warnings.push(ValidationWarning::DuplicateConfidence { values: duplicates });
    }

    let max = game_count as u32;
    let mut out_of_range: Vec<u32> = assigned.iter().copied().filter(|&c| c > max).collect();
    out_of_range.sort_unstable();
    out_of_range.dedup();
    if !out_of_range.is_empty() {
        warnings.push(ValidationWarning::OutOfRangeConfidence {
            values: out_of_range,
            max,
        });
    }

    warnings
}
