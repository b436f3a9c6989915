// External data inputs: schedule, official results, participants.
//
// All three are read-only collaborators published as JSON files. The
// schedule is a hard startup dependency; results and participants degrade
// to empty when missing or malformed, so scoring always has something to
// work with.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// One scheduled matchup. Only `id`, `home`, and `away` drive scoring;
/// `kickoff` is carried through for display.
#[derive(Debug, Clone, Deserialize)]
pub struct Game {
    pub id: String,
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub kickoff: Option<String>,
}

impl Game {
    /// Display label in the conventional "away @ home" form.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away, self.home)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleWeek {
    pub week: u32,
    #[serde(default)]
    pub games: Vec<Game>,
}

/// A season's full schedule, as published in `schedule-<year>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub weeks: Vec<ScheduleWeek>,
}

impl Schedule {
    /// Games for a given week; empty when the week isn't in the schedule.
    pub fn week_games(&self, week: u32) -> &[Game] {
        self.weeks
            .iter()
            .find(|w| w.week == week)
            .map(|w| w.games.as_slice())
            .unwrap_or(&[])
    }

    /// Highest week number present in the schedule.
    pub fn last_week(&self) -> u32 {
        self.weeks.iter().map(|w| w.week).max().unwrap_or(0)
    }
}

/// Load the season schedule. Unlike results and participants, a missing or
/// unparseable schedule is a real error: nothing downstream can run
/// without the game list.
pub fn load_schedule(path: impl AsRef<Path>) -> Result<Schedule> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schedule file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse schedule file {}", path.display()))
}

// ---------------------------------------------------------------------------
// Official results
// ---------------------------------------------------------------------------

/// Game id → winning team name.
pub type WinnersMap = HashMap<String, String>;

#[derive(Debug, Deserialize)]
struct WinnersFile {
    #[serde(default)]
    winners: WinnersMap,
}

/// Parse a results document. Both published shapes are accepted: the
/// wrapped `{ "winners": { ... } }` form and a bare game-id → team map
/// (the admin tooling has emitted both over time). Unparseable input
/// yields an empty map.
pub fn parse_winners(text: &str) -> WinnersMap {
    if let Ok(file) = serde_json::from_str::<WinnersFile>(text) {
        if !file.winners.is_empty() {
            return file.winners;
        }
    }
    serde_json::from_str::<WinnersMap>(text).unwrap_or_default()
}

/// Path of the results file for a week: `<results_dir>/<year>/week-<week>.json`.
pub fn results_path(results_dir: impl AsRef<Path>, year: u16, week: u32) -> std::path::PathBuf {
    results_dir
        .as_ref()
        .join(year.to_string())
        .join(format!("week-{week}.json"))
}

/// Load the official winners for a week. A week without published results
/// is normal (games not yet played), so a missing file returns an empty
/// map without logging; parse failures are logged and also return empty.
pub fn load_winners(results_dir: impl AsRef<Path>, year: u16, week: u32) -> WinnersMap {
    let path = results_path(results_dir, year, week);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return WinnersMap::new(),
    };
    let winners = parse_winners(&text);
    if winners.is_empty() {
        warn!("results file {} contained no winners", path.display());
    }
    winners
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParticipantEntry {
    Name(String),
    Object { name: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParticipantsFile {
    Wrapped { participants: Vec<ParticipantEntry> },
    Bare(Vec<ParticipantEntry>),
}

/// Parse a participants document: either `{ "participants": [...] }` or a
/// bare array, with entries as plain strings or `{ "name": ... }` objects.
/// Blank names are dropped.
pub fn parse_participants(text: &str) -> Vec<Participant> {
    let entries = match serde_json::from_str::<ParticipantsFile>(text) {
        Ok(ParticipantsFile::Wrapped { participants }) => participants,
        Ok(ParticipantsFile::Bare(entries)) => entries,
        Err(_) => return Vec::new(),
    };
    entries
        .into_iter()
        .map(|entry| match entry {
            ParticipantEntry::Name(name) => name,
            ParticipantEntry::Object { name } => name,
        })
        .filter_map(|name| {
            let name = name.trim().to_string();
            (!name.is_empty()).then_some(Participant { name })
        })
        .collect()
}

/// Load the participant roster. Missing or malformed input degrades to an
/// empty roster with a warning — the leaderboard simply renders empty.
pub fn load_participants(path: impl AsRef<Path>) -> Vec<Participant> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("failed to read participants file {}: {e}", path.display());
            return Vec::new();
        }
    };
    let participants = parse_participants(&text);
    if participants.is_empty() {
        warn!("participants file {} yielded no entries", path.display());
    }
    participants
}
