// Application orchestration.
//
// `PoolApp` ties the store, the remote sync adapter, and the scoring engine
// together behind the local-first policy: every save lands locally before
// the remote is attempted, every load merges local and remote copies, and
// remote failures never surface as errors. `Autosaver` collapses bursts of
// rapid edits into one persisted write per quiet period.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::{self, Participant, Schedule, WinnersMap};
use crate::picks::merge::merge_records;
use crate::picks::record::{PickRecord, PickSet};
use crate::picks::store::PickStore;
use crate::picks::validate::{validate_confidence, ValidationWarning};
use crate::scoring::season::{cumulative_from_results, rank_leaderboard, CumulativeScore};
use crate::scoring::week::{score_picks, ScoreResult};
use crate::sync::RemoteSync;

/// Quiet period an edit burst must observe before the autosaver writes.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Where a save landed. `local` is the authoritative outcome; the remote
/// leg is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub local: bool,
    /// `None` when remote sync is not configured.
    pub remote: Option<bool>,
}

impl SaveOutcome {
    pub fn describe(&self) -> &'static str {
        match (self.local, self.remote) {
            (true, Some(true)) => "saved locally and synced",
            (true, Some(false)) => "saved locally only (remote sync failed)",
            (true, None) => "saved locally",
            (false, Some(true)) => "synced remotely only (local save failed)",
            (false, _) => "save failed",
        }
    }
}

/// The assembled application: config, store, remote adapter, and schedule.
pub struct PoolApp {
    config: Config,
    store: PickStore,
    remote: RemoteSync,
    schedule: Schedule,
}

impl PoolApp {
    pub fn new(config: Config, store: PickStore, remote: RemoteSync, schedule: Schedule) -> Self {
        Self {
            config,
            store,
            remote,
            schedule,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn year(&self) -> u16 {
        self.config.pool.year
    }

    // ------------------------------------------------------------------
    // Picks
    // ------------------------------------------------------------------

    /// Persist a user's picks for a week: locally first, then remotely when
    /// configured. One record value is written to both legs so they cannot
    /// diverge on timestamp.
    pub async fn save_picks(&self, user: &str, week: u32, picks: &PickSet) -> SaveOutcome {
        let record = PickRecord::now(picks.clone());
        let local = self.store.save_record(user, self.year(), week, &record);

        let remote = if self.remote.is_configured() {
            let ok = self.remote.save_record(user, self.year(), week, &record).await;
            if !ok {
                info!("remote save failed for {user} week {week}; local copy retained");
            }
            Some(ok)
        } else {
            None
        };

        SaveOutcome { local, remote }
    }

    /// Load a user's picks for a week, reconciling the local and remote
    /// copies by recency. Returns an empty set when neither copy exists.
    pub async fn load_picks(&self, user: &str, week: u32) -> PickSet {
        let local = self.store.load_record(user, self.year(), week);
        let remote = self.remote.load_record(user, self.year(), week).await;
        merge_records(local, remote)
            .map(|record| record.picks)
            .unwrap_or_default()
    }

    /// Remove a user's local picks for a week.
    pub fn clear_picks(&self, user: &str, week: u32) -> bool {
        self.store.clear(user, self.year(), week)
    }

    /// Check a pick set against the week's confidence conventions.
    pub fn validate_week(&self, picks: &PickSet, week: u32) -> Vec<ValidationWarning> {
        validate_confidence(picks, self.schedule.week_games(week).len())
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    /// Grade one user's week against the published winners.
    pub async fn score_week(&self, user: &str, week: u32) -> ScoreResult {
        let picks = self.load_picks(user, week).await;
        let winners = data::load_winners(&self.config.data_paths.results_dir, self.year(), week);
        score_picks(
            user,
            week,
            self.year(),
            &picks,
            &winners,
            self.schedule.week_games(week),
        )
    }

    /// A user's season totals through `through_week` inclusive.
    pub async fn cumulative_score(&self, user: &str, through_week: u32) -> CumulativeScore {
        let mut weekly_results = Vec::with_capacity(through_week as usize);
        for week in 1..=through_week {
            weekly_results.push(self.score_week(user, week).await);
        }
        cumulative_from_results(user, through_week, self.year(), weekly_results)
    }

    /// Ranked standings for the full roster through `through_week`.
    pub async fn leaderboard(
        &self,
        participants: &[Participant],
        through_week: u32,
    ) -> Vec<CumulativeScore> {
        let mut entries = Vec::with_capacity(participants.len());
        for participant in participants {
            entries.push(self.cumulative_score(&participant.name, through_week).await);
        }
        rank_leaderboard(entries)
    }

    /// One week's scoreboard: each participant's points for the week next
    /// to their season total, best week first.
    pub async fn scoreboard(
        &self,
        participants: &[Participant],
        week: u32,
    ) -> Vec<ScoreboardRow> {
        let season_end = self.schedule.last_week();
        let mut rows = Vec::with_capacity(participants.len());
        for participant in participants {
            let week_result = self.score_week(&participant.name, week).await;
            let season = self.cumulative_score(&participant.name, season_end).await;
            rows.push(ScoreboardRow {
                user_name: participant.name.clone(),
                week_score: week_result.actual_score,
                total_score: season.total_score,
            });
        }
        rows.sort_by(|a, b| {
            b.week_score
                .cmp(&a.week_score)
                .then_with(|| a.user_name.cmp(&b.user_name))
        });
        rows
    }

    // ------------------------------------------------------------------
    // Winners publishing
    // ------------------------------------------------------------------

    /// Publish the official winners for a week: write the local results
    /// file, then push to the remote store when configured.
    pub async fn save_winners(&self, week: u32, winners: &WinnersMap) -> SaveOutcome {
        let local = self.write_winners_file(week, winners);

        let remote = if self.remote.is_configured() {
            Some(self.remote.save_winners(self.year(), week, winners).await)
        } else {
            None
        };

        SaveOutcome { local, remote }
    }

    fn write_winners_file(&self, week: u32, winners: &WinnersMap) -> bool {
        let path = data::results_path(&self.config.data_paths.results_dir, self.year(), week);
        let json = match serde_json::to_string_pretty(&serde_json::json!({ "winners": winners })) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize winners: {e}");
                return false;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create results directory {}: {e}", parent.display());
                return false;
            }
        }
        match std::fs::write(&path, json) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to write results file {}: {e}", path.display());
                false
            }
        }
    }
}

/// A scoreboard line for one participant.
#[derive(Debug, Clone)]
pub struct ScoreboardRow {
    pub user_name: String,
    pub week_score: u32,
    pub total_score: u32,
}

// ---------------------------------------------------------------------------
// Debounced autosave
// ---------------------------------------------------------------------------

/// Collapses bursts of edits into one write per `(user, week)` key.
///
/// Each `schedule` call arms a fresh timer for the key and aborts the
/// previous one, so only the last picks within a quiet period are written.
pub struct Autosaver {
    app: Arc<PoolApp>,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl Autosaver {
    pub fn new(app: Arc<PoolApp>) -> Self {
        Self {
            app,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Queue `picks` for `(user, week)`. The write fires after
    /// `AUTOSAVE_DEBOUNCE` of quiet; a newer call for the same key
    /// supersedes this one.
    pub fn schedule(&self, user: &str, week: u32, picks: PickSet) {
        let Some(key) = PickStore::record_key(user, self.app.year(), week) else {
            warn!(user, week, "ignoring autosave for an invalid key");
            return;
        };

        let app = Arc::clone(&self.app);
        let user = user.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(AUTOSAVE_DEBOUNCE).await;
            let outcome = app.save_picks(&user, week, &picks).await;
            debug!("autosave for {user} week {week}: {}", outcome.describe());
        });

        let mut pending = self.pending.lock().expect("autosaver mutex poisoned");
        if let Some(previous) = pending.insert(key, handle) {
            previous.abort();
        }
    }

    /// Wait for every pending autosave to either fire or be superseded.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().expect("autosaver mutex poisoned");
            pending.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            // Aborted handles resolve with a JoinError; that's expected.
            let _ = handle.await;
        }
    }
}
