// Integration tests for the confidence pool tracker.
//
// These tests exercise the full system end-to-end using the library crate's
// public API: persisting picks through the store, reconciling local and
// remote copies, grading against published results, and producing season
// standings.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use confidence_pool::app::{Autosaver, PoolApp};
use confidence_pool::config::{Config, CredentialsConfig, DataPaths, PoolSettings};
use confidence_pool::data::{self, Schedule, WinnersMap};
use confidence_pool::picks::merge::merge_records;
use confidence_pool::picks::record::{Pick, PickRecord, PickSet};
use confidence_pool::picks::store::PickStore;
use confidence_pool::sync::{RemoteStore, RemoteSync};

use async_trait::async_trait;

// ===========================================================================
// Test helpers
// ===========================================================================

const SCHEDULE_JSON: &str = r#"{
    "weeks": [
        { "week": 1, "games": [
            { "id": "G1", "home": "Eagles", "away": "Cowboys", "kickoff": "2025-09-07T17:00:00Z" },
            { "id": "G2", "home": "Chiefs", "away": "Ravens", "kickoff": "2025-09-07T20:25:00Z" }
        ]},
        { "week": 2, "games": [
            { "id": "G3", "home": "Bills", "away": "Jets" },
            { "id": "G4", "home": "Lions", "away": "Bears" }
        ]}
    ]
}"#;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("confpool_it_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn inline_config(data_dir: &Path) -> Config {
    Config {
        pool: PoolSettings {
            name: "Integration Pool".into(),
            year: 2025,
            weeks: 18,
        },
        credentials: CredentialsConfig::default(),
        db_path: ":memory:".into(),
        data_paths: DataPaths {
            schedule: data_dir.join("schedule.json").to_string_lossy().into_owned(),
            results_dir: data_dir.join("results").to_string_lossy().into_owned(),
            participants: data_dir.join("participants.json").to_string_lossy().into_owned(),
        },
        branch: "main".into(),
    }
}

fn build_app(data_dir: &Path, remote: RemoteSync) -> Arc<PoolApp> {
    let schedule: Schedule = serde_json::from_str(SCHEDULE_JSON).unwrap();
    let store = PickStore::open(":memory:").unwrap();
    Arc::new(PoolApp::new(inline_config(data_dir), store, remote, schedule))
}

fn publish_results(data_dir: &Path, week: u32, winners: &[(&str, &str)]) {
    let dir = data_dir.join("results/2025");
    std::fs::create_dir_all(&dir).unwrap();
    let map: HashMap<&str, &str> = winners.iter().copied().collect();
    let body = serde_json::json!({ "winners": map });
    std::fs::write(
        dir.join(format!("week-{week}.json")),
        serde_json::to_string_pretty(&body).unwrap(),
    )
    .unwrap();
}

fn picks(entries: &[(&str, &str, u32)]) -> PickSet {
    entries
        .iter()
        .map(|&(game, team, confidence)| (game.to_string(), Pick::new(team, confidence)))
        .collect()
}

/// In-memory remote store so sync behavior can be exercised without a
/// network.
#[derive(Clone, Default)]
struct FakeRemote {
    records: Arc<Mutex<HashMap<String, PickRecord>>>,
    winners: Arc<Mutex<HashMap<String, WinnersMap>>>,
}

impl FakeRemote {
    fn seed(&self, user: &str, year: u16, week: u32, record: PickRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(format!("{year}/{week}/{user}"), record);
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn save_record(&self, user: &str, year: u16, week: u32, record: &PickRecord) -> bool {
        self.seed(user, year, week, record.clone());
        true
    }

    async fn load_record(&self, user: &str, year: u16, week: u32) -> Option<PickRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&format!("{year}/{week}/{user}"))
            .cloned()
    }

    async fn save_winners(&self, year: u16, week: u32, winners: &WinnersMap) -> bool {
        self.winners
            .lock()
            .unwrap()
            .insert(format!("{year}/{week}"), winners.clone());
        true
    }
}

// ===========================================================================
// Round trip and key partitioning
// ===========================================================================

#[tokio::test]
async fn picks_round_trip_through_the_store() {
    let dir = temp_dir("roundtrip");
    let app = build_app(&dir, RemoteSync::Disabled);

    let my_picks = picks(&[("G1", "Eagles", 2), ("G2", "Ravens", 1)]);
    assert!(app.save_picks("alice", 1, &my_picks).await.local);
    assert_eq!(app.load_picks("alice", 1).await, my_picks);

    // Other users and weeks stay untouched.
    assert!(app.load_picks("bob", 1).await.is_empty());
    assert!(app.load_picks("alice", 2).await.is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn store_round_trips_punctuated_names() {
    let store = PickStore::open(":memory:").unwrap();
    let set_a = picks(&[("G1", "Eagles", 1)]);
    let set_b = picks(&[("G1", "Cowboys", 2)]);

    assert!(store.save("A:1", 2025, 1, &set_a));
    assert!(store.save("A", 2025, 1, &set_b));
    assert_eq!(store.load("A:1", 2025, 1), set_a);
    assert_eq!(store.load("A", 2025, 1), set_b);
}

// ===========================================================================
// Merge semantics through the app
// ===========================================================================

#[tokio::test]
async fn newer_remote_copy_wins_on_load() {
    let dir = temp_dir("merge");
    let remote = FakeRemote::default();
    let newer = PickRecord::at(picks(&[("G1", "Cowboys", 2)]), "2099-01-01T00:00:00Z");
    remote.seed("alice", 2025, 1, newer.clone());

    let app = build_app(&dir, RemoteSync::Active(Box::new(remote)));
    app.save_picks("alice", 1, &picks(&[("G1", "Eagles", 2)])).await;

    assert_eq!(app.load_picks("alice", 1).await, newer.picks);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn merge_is_pure_and_idempotent() {
    let local = Some(PickRecord::at(
        picks(&[("G1", "Eagles", 1)]),
        "2025-09-07T12:00:00Z",
    ));
    let remote = Some(PickRecord::at(
        picks(&[("G1", "Cowboys", 1)]),
        "2025-09-07T13:00:00Z",
    ));

    let first = merge_records(local.clone(), remote.clone());
    let second = merge_records(local, remote);
    assert_eq!(first, second);

    let folded = merge_records(first.clone(), first.clone());
    assert_eq!(folded, first);
}

// ===========================================================================
// Scoring scenarios
// ===========================================================================

#[tokio::test]
async fn reference_scoring_scenario() {
    let dir = temp_dir("score_ref");
    publish_results(&dir, 1, &[("G1", "Eagles"), ("G2", "Chiefs")]);
    let app = build_app(&dir, RemoteSync::Disabled);

    app.save_picks("alice", 1, &picks(&[("G1", "Eagles", 10), ("G2", "Giants", 5)]))
        .await;

    let result = app.score_week("alice", 1).await;
    assert_eq!(result.actual_score, 10);
    assert_eq!(result.total_possible, 15);
    assert_eq!(result.correct_picks, 1);
    assert_eq!(result.total_picks, 2);
    assert_eq!(result.accuracy, 50.0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn scoring_with_no_saved_picks_does_not_error() {
    let dir = temp_dir("score_none");
    let app = build_app(&dir, RemoteSync::Disabled);

    let result = app.score_week("ghost", 1).await;
    assert_eq!(result.actual_score, 0);
    assert_eq!(result.total_picks, 0);
    assert!(!result.message.is_empty());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn games_without_results_score_zero_points() {
    let dir = temp_dir("score_pending");
    // Only G1 has a result; G2 is still pending.
    publish_results(&dir, 1, &[("G1", "Eagles")]);
    let app = build_app(&dir, RemoteSync::Disabled);

    app.save_picks("alice", 1, &picks(&[("G1", "Eagles", 2), ("G2", "Chiefs", 1)]))
        .await;

    let result = app.score_week("alice", 1).await;
    assert_eq!(result.actual_score, 2);
    assert_eq!(result.total_possible, 3);
    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Aggregation and leaderboard
// ===========================================================================

#[tokio::test]
async fn cumulative_score_is_additive_and_accuracy_pooled() {
    let dir = temp_dir("cumulative");
    publish_results(&dir, 1, &[("G1", "Eagles"), ("G2", "Chiefs")]);
    publish_results(&dir, 2, &[("G3", "Bills"), ("G4", "Lions")]);
    let app = build_app(&dir, RemoteSync::Disabled);

    // Week 1: 1 of 2 correct for 10. Week 2: 1 of 1 correct for 2.
    app.save_picks("alice", 1, &picks(&[("G1", "Eagles", 10), ("G2", "Ravens", 5)]))
        .await;
    app.save_picks("alice", 2, &picks(&[("G3", "Bills", 2)])).await;

    let cumulative = app.cumulative_score("alice", 2).await;
    assert_eq!(cumulative.total_score, 12);
    assert_eq!(cumulative.total_possible, 17);
    assert_eq!(cumulative.total_correct, 2);
    assert_eq!(cumulative.total_picks, 3);
    // Pooled accuracy is 2/3 = 66.67%. The mean of the per-week accuracies
    // (50% and 100%) would be 75% — the pooled figure is the spec'd one.
    assert_eq!(cumulative.overall_accuracy, 66.67);
    assert_eq!(cumulative.weekly_results.len(), 2);
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn leaderboard_orders_ties_by_name() {
    let dir = temp_dir("lb_ties");
    publish_results(&dir, 1, &[("G1", "Eagles"), ("G2", "Chiefs")]);
    let app = build_app(&dir, RemoteSync::Disabled);

    // A and B both score 30; C scores 10.
    app.save_picks("B", 1, &picks(&[("G1", "Eagles", 30)])).await;
    app.save_picks("A", 1, &picks(&[("G2", "Chiefs", 30)])).await;
    app.save_picks("C", 1, &picks(&[("G1", "Eagles", 10)])).await;

    let roster = data::parse_participants(r#"[ "C", "B", "A" ]"#);
    let standings = app.leaderboard(&roster, 1).await;

    let names: Vec<_> = standings.iter().map(|e| e.user_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Winners publishing round trip
// ===========================================================================

#[tokio::test]
async fn published_winners_feed_back_into_scoring() {
    let dir = temp_dir("publish");
    let remote = FakeRemote::default();
    let app = build_app(&dir, RemoteSync::Active(Box::new(remote.clone())));

    app.save_picks("alice", 2, &picks(&[("G3", "Bills", 2)])).await;

    let mut winners = WinnersMap::new();
    winners.insert("G3".into(), "Bills".into());
    let outcome = app.save_winners(2, &winners).await;
    assert!(outcome.local);
    assert_eq!(outcome.remote, Some(true));

    // The local results file now grades the picks.
    assert_eq!(app.score_week("alice", 2).await.actual_score, 2);
    // And the remote store received the same map.
    assert_eq!(
        remote.winners.lock().unwrap().get("2025/2").unwrap()["G3"],
        "Bills"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Debounced autosave
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn autosave_persists_only_the_last_edit_of_a_burst() {
    let dir = temp_dir("autosave");
    let app = build_app(&dir, RemoteSync::Disabled);
    let autosaver = Autosaver::new(Arc::clone(&app));

    for confidence in 1..=5 {
        autosaver.schedule("alice", 1, picks(&[("G1", "Eagles", confidence)]));
    }
    autosaver.flush().await;

    let saved = app.load_picks("alice", 1).await;
    assert_eq!(saved["G1"], Pick::new("Eagles", 5));
    let _ = std::fs::remove_dir_all(&dir);
}
