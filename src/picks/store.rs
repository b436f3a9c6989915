// SQLite persistence for pick records.
//
// Stand-in for the browser's local storage: a single key-value table holding
// one JSON record per (user, year, week). The public contract never returns
// an error — storage failures are logged and reported as `false` / empty,
// so scoring and the CLI degrade instead of crashing.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::picks::record::{PickRecord, PickSet};

/// Leading namespace segment of every record key.
const NAMESPACE: &str = "picks";

/// SQLite-backed key-value store for pick records.
pub struct PickStore {
    conn: Mutex<Connection>,
}

impl PickStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral store (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open pick store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set pick store pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pick_records (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create pick store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("pick store mutex poisoned")
    }

    /// Derive the storage key for a `(user, year, week)` triple, or `None`
    /// when the arguments are unusable (blank user, week 0).
    ///
    /// The user name is the only caller-controlled component, so it is
    /// percent-escaped: without that, a user named `A:1` could collide with
    /// other keys once the components are joined with `:`.
    pub fn record_key(user: &str, year: u16, week: u32) -> Option<String> {
        let user = user.trim();
        if user.is_empty() || week == 0 {
            return None;
        }
        Some(format!(
            "{NAMESPACE}:{year}:{week}:{}",
            escape_key_component(user)
        ))
    }

    /// Persist `picks` under `(user, year, week)`, stamped with the current
    /// time. Returns `false` on invalid arguments or storage failure.
    pub fn save(&self, user: &str, year: u16, week: u32, picks: &PickSet) -> bool {
        self.save_record(user, year, week, &PickRecord::now(picks.clone()))
    }

    /// Persist a fully-formed record (whole-record replacement).
    pub fn save_record(&self, user: &str, year: u16, week: u32, record: &PickRecord) -> bool {
        let Some(key) = Self::record_key(user, year, week) else {
            warn!(user, week, "refusing to save picks under an invalid key");
            return false;
        };
        match self.try_save(&key, record) {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save picks under {key}: {e:#}");
                false
            }
        }
    }

    /// Load the picks for `(user, year, week)`. Returns an empty set when no
    /// record exists, the arguments are invalid, or the stored JSON fails to
    /// parse.
    pub fn load(&self, user: &str, year: u16, week: u32) -> PickSet {
        self.load_record(user, year, week)
            .map(|record| record.picks)
            .unwrap_or_default()
    }

    /// Load the full record, or `None` when absent or unreadable.
    pub fn load_record(&self, user: &str, year: u16, week: u32) -> Option<PickRecord> {
        let key = Self::record_key(user, year, week)?;
        match self.try_load(&key) {
            Ok(record) => record,
            Err(e) => {
                warn!("failed to load picks under {key}: {e:#}");
                None
            }
        }
    }

    /// Remove the record for `(user, year, week)`. Returns `true` whether or
    /// not a record existed; `false` only on invalid arguments or storage
    /// failure.
    pub fn clear(&self, user: &str, year: u16, week: u32) -> bool {
        let Some(key) = Self::record_key(user, year, week) else {
            return false;
        };
        let result = self
            .conn()
            .execute("DELETE FROM pick_records WHERE key = ?1", params![key]);
        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("failed to clear picks under {key}: {e:#}");
                false
            }
        }
    }

    fn try_save(&self, key: &str, record: &PickRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("failed to serialize pick record")?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO pick_records (key, value) VALUES (?1, ?2)",
                params![key, json],
            )
            .context("failed to write pick record")?;
        Ok(())
    }

    fn try_load(&self, key: &str) -> Result<Option<PickRecord>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM pick_records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query pick record")?;

        match json {
            Some(json) => {
                let record = serde_json::from_str(&json)
                    .context("failed to deserialize pick record")?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

/// Percent-escape `%` and `:` so a user name can never break out of its key
/// segment. Everything else passes through untouched.
fn escape_key_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            _ => out.push(ch),
        }
    }
    out
}
