// Pick and PickRecord data model.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One participant's choice for a single game: the team they expect to win
/// plus the confidence weight they staked on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub team: String,
    /// Confidence weight. Stored data from older clients sometimes carries
    /// this as a numeric string or omits it entirely; anything that isn't a
    /// non-negative integer deserializes to 0 rather than failing.
    #[serde(default, deserialize_with = "tolerant_confidence")]
    pub confidence: u32,
}

impl Pick {
    pub fn new(team: impl Into<String>, confidence: u32) -> Self {
        Self {
            team: team.into(),
            confidence,
        }
    }
}

/// A participant's picks for one week, keyed by game id.
pub type PickSet = HashMap<String, Pick>;

/// The whole-record unit of persistence for one `(user, year, week)` triple.
/// Replaced wholesale on every save; never patched field-by-field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickRecord {
    #[serde(default)]
    pub picks: PickSet,
    /// ISO-8601 save timestamp. Kept as the raw string so a record with a
    /// malformed timestamp still loads; the merge resolver treats an
    /// unparseable value the same as a missing one.
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl PickRecord {
    /// Build a record stamped with the current UTC time.
    pub fn now(picks: PickSet) -> Self {
        Self {
            picks,
            saved_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Build a record with an explicit timestamp string (tests, replays).
    pub fn at(picks: PickSet, saved_at: impl Into<String>) -> Self {
        Self {
            picks,
            saved_at: Some(saved_at.into()),
        }
    }

    /// Parse `saved_at` as an RFC 3339 timestamp. Returns `None` when the
    /// field is absent or unparseable.
    pub fn saved_at_time(&self) -> Option<DateTime<FixedOffset>> {
        self.saved_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    }
}

/// Deserialize a confidence value from whatever shape old stored data used:
/// a number, a numeric string, null, or nothing at all. Negative and
/// fractional values collapse to 0 — scoring treats confidence as a
/// non-negative integer and a bad value must never abort a load.
fn tolerant_confidence<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(confidence_from_value(value.as_ref()))
}

pub(crate) fn confidence_from_value(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
