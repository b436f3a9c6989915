// Remote synchronization of pick records.
//
// The remote store is strictly opportunistic: local persistence is always
// the source of truth, and every remote failure degrades to "saved locally
// only". Operations on an unconfigured adapter are no-ops that report
// failure/absence.

pub mod github;

use async_trait::async_trait;

use crate::config::Config;
use crate::data::WinnersMap;
use crate::picks::record::PickRecord;
use crate::sync::github::GithubStore;

/// A remote file-backed store for pick records and published results.
///
/// Implementations must never panic or surface transport errors to the
/// caller: failures are logged and reported as `false` / `None`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Write a record to the remote path for `(year, week, user)`.
    async fn save_record(&self, user: &str, year: u16, week: u32, record: &PickRecord) -> bool;

    /// Read the record for `(year, week, user)`, or `None` when absent or
    /// unreachable.
    async fn load_record(&self, user: &str, year: u16, week: u32) -> Option<PickRecord>;

    /// Publish the official winners for a week.
    async fn save_winners(&self, year: u16, week: u32, winners: &WinnersMap) -> bool;
}

/// High-level wrapper that is either an active remote store or disabled.
pub enum RemoteSync {
    /// Remote credentials are configured and the adapter is ready.
    Active(Box<dyn RemoteStore>),
    /// No usable credentials; all operations are no-ops.
    Disabled,
}

impl RemoteSync {
    /// Build a `RemoteSync` from the application config.
    ///
    /// Returns `Active` only when the GitHub token, owner, and repo are all
    /// present and non-empty.
    pub fn from_config(config: &Config) -> Self {
        match config.credentials.github() {
            Some((token, owner, repo)) => RemoteSync::Active(Box::new(GithubStore::new(
                token,
                owner,
                repo,
                config.branch.clone(),
            ))),
            None => RemoteSync::Disabled,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, RemoteSync::Active(_))
    }

    pub async fn save_record(
        &self,
        user: &str,
        year: u16,
        week: u32,
        record: &PickRecord,
    ) -> bool {
        match self {
            RemoteSync::Active(store) => store.save_record(user, year, week, record).await,
            RemoteSync::Disabled => false,
        }
    }

    pub async fn load_record(&self, user: &str, year: u16, week: u32) -> Option<PickRecord> {
        match self {
            RemoteSync::Active(store) => store.load_record(user, year, week).await,
            RemoteSync::Disabled => None,
        }
    }

    pub async fn save_winners(&self, year: u16, week: u32, winners: &WinnersMap) -> bool {
        match self {
            RemoteSync::Active(store) => store.save_winners(year, week, winners).await,
            RemoteSync::Disabled => false,
        }
    }
}
