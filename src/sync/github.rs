// GitHub contents-API backed remote store.
//
// Pick records and published results live as JSON files in a repository:
//   data/picks/<year>/week-<week>/<user>.json
//   data/results/<year>/week-<week>.json
//
// The contents API requires the current file SHA for updates, so every
// write is read-then-write. A stale SHA (another writer got there first)
// comes back as a conflict; the write is retried with a fresh read a
// bounded number of times before giving up.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::WinnersMap;
use crate::picks::record::PickRecord;
use crate::sync::RemoteStore;

const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("poolbowl/", env!("CARGO_PKG_VERSION"));

/// How many read-then-write rounds to attempt when the remote SHA keeps
/// going stale under us.
const MAX_CONFLICT_RETRIES: u32 = 3;

/// GitHub contents-API client scoped to one repository and branch.
pub struct GithubStore {
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    branch: String,
    api_base: String,
}

/// The subset of a contents-API file response we care about.
#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
}

impl ContentsFile {
    /// The API transports file content base64-encoded with embedded
    /// newlines; strip the whitespace before decoding.
    fn decoded_content(&self) -> Option<String> {
        let compact: String = self.content.split_whitespace().collect();
        let bytes = BASE64.decode(compact).ok()?;
        String::from_utf8(bytes).ok()
    }
}

impl GithubStore {
    pub fn new(token: String, owner: String, repo: String, branch: String) -> Self {
        Self::with_api_base(token, owner, repo, branch, GITHUB_API_BASE.to_string())
    }

    /// Point the client at a non-default API host (GitHub Enterprise, or a
    /// local server in tests).
    pub fn with_api_base(
        token: String,
        owner: String,
        repo: String,
        branch: String,
        api_base: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
            owner,
            repo,
            branch,
            api_base,
        }
    }

    /// Remote path for a user's weekly picks file.
    pub fn picks_path(user: &str, year: u16, week: u32) -> String {
        format!(
            "data/picks/{year}/week-{week}/{}.json",
            escape_path_component(user.trim())
        )
    }

    /// Remote path for a week's published results file.
    pub fn results_path(year: u16, week: u32) -> String {
        format!("data/results/{year}/week-{week}.json")
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{path}",
            self.api_base, self.owner, self.repo
        )
    }

    /// Fetch the current file at `path`. `Ok(None)` means not-found, which
    /// is an expected state (first save, week not yet published).
    async fn fetch_existing(&self, path: &str) -> anyhow::Result<Option<ContentsFile>> {
        let response = self
            .http
            .get(self.contents_url(path))
            .header(header::AUTHORIZATION, format!("token {}", self.token))
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json().await?))
    }

    /// Create or update the file at `path` with read-before-write SHA
    /// handling and bounded conflict retries. Returns `false` on any
    /// failure; the caller treats that as "local copy retained".
    async fn put_file(&self, path: &str, content: &str, message: &str) -> bool {
        let encoded = BASE64.encode(content);

        for attempt in 1..=MAX_CONFLICT_RETRIES {
            let sha = match self.fetch_existing(path).await {
                Ok(existing) => existing.map(|file| file.sha),
                Err(e) => {
                    warn!("read-before-write failed for {path}: {e:#}");
                    return false;
                }
            };

            let mut body = serde_json::json!({
                "message": message,
                "content": &encoded,
                "branch": &self.branch,
            });
            if let Some(sha) = sha {
                body["sha"] = Value::String(sha);
            }

            let result = self
                .http
                .put(self.contents_url(path))
                .header(header::AUTHORIZATION, format!("token {}", self.token))
                .header(header::ACCEPT, GITHUB_ACCEPT)
                .header(header::USER_AGENT, USER_AGENT)
                .json(&body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    warn!("remote write failed for {path}: {e}");
                    return false;
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!("remote write succeeded for {path}");
                return true;
            }
            // 409 is the documented conflict status; in practice a stale
            // SHA also surfaces as 422. Both mean: re-read and try again.
            if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
                warn!(
                    "revision conflict writing {path} (attempt {attempt}/{MAX_CONFLICT_RETRIES})"
                );
                continue;
            }
            warn!("remote write failed for {path}: status {status}");
            return false;
        }

        warn!("remote write for {path} still conflicted after {MAX_CONFLICT_RETRIES} attempts");
        false
    }
}

#[async_trait]
impl RemoteStore for GithubStore {
    async fn save_record(&self, user: &str, year: u16, week: u32, record: &PickRecord) -> bool {
        let json = match serde_json::to_string_pretty(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize pick record for remote save: {e}");
                return false;
            }
        };
        let path = Self::picks_path(user, year, week);
        let message = format!("Save picks for {user} - Week {week} {year}");
        self.put_file(&path, &json, &message).await
    }

    async fn load_record(&self, user: &str, year: u16, week: u32) -> Option<PickRecord> {
        let path = Self::picks_path(user, year, week);
        let file = match self.fetch_existing(&path).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                debug!("no remote picks at {path}");
                return None;
            }
            Err(e) => {
                warn!("remote read failed for {path}: {e:#}");
                return None;
            }
        };

        let content = file.decoded_content()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("remote picks at {path} failed to parse: {e}");
                None
            }
        }
    }

    async fn save_winners(&self, year: u16, week: u32, winners: &WinnersMap) -> bool {
        let body = serde_json::json!({ "winners": winners });
        let json = match serde_json::to_string_pretty(&body) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize winners for remote save: {e}");
                return false;
            }
        };
        let path = Self::results_path(year, week);
        let message = format!("Update results for {year} Week {week}");
        self.put_file(&path, &json, &message).await
    }
}

/// Percent-escape characters that would change the meaning of a repository
/// path segment.
fn escape_path_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            '\\' => out.push_str("%5C"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            ' ' => out.push_str("%20"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests (against a local mock contents API)
// ---------------------------------------------------------------------------
