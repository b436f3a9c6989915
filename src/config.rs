// Configuration loading and parsing (pool.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolSettings,
    pub credentials: CredentialsConfig,
    pub db_path: String,
    pub data_paths: DataPaths,
    /// Branch remote writes are committed to.
    pub branch: String,
}

// ---------------------------------------------------------------------------
// pool.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire pool.toml file.
#[derive(Debug, Clone, Deserialize)]
struct PoolFile {
    pool: PoolSettings,
    database: DatabaseSection,
    data: DataPaths,
    #[serde(default)]
    sync: SyncSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSettings {
    pub name: String,
    pub year: u16,
    /// Number of weeks in the season.
    pub weeks: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub schedule: String,
    pub results_dir: String,
    pub participants: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SyncSection {
    branch: String,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub github_token: Option<String>,
    pub github_owner: Option<String>,
    pub github_repo: Option<String>,
}

impl CredentialsConfig {
    /// The `(token, owner, repo)` triple when all three are present and
    /// non-empty; remote sync stays disabled otherwise.
    pub fn github(&self) -> Option<(String, String, String)> {
        let token = self.github_token.as_deref().filter(|s| !s.is_empty())?;
        let owner = self.github_owner.as_deref().filter(|s| !s.is_empty())?;
        let repo = self.github_repo.as_deref().filter(|s| !s.is_empty())?;
        Some((token.to_string(), owner.to_string(), repo.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/pool.toml` and, when present,
/// `config/credentials.toml` under `base_dir`. Does not copy defaults;
/// `load_config()` layers that on top.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- pool.toml (required) ---
    let pool_path = config_dir.join("pool.toml");
    let pool_text = read_file(&pool_path)?;
    let pool_file: PoolFile = toml::from_str(&pool_text).map_err(|e| ConfigError::ParseError {
        path: pool_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        pool: pool_file.pool,
        credentials,
        db_path: pool_file.database.path,
        data_paths: pool_file.data,
        branch: pool_file.sync.branch,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` with any file from `defaults/` that isn't there yet
/// (`.example` templates excluded). Returns the paths that were copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "no defaults/ or config/ directory under {}; \
                     run from the project root",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        let Some(file_name) = path.file_name().filter(|_| path.is_file()) else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        if target.exists() {
            continue;
        }
        std::fs::copy(&path, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", path.display(), target.display()),
        })?;
        copied.push(target);
    }

    Ok(copied)
}

/// Load config relative to the current working directory, seeding
/// `config/` from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.pool.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "pool.name".into(),
            message: "must not be empty".into(),
        });
    }

    if config.pool.weeks == 0 {
        return Err(ConfigError::ValidationError {
            field: "pool.weeks".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.pool.year < 1970 {
        return Err(ConfigError::ValidationError {
            field: "pool.year".into(),
            message: format!("must be a plausible year, got {}", config.pool.year),
        });
    }

    if config.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
