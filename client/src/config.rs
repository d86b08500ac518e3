//! Configuration management for the client.
//!
//! Process settings come from environment variables (after `.env` is loaded).
//! The user's sync settings live in the local settings table.

use std::env;
use std::fmt;
use std::time::Duration;

/// Default SQLite location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://boeklog.db";

/// Default contents API base URL.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Default repository holding the sync file.
pub const DEFAULT_REPO: &str = "czvr6nbsz2-dev/filmlog";

/// Default path of the sync file inside the repository.
pub const DEFAULT_PATH: &str = "boeklog/data/boeken.json";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// Base URL of the GitHub API
    pub github_api: String,
    /// Timeout for each HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            non_empty(var("BOEKLOG_DATABASE_URL")).unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let github_api =
            non_empty(var("BOEKLOG_GITHUB_API")).unwrap_or_else(|| DEFAULT_GITHUB_API.into());
        if !github_api.starts_with("http://") && !github_api.starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(github_api));
        }
        let github_api = github_api.trim_end_matches('/').to_string();

        let http_timeout = match non_empty(var("BOEKLOG_HTTP_TIMEOUT_SECS")) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            github_api,
            http_timeout: Duration::from_secs(http_timeout),
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOEKLOG_GITHUB_API must start with http:// or https://, got {0:?}")]
    InvalidApiUrl(String),

    #[error("Invalid BOEKLOG_HTTP_TIMEOUT_SECS value: {0:?}")]
    InvalidTimeout(String),
}

/// The user's sync settings, as stored in the settings table.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Bearer token; sync is disabled without one
    pub token: Option<String>,
    /// Repository as `owner/name`
    pub repo: String,
    /// File path inside the repository
    pub path: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            token: None,
            repo: DEFAULT_REPO.to_string(),
            path: DEFAULT_PATH.to_string(),
        }
    }
}

impl SyncSettings {
    /// Build settings from stored values, applying defaults.
    pub fn from_stored(token: Option<String>, repo: Option<String>, path: Option<String>) -> Self {
        Self {
            token: non_empty(token),
            repo: non_empty(repo).unwrap_or_else(|| DEFAULT_REPO.to_string()),
            path: non_empty(path).unwrap_or_else(|| DEFAULT_PATH.to_string()),
        }
    }

    /// Whether sync can run at all.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncSettings")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("repo", &self.repo)
            .field("path", &self.path)
            .finish()
    }
}

/// Trim a value and treat empty as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
