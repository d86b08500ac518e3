//! GitHub contents API backend.

use super::{RemoteContent, RemoteStore, VersionToken};
use crate::config::{Config, SyncSettings};
use crate::error::SyncError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Commit message used for every sync write.
pub const COMMIT_MESSAGE: &str = "BoekLog sync";

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("boeklog/", env!("CARGO_PKG_VERSION"));

/// Everything needed to reach the sync file.
#[derive(Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    pub repo: String,
    pub path: String,
    pub token: String,
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Combine process config and user settings.
    ///
    /// Fails with `NotConfigured` when no token is set.
    pub fn from_settings(config: &Config, settings: &SyncSettings) -> Result<Self, SyncError> {
        let token = settings.token.clone().ok_or(SyncError::NotConfigured)?;
        Ok(Self {
            api_base: config.github_api.clone(),
            repo: settings.repo.clone(),
            path: settings.path.clone(),
            token,
            timeout: config.http_timeout,
        })
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The sync file in a GitHub repository.
#[derive(Clone)]
pub struct GitHubStore {
    client: reqwest::Client,
    url: String,
    token: String,
    location: String,
}

impl GitHubStore {
    pub fn new(config: GitHubConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let path = config.path.trim_matches('/');
        let url = format!(
            "{}/repos/{}/contents/{}",
            config.api_base.trim_end_matches('/'),
            config.repo,
            path
        );

        Ok(Self {
            client,
            url,
            token: config.token,
            location: format!("{}:{}", config.repo, path),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Turn a failed response into a sync error, preferring the API's message.
fn api_error(status: StatusCode, body: &str, context: &str) -> SyncError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|payload| payload.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("{} ({})", context, status.as_u16()));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SyncError::Unauthorized(message),
        _ => SyncError::Network(message),
    }
}

/// A stale sha answers 409. A create without sha on a file that appeared
/// since the pull answers 422; both mean the remote moved.
fn push_error(status: StatusCode, body: &str, creating: bool) -> SyncError {
    match status {
        StatusCode::CONFLICT => SyncError::VersionConflict,
        StatusCode::UNPROCESSABLE_ENTITY if creating => SyncError::VersionConflict,
        _ => api_error(status, body, "GitHub push error"),
    }
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn fetch(&self) -> Result<Option<RemoteContent>, SyncError> {
        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(location = %self.location, "Remote file does not exist yet");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body, "GitHub error"));
        }

        let payload = response.json::<ContentsResponse>().await?;
        Ok(Some(RemoteContent {
            content: payload.content,
            version: VersionToken::new(payload.sha),
        }))
    }

    async fn store(
        &self,
        content: &str,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        let body = PutRequest {
            message: COMMIT_MESSAGE,
            content,
            sha: expected.map(VersionToken::as_str),
        };

        let response = self
            .client
            .put(&self.url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(push_error(status, &body, expected.is_none()));
        }

        let payload = response.json::<PutResponse>().await?;
        Ok(VersionToken::new(payload.content.sha))
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
