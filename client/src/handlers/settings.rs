//! Sync configuration handlers.

use super::AppState;
use crate::error::Result;

/// Settings as shown to the user. The token itself is never shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    pub token_set: bool,
    pub repo: String,
    pub path: String,
    pub database_url: String,
    pub github_api: String,
}

/// Changes to the sync settings; `None` leaves a value as is.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    /// An empty token disables sync
    pub token: Option<String>,
    pub repo: Option<String>,
    pub path: Option<String>,
}

pub async fn handle_config_show(state: &AppState) -> Result<SettingsView> {
    let settings = state.store.load_sync_settings().await?;
    Ok(view(state, settings.is_enabled(), settings.repo, settings.path))
}

pub async fn handle_config_set(state: &AppState, update: SettingsUpdate) -> Result<SettingsView> {
    let settings = state
        .store
        .save_sync_settings(update.token, update.repo, update.path)
        .await?;
    state.reset_sync().await;
    tracing::info!(
        enabled = settings.is_enabled(),
        repo = %settings.repo,
        path = %settings.path,
        "Sync settings saved"
    );
    Ok(view(state, settings.is_enabled(), settings.repo, settings.path))
}

fn view(state: &AppState, token_set: bool, repo: String, path: String) -> SettingsView {
    SettingsView {
        token_set,
        repo,
        path,
        database_url: state.config.database_url.clone(),
        github_api: state.config.github_api.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_PATH};
    use crate::db::SqliteStore;

    #[tokio::test]
    async fn set_then_show() {
        let config = Config::from_vars(|_| None).unwrap();
        let state = AppState::new(config, SqliteStore::connect("sqlite::memory:").await.unwrap());

        let update = SettingsUpdate {
            token: Some("ghp_abc".into()),
            repo: Some("me/boeken".into()),
            path: None,
        };
        let saved = handle_config_set(&state, update).await.unwrap();

        assert!(saved.token_set);
        assert_eq!(saved.repo, "me/boeken");
        assert_eq!(saved.path, DEFAULT_PATH);
        assert_eq!(handle_config_show(&state).await.unwrap(), saved);
        assert!(state.sync_enabled().await.unwrap());

        let cleared = handle_config_set(
            &state,
            SettingsUpdate {
                token: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!cleared.token_set);
        assert_eq!(cleared.repo, "me/boeken");
    }
}
