// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{InitDataVerifier, SessionManager};
use crate::config::{AppConfig, AuthMode};
use crate::store::InMemoryUserStore;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<InitDataVerifier>,
    pub sessions: Arc<SessionManager>,
    pub auth_mode: AuthMode,
    pub users: Arc<RwLock<InMemoryUserStore>>,
}

impl AppState {
    pub fn new(verifier: InitDataVerifier, sessions: SessionManager, auth_mode: AuthMode) -> Self {
        Self {
            verifier: Arc::new(verifier),
            sessions: Arc::new(sessions),
            auth_mode,
            users: Arc::new(RwLock::new(InMemoryUserStore::new())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let verifier = InitDataVerifier::new(config.platform_secret.clone())
            .with_max_age(config.init_data_max_age_secs);
        let sessions = SessionManager::new(&config.session_secret)
            .with_lifetime(config.token_lifetime_secs)
            .with_refresh_threshold(config.refresh_threshold_secs);
        Self::new(verifier, sessions, config.auth_mode())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::IdentityClaim;
    use crate::config::SecretString;

    pub(crate) const TEST_PLATFORM_SECRET: &str = "123456:test-bot-token";
    pub(crate) const TEST_SESSION_SECRET: &str = "test-session-secret";

    pub(crate) fn test_state(auth_mode: AuthMode) -> AppState {
        AppState::new(
            InitDataVerifier::new(SecretString::new(TEST_PLATFORM_SECRET)),
            SessionManager::new(&SecretString::new(TEST_SESSION_SECRET)),
            auth_mode,
        )
    }

    pub(crate) fn ada_claim() -> IdentityClaim {
        IdentityClaim {
            external_id: 42,
            display_name: "Ada".to_string(),
            secondary_name: None,
            username: None,
            avatar_ref: None,
            issued_at: 0,
        }
    }

    #[test]
    fn from_config_applies_auth_settings() {
        let config = AppConfig::from_lookup(|name| match name {
            "TELEGRAM_BOT_TOKEN" => Some("bot".to_string()),
            "SESSION_SECRET" => Some("session".to_string()),
            "SESSION_TTL_SECS" => Some("7200".to_string()),
            "SESSION_REFRESH_THRESHOLD_SECS" => Some("600".to_string()),
            "INIT_DATA_MAX_AGE_SECS" => Some("120".to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::from_config(&config);
        assert_eq!(state.sessions.lifetime_secs(), 7200);
        assert_eq!(state.sessions.refresh_threshold_secs(), 600);
        assert_eq!(state.verifier.max_age_secs(), 120);
        assert_eq!(state.auth_mode, AuthMode::Strict);
    }
}
