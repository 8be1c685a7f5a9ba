// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. Types derive `Serialize` / `Deserialize` and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: Stored user profiles
//! - **Auth**: Mini-app sign-in, profile completion, refresh and session checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{IdentityClaim, SessionClaims};

// =============================================================================
// Users
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Internal user ID
    pub id: i64,
    /// Username chosen on profile completion
    pub username: String,
    /// Platform user ID
    pub external_id: i64,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// `auth_date` of the init data used at registration
    pub auth_date: i64,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Identity used when issuing session tokens for this user.
    pub fn identity(&self) -> IdentityClaim {
        IdentityClaim {
            external_id: self.external_id,
            display_name: self.first_name.clone(),
            secondary_name: self.last_name.clone(),
            username: Some(self.username.clone()),
            avatar_ref: self.photo_url.clone(),
            issued_at: self.auth_date,
        }
    }
}

// =============================================================================
// Auth Requests
// =============================================================================

/// Request for `POST /v1/auth/miniapp`.
///
/// `initData` may instead be sent as `Authorization: tma <init data>`. The
/// identity fields are only read when unsigned development mode is enabled.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MiniAppAuthRequest {
    #[serde(default, rename = "initData")]
    pub init_data: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// Request for `POST /v1/auth/complete-profile`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CompleteProfileRequest {
    #[serde(default, rename = "initData")]
    pub init_data: Option<String>,
    /// Username to register
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

// =============================================================================
// Auth Responses
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MiniAppAuthResponse {
    /// True when the caller still has to complete their profile
    pub is_new_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_needs_refresh: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserRecord,
    pub token_valid: bool,
    pub token_needs_refresh: bool,
    /// Seconds until the current token expires
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WhoAmIResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl From<Option<SessionClaims>> for WhoAmIResponse {
    fn from(claims: Option<SessionClaims>) -> Self {
        match claims {
            Some(claims) => Self {
                authenticated: true,
                user_id: Some(claims.user_id),
                display_name: Some(claims.display_name),
            },
            None => Self {
                authenticated: false,
                user_id: None,
                display_name: None,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub session: SessionClaims,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

/// Per-user preferences. Every user gets the defaults for now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserSettings {
    pub theme: String,
    pub notifications: bool,
    pub language: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            notifications: true,
            language: "tr".to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub settings: UserSettings,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub user_id: i64,
    pub external_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Registration time, absent if the user record no longer exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_age_days: Option<i64>,
    /// Seconds until the current session token expires
    pub session_expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miniapp_request_reads_init_data_field() {
        let request: MiniAppAuthRequest =
            serde_json::from_str(r#"{"initData":"auth_date=1&signature=x"}"#).unwrap();
        assert_eq!(request.init_data.as_deref(), Some("auth_date=1&signature=x"));
        assert!(request.id.is_none());
    }

    #[test]
    fn miniapp_request_accepts_empty_body() {
        let request: MiniAppAuthRequest = serde_json::from_str("{}").unwrap();
        assert!(request.init_data.is_none());
    }

    #[test]
    fn new_user_response_omits_token_fields() {
        let response = MiniAppAuthResponse {
            is_new_user: true,
            user: None,
            token: None,
            token_needs_refresh: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"is_new_user":true}"#);
    }

    #[test]
    fn identity_uses_registered_username() {
        let user = UserRecord {
            id: 1,
            username: "ada_l".to_string(),
            external_id: 42,
            first_name: "Ada".to_string(),
            last_name: None,
            photo_url: None,
            auth_date: 1_700_000_000,
            created_at: Utc::now(),
        };

        let identity = user.identity();
        assert_eq!(identity.external_id, 42);
        assert_eq!(identity.username.as_deref(), Some("ada_l"));
        assert_eq!(identity.issued_at, 1_700_000_000);
    }

    #[test]
    fn default_settings() {
        let json = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "theme": "dark", "notifications": true, "language": "tr" })
        );
    }

    #[test]
    fn whoami_from_claims() {
        let anonymous = WhoAmIResponse::from(None);
        assert!(!anonymous.authenticated);

        let known = WhoAmIResponse::from(Some(SessionClaims {
            user_id: 3,
            external_id: 42,
            display_name: "Ada".to_string(),
            username: None,
            iat: 0,
            exp: 1,
        }));
        assert!(known.authenticated);
        assert_eq!(known.user_id, Some(3));
    }
}
