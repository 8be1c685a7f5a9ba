// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity and session claims.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verified identity extracted from platform init data.
///
/// Only produced by a successful init data verification (or by the
/// development-only unsigned mode). Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityClaim {
    /// Platform user ID
    pub external_id: i64,
    /// Platform first name
    pub display_name: String,
    /// Platform last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_name: Option<String>,
    /// Platform handle, if the user has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Profile photo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
    /// `auth_date` of the payload (Unix seconds)
    pub issued_at: i64,
}

/// The `user` object as the platform encodes it inside init data.
#[derive(Debug, Deserialize)]
pub(crate) struct PlatformUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl IdentityClaim {
    /// Build a claim from the platform user object.
    ///
    /// Returns `None` when the first name is blank. Empty optional fields
    /// are normalized to `None`.
    pub(crate) fn from_platform_user(user: PlatformUser, issued_at: i64) -> Option<Self> {
        if user.first_name.trim().is_empty() {
            return None;
        }

        Some(Self {
            external_id: user.id,
            display_name: user.first_name,
            secondary_name: non_empty(user.last_name),
            username: non_empty(user.username),
            avatar_ref: non_empty(user.photo_url),
            issued_at,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Claims carried by a session token.
///
/// This is also what the request guards attach to the request context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    /// Internal user ID
    pub user_id: i64,
    /// Platform user ID
    pub external_id: i64,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expires at (Unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Seconds left before expiry; negative once expired.
    pub fn remaining_at(&self, now: i64) -> i64 {
        self.exp.saturating_sub(now)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.exp
    }

    /// Whether less than `threshold_secs` of lifetime remains.
    pub fn needs_refresh_at(&self, now: i64, threshold_secs: i64) -> bool {
        self.remaining_at(now) < threshold_secs
    }
}
