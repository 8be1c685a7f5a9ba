// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user directory.
//!
//! Users are keyed by internal ID, with a secondary index on the platform
//! user ID. Usernames and platform IDs are unique.

use std::collections::HashMap;

use chrono::Utc;

use crate::auth::IdentityClaim;
use crate::models::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Platform account {0} is already registered")]
    ExternalIdTaken(i64),
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: HashMap<i64, UserRecord>,
    by_external_id: HashMap<i64, i64>,
    last_id: i64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn find_by_id(&self, id: i64) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    pub fn find_by_external_id(&self, external_id: i64) -> Option<&UserRecord> {
        self.by_external_id
            .get(&external_id)
            .and_then(|id| self.users.get(id))
    }

    /// Refresh the platform-owned profile fields of an existing user.
    ///
    /// Returns the updated record, or `None` if the platform account is unknown.
    pub fn update_profile(&mut self, claim: &IdentityClaim) -> Option<UserRecord> {
        let id = *self.by_external_id.get(&claim.external_id)?;
        let user = self.users.get_mut(&id)?;
        user.first_name = claim.display_name.clone();
        user.last_name = claim.secondary_name.clone();
        user.photo_url = claim.avatar_ref.clone();
        Some(user.clone())
    }

    /// Register a new user for a verified identity.
    pub fn insert(&mut self, claim: &IdentityClaim, username: &str) -> Result<UserRecord, StoreError> {
        if self.by_external_id.contains_key(&claim.external_id) {
            return Err(StoreError::ExternalIdTaken(claim.external_id));
        }
        if self.users.values().any(|u| u.username == username) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }

        self.last_id += 1;
        let user = UserRecord {
            id: self.last_id,
            username: username.to_string(),
            external_id: claim.external_id,
            first_name: claim.display_name.clone(),
            last_name: claim.secondary_name.clone(),
            photo_url: claim.avatar_ref.clone(),
            auth_date: claim.issued_at,
            created_at: Utc::now(),
        };
        self.by_external_id.insert(user.external_id, user.id);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}
