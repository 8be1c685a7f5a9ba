// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuing and verification.
//!
//! Session tokens are HS256 JWTs signed with the service's own secret. A
//! token moves through `valid → refresh-eligible → expired` purely as a
//! function of its signed `exp` claim; nothing is stored server-side.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{IdentityClaim, SessionClaims};
use super::error::{AuthError, SessionError};
use crate::config::SecretString;

/// Default token lifetime (7 days).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Default refresh threshold (24 hours).
pub const DEFAULT_REFRESH_THRESHOLD_SECS: i64 = 24 * 60 * 60;

const BEARER_SCHEME: &str = "Bearer";

/// Opaque bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mints and checks session tokens.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
    refresh_threshold_secs: i64,
}

impl SessionManager {
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation,
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
            refresh_threshold_secs: DEFAULT_REFRESH_THRESHOLD_SECS,
        }
    }

    pub fn with_lifetime(mut self, lifetime_secs: i64) -> Self {
        self.lifetime_secs = lifetime_secs;
        self
    }

    pub fn with_refresh_threshold(mut self, threshold_secs: i64) -> Self {
        self.refresh_threshold_secs = threshold_secs;
        self
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    pub fn refresh_threshold_secs(&self) -> i64 {
        self.refresh_threshold_secs
    }

    /// Issue a token for `user_id` carrying the identity of `claim`.
    pub fn issue(&self, claim: &IdentityClaim, user_id: i64) -> Result<SessionToken, SessionError> {
        self.issue_at(claim, user_id, Utc::now().timestamp())
    }

    pub fn issue_at(
        &self,
        claim: &IdentityClaim,
        user_id: i64,
        now: i64,
    ) -> Result<SessionToken, SessionError> {
        let claims = SessionClaims {
            user_id,
            external_id: claim.external_id,
            display_name: claim.display_name.clone(),
            username: claim.username.clone(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(SessionToken(token))
    }

    /// Verify signature and expiry against the wall clock.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature, then expiry. A token is expired from `exp` onwards.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<SessionClaims, AuthError> {
        let claims = self.decode_claims(token)?;
        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    /// Whether the client should rotate `token` now.
    ///
    /// Tokens that fail to decode also need refreshing: the client has to
    /// re-authenticate either way.
    pub fn needs_refresh(&self, token: &str) -> bool {
        self.needs_refresh_at(token, Utc::now().timestamp())
    }

    pub fn needs_refresh_at(&self, token: &str, now: i64) -> bool {
        match self.decode_claims(token) {
            Ok(claims) => claims.needs_refresh_at(now, self.refresh_threshold_secs),
            Err(_) => true,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Invalid)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .field("refresh_threshold_secs", &self.refresh_threshold_secs)
            .finish_non_exhaustive()
    }
}

/// Extract the token from a `Bearer <token>` authorization header value.
///
/// Any other scheme, an empty token or a missing header yields `None`.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    extract_credentials(header, BEARER_SCHEME)
}

/// Extract the credentials of `<scheme> <credentials>` if the scheme matches.
pub fn extract_credentials<'a>(header: Option<&'a str>, scheme: &str) -> Option<&'a str> {
    let (found, credentials) = header?.split_once(' ')?;
    if found != scheme {
        return None;
    }
    let credentials = credentials.trim();
    (!credentials.is_empty()).then_some(credentials)
}
