// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mini-app init data verification.
//!
//! The platform hands the mini-app a query-string encoded payload
//! (`key=value&key=value...`) signed with the bot's shared secret:
//!
//! 1. The `signature` field is removed from the payload.
//! 2. The remaining pairs are sorted by key (byte order), rendered as
//!    `key=value` and joined with `\n` to form the check string.
//! 3. The HMAC key is `SHA-256(secret)`, not the raw secret.
//! 4. `HMAC-SHA256(key, check_string)` rendered as lowercase hex must equal
//!    the removed signature.
//!
//! After the signature holds, `auth_date` is checked for freshness and the
//! JSON `user` object is decoded into an [`IdentityClaim`].
//!
//! ## Duplicate keys
//!
//! When a key occurs more than once the last occurrence wins, both for the
//! check string and for field extraction.

use std::collections::BTreeMap;

use chrono::Utc;
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use super::claims::{IdentityClaim, PlatformUser};
use super::error::VerificationError;
use crate::config::SecretString;

/// Reserved field carrying the payload signature.
pub const SIGNATURE_FIELD: &str = "signature";

/// Field carrying the issuance timestamp (Unix seconds).
pub const AUTH_DATE_FIELD: &str = "auth_date";

/// Field carrying the JSON-encoded identity object.
pub const USER_FIELD: &str = "user";

/// Default maximum payload age (1 hour).
pub const DEFAULT_MAX_AGE_SECS: i64 = 3600;

type HmacSha256 = Hmac<Sha256>;

/// Parsed, still untrusted init payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitPayload {
    fields: BTreeMap<String, String>,
    signature: Option<String>,
}

impl InitPayload {
    /// Parse a query-string encoded payload.
    pub fn parse(raw: &str) -> Self {
        let mut payload = Self::default();
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            if key == SIGNATURE_FIELD {
                payload.signature = Some(value.into_owned());
            } else {
                payload.fields.insert(key.into_owned(), value.into_owned());
            }
        }
        payload
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.signature.is_none()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Canonical check string over every field except the signature.
    pub fn check_string(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compute the lowercase hex signature of a check string.
pub fn sign_check_string(check_string: &str, secret: &str) -> Result<String, InvalidLength> {
    let key = Sha256::digest(secret.as_bytes());
    let mut mac = HmacSha256::new_from_slice(&key)?;
    mac.update(check_string.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a raw init payload at time `now` (Unix seconds).
///
/// `now - auth_date` equal to `max_age_secs` is still fresh.
pub fn verify(
    raw: &str,
    secret: &str,
    max_age_secs: i64,
    now: i64,
) -> Result<IdentityClaim, VerificationError> {
    let payload = InitPayload::parse(raw);
    if payload.is_empty() {
        return Err(VerificationError::MalformedIdentity);
    }

    let provided = payload
        .signature()
        .ok_or(VerificationError::BadSignature)?;
    let expected = sign_check_string(&payload.check_string(), secret)
        .map_err(|_| VerificationError::BadSignature)?;
    if !bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        return Err(VerificationError::BadSignature);
    }

    let issued_at = payload
        .get(AUTH_DATE_FIELD)
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or(VerificationError::MalformedIdentity)?;
    if now.saturating_sub(issued_at) > max_age_secs {
        return Err(VerificationError::Stale);
    }

    let user: PlatformUser = payload
        .get(USER_FIELD)
        .and_then(|json| serde_json::from_str(json).ok())
        .ok_or(VerificationError::MalformedIdentity)?;

    IdentityClaim::from_platform_user(user, issued_at).ok_or(VerificationError::MalformedIdentity)
}

/// Init data verifier bound to the platform secret.
#[derive(Debug, Clone)]
pub struct InitDataVerifier {
    secret: SecretString,
    max_age_secs: i64,
}

impl InitDataVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            max_age_secs: DEFAULT_MAX_AGE_SECS,
        }
    }

    /// Override the maximum accepted payload age.
    pub fn with_max_age(mut self, max_age_secs: i64) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    pub fn max_age_secs(&self) -> i64 {
        self.max_age_secs
    }

    /// Verify against the wall clock.
    pub fn verify(&self, raw: &str) -> Result<IdentityClaim, VerificationError> {
        self.verify_at(raw, Utc::now().timestamp())
    }

    pub fn verify_at(&self, raw: &str, now: i64) -> Result<IdentityClaim, VerificationError> {
        verify(raw, self.secret.expose(), self.max_age_secs, now)
    }
}

/// Build a signed payload from `pairs`. Test-only counterpart of the platform.
#[cfg(test)]
pub(crate) fn sign_payload(pairs: &[(&str, &str)], secret: &str) -> String {
    let mut fields = BTreeMap::new();
    for (key, value) in pairs {
        fields.insert(key.to_string(), value.to_string());
    }
    let payload = InitPayload {
        fields,
        signature: None,
    };
    let signature = sign_check_string(&payload.check_string(), secret).unwrap();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.append_pair(SIGNATURE_FIELD, &signature);
    serializer.finish()
}
