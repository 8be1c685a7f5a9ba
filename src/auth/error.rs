// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! The verifier and session manager report domain errors
//! ([`VerificationError`], [`AuthError`]). The request guards wrap them in
//! [`AuthRejection`], which knows how to render itself as a 401 response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reasons an init payload is rejected by the signature verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Signature missing or not matching the payload
    #[error("Init data signature is invalid")]
    BadSignature,
    /// `auth_date` is older than the allowed maximum age
    #[error("Init data has expired")]
    Stale,
    /// Payload empty, or identity / timestamp fields missing or malformed
    #[error("Init data does not contain a valid identity")]
    MalformedIdentity,
}

/// Reasons a session token is rejected.
///
/// Decoding and signature failures are deliberately not told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Session token is invalid")]
    Invalid,
    #[error("Session token has expired")]
    Expired,
}

/// Failure to mint a session token.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Rejection produced by the request guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No credentials of the expected scheme were presented
    NoToken,
    /// A bearer token was presented but did not verify
    Session(AuthError),
    /// Init data was presented but did not verify
    Verification(VerificationError),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    code: &'static str,
}

impl AuthRejection {
    /// Machine-readable reason code sent to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthRejection::NoToken => "NO_TOKEN",
            AuthRejection::Session(AuthError::Invalid) => "INVALID_TOKEN",
            AuthRejection::Session(AuthError::Expired) => "TOKEN_EXPIRED",
            AuthRejection::Verification(VerificationError::BadSignature) => "BAD_SIGNATURE",
            AuthRejection::Verification(VerificationError::Stale) => "STALE",
            AuthRejection::Verification(VerificationError::MalformedIdentity) => {
                "MALFORMED_IDENTITY"
            }
        }
    }

    /// Get the HTTP status code for this rejection.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthRejection::NoToken => write!(f, "Authentication token required"),
            AuthRejection::Session(e) => write!(f, "{e}"),
            AuthRejection::Verification(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AuthRejection {}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        AuthRejection::Session(err)
    }
}

impl From<VerificationError> for AuthRejection {
    fn from(err: VerificationError) -> Self {
        AuthRejection::Verification(err)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            code: self.error_code(),
        });
        (self.status_code(), body).into_response()
    }
}
