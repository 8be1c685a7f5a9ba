// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require a session token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims is SessionClaims
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use super::session::{extract_bearer, extract_credentials, SessionManager};
use super::{AuthRejection, IdentityClaim, SessionClaims};
use crate::state::AppState;

/// Authorization scheme carrying raw init data.
pub const INIT_DATA_SCHEME: &str = "tma";

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok())
}

/// Init data from an `Authorization: tma <payload>` header, if present.
pub fn init_data_from_headers(headers: &HeaderMap) -> Option<&str> {
    extract_credentials(authorization(headers), INIT_DATA_SCHEME)
}

/// Verify the bearer token carried by `headers`.
pub(crate) fn authenticate(
    headers: &HeaderMap,
    sessions: &SessionManager,
) -> Result<SessionClaims, AuthRejection> {
    let token = extract_bearer(authorization(headers)).ok_or(AuthRejection::NoToken)?;
    sessions.verify(token).map_err(AuthRejection::from)
}

/// Extractor requiring a valid session token.
///
/// Claims already attached by the session middleware are reused.
pub struct Auth(pub SessionClaims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>().cloned() {
            return Ok(Auth(claims));
        }

        let claims = authenticate(&parts.headers, &state.sessions)?;
        Ok(Auth(claims))
    }
}

/// Optional authentication extractor.
///
/// Yields `None` for anonymous callers and for tokens that fail to verify.
pub struct OptionalAuth(pub Option<SessionClaims>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(claims)) => Ok(OptionalAuth(Some(claims))),
            Err(rejection) => {
                debug!(code = rejection.error_code(), "Continuing without session");
                Ok(OptionalAuth(None))
            }
        }
    }
}

/// Extractor requiring verified init data in an `Authorization: tma` header.
pub struct InitDataAuth(pub IdentityClaim);

impl FromRequestParts<AppState> for InitDataAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = init_data_from_headers(&parts.headers).ok_or(AuthRejection::NoToken)?;
        let claim = state.verifier.verify(raw)?;
        Ok(InitDataAuth(claim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::init_data::sign_payload;
    use crate::auth::{AuthError, VerificationError};
    use crate::config::AuthMode;
    use crate::state::tests::{ada_claim, test_state, TEST_PLATFORM_SECRET};
    use axum::http::Request;
    use chrono::Utc;

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_requires_token() {
        let state = test_state(AuthMode::Strict);
        let mut parts = parts_with(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthRejection::NoToken)));
    }

    #[tokio::test]
    async fn auth_rejects_other_schemes() {
        let state = test_state(AuthMode::Strict);
        let mut parts = parts_with(Some("Basic dXNlcjpwYXNz"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthRejection::NoToken)));
    }

    #[tokio::test]
    async fn auth_succeeds_with_issued_token() {
        let state = test_state(AuthMode::Strict);
        let token = state.sessions.issue(&ada_claim(), 5).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));

        let Auth(claims) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(claims.user_id, 5);
        assert_eq!(claims.external_id, 42);
    }

    #[tokio::test]
    async fn auth_reports_expired_tokens() {
        let state = test_state(AuthMode::Strict);
        let long_ago = Utc::now().timestamp() - 2 * state.sessions.lifetime_secs();
        let token = state.sessions.issue_at(&ada_claim(), 5, long_ago).unwrap();
        let mut parts = parts_with(Some(&format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthRejection::Session(AuthError::Expired))));
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let state = test_state(AuthMode::Strict);
        let mut parts = parts_with(None);
        let claims = SessionClaims {
            user_id: 99,
            external_id: 1,
            display_name: "From middleware".to_string(),
            username: None,
            iat: 0,
            exp: 0,
        };
        parts.extensions.insert(claims);

        let Auth(found) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(found.user_id, 99);
    }

    #[tokio::test]
    async fn optional_auth_returns_none_without_token() {
        let state = test_state(AuthMode::Strict);
        let mut parts = parts_with(None);

        let OptionalAuth(claims) = OptionalAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(claims.is_none());
    }

    #[tokio::test]
    async fn optional_auth_swallows_invalid_token() {
        let state = test_state(AuthMode::Strict);
        let mut parts = parts_with(Some("Bearer forged.token.value"));

        let OptionalAuth(claims) = OptionalAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert!(claims.is_none());
    }

    #[tokio::test]
    async fn init_data_auth_verifies_header() {
        let state = test_state(AuthMode::Strict);
        let now = Utc::now().timestamp().to_string();
        let raw = sign_payload(
            &[("auth_date", &now), ("user", r#"{"id":42,"first_name":"Ada"}"#)],
            TEST_PLATFORM_SECRET,
        );
        let mut parts = parts_with(Some(&format!("tma {raw}")));

        let InitDataAuth(claim) = InitDataAuth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(claim.external_id, 42);
    }

    #[tokio::test]
    async fn init_data_auth_rejects_bad_signature() {
        let state = test_state(AuthMode::Strict);
        let now = Utc::now().timestamp().to_string();
        let raw = sign_payload(
            &[("auth_date", &now), ("user", r#"{"id":42,"first_name":"Ada"}"#)],
            "wrong-secret",
        );
        let mut parts = parts_with(Some(&format!("tma {raw}")));

        let result = InitDataAuth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(
            result,
            Err(AuthRejection::Verification(VerificationError::BadSignature))
        ));
    }
}
