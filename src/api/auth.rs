// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mini-app sign-in and session endpoints.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::PlatformUser, extractor::init_data_from_headers, Auth, AuthRejection,
        IdentityClaim, InitDataAuth, OptionalAuth,
    },
    config::AuthMode,
    error::ApiError,
    models::{
        CompleteProfileRequest, MiniAppAuthRequest, MiniAppAuthResponse, SessionResponse,
        TokenResponse, WhoAmIResponse,
    },
    state::AppState,
};

/// Maximum username length in characters.
const MAX_USERNAME_LEN: usize = 50;

/// Identity fields sent in a request body, only honoured in unsigned mode.
struct UnsignedIdentity {
    id: Option<i64>,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    photo_url: Option<String>,
}

impl UnsignedIdentity {
    fn into_claim(self, now: i64) -> Result<IdentityClaim, ApiError> {
        let id = self
            .id
            .ok_or_else(|| ApiError::bad_request("Platform user id is required"))?;
        let user = PlatformUser {
            id,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name,
            username: self.username,
            photo_url: self.photo_url,
        };
        IdentityClaim::from_platform_user(user, now)
            .ok_or_else(|| ApiError::bad_request("First name is required"))
    }
}

fn verify_init_data(state: &AppState, raw: &str) -> Result<IdentityClaim, ApiError> {
    state.verifier.verify(raw).map_err(|err| {
        let rejection = AuthRejection::from(err);
        warn!(code = rejection.error_code(), "Init data rejected");
        ApiError::from(rejection)
    })
}

/// Resolve the caller's identity from init data (header first, then body).
///
/// Without init data, body fields are accepted only in unsigned mode; in
/// strict mode the missing payload is rejected like an empty one.
fn resolve_identity(
    state: &AppState,
    headers: &HeaderMap,
    body_init_data: Option<&str>,
    unsigned: UnsignedIdentity,
) -> Result<IdentityClaim, ApiError> {
    let init_data = init_data_from_headers(headers)
        .or(body_init_data.map(str::trim).filter(|raw| !raw.is_empty()));

    match (init_data, state.auth_mode) {
        (Some(raw), _) => verify_init_data(state, raw),
        (None, AuthMode::AllowUnsigned) => {
            warn!("Accepting unsigned identity (development mode)");
            unsigned.into_claim(Utc::now().timestamp())
        }
        (None, AuthMode::Strict) => verify_init_data(state, ""),
    }
}

/// Sign in from the mini-app.
///
/// The JSON body is optional when init data comes in the `tma` header.
///
/// Known users get their profile refreshed and a session token; unknown
/// users are told to complete their profile first.
#[utoipa::path(
    post,
    path = "/v1/auth/miniapp",
    request_body = MiniAppAuthRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Sign-in result", body = MiniAppAuthResponse),
        (status = 400, description = "Identity fields missing (unsigned mode)"),
        (status = 401, description = "Init data rejected"),
    )
)]
pub async fn miniapp(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<MiniAppAuthRequest>>,
) -> Result<Json<MiniAppAuthResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let MiniAppAuthRequest {
        init_data,
        id,
        first_name,
        last_name,
        username,
        photo_url,
    } = request;
    let unsigned = UnsignedIdentity {
        id,
        first_name,
        last_name,
        username,
        photo_url,
    };
    let claim = resolve_identity(&state, &headers, init_data.as_deref(), unsigned)?;

    let updated = state.users.write().await.update_profile(&claim);
    let Some(user) = updated else {
        info!(external_id = claim.external_id, "New platform user, profile completion required");
        return Ok(Json(MiniAppAuthResponse {
            is_new_user: true,
            user: None,
            token: None,
            token_needs_refresh: None,
        }));
    };

    let token = state.sessions.issue(&user.identity(), user.id)?;
    info!(user_id = user.id, external_id = user.external_id, "Mini-app sign-in");

    Ok(Json(MiniAppAuthResponse {
        is_new_user: false,
        user: Some(user),
        token: Some(token.into_string()),
        token_needs_refresh: Some(false),
    }))
}

/// Register a new user with a chosen username.
#[utoipa::path(
    post,
    path = "/v1/auth/complete-profile",
    request_body = CompleteProfileRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Username or identity fields missing"),
        (status = 401, description = "Init data rejected"),
        (status = 409, description = "Username or platform account already registered"),
    )
)]
pub async fn complete_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<CompleteProfileRequest>>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let CompleteProfileRequest {
        init_data,
        username,
        id,
        first_name,
        last_name,
        photo_url,
    } = request;

    let username = username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("Username is required"))?;
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }

    let unsigned = UnsignedIdentity {
        id,
        first_name,
        last_name,
        username: None,
        photo_url,
    };
    let claim = resolve_identity(&state, &headers, init_data.as_deref(), unsigned)?;

    let user = state
        .users
        .write()
        .await
        .insert(&claim, &username)
        .map_err(|err| {
            warn!(external_id = claim.external_id, error = %err, "Profile completion rejected");
            ApiError::from(err)
        })?;

    let token = state.sessions.issue(&user.identity(), user.id)?;
    info!(user_id = user.id, external_id = user.external_id, "Registered user");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: token.into_string(),
            user,
        }),
    ))
}

/// Rotate the caller's session token.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New session token", body = TokenResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "User no longer exists"),
    )
)]
pub async fn refresh(
    Auth(claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state
        .users
        .read()
        .await
        .find_by_id(claims.user_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let token = state.sessions.issue(&user.identity(), user.id)?;
    info!(user_id = user.id, "Session refreshed");

    Ok(Json(TokenResponse {
        token: token.into_string(),
        user,
    }))
}

/// Current session information.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session details", body = SessionResponse),
        (status = 401, description = "Missing, invalid or expired token"),
        (status = 404, description = "User no longer exists"),
    )
)]
pub async fn session(
    Auth(claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = state
        .users
        .read()
        .await
        .find_by_id(claims.user_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let now = Utc::now().timestamp();
    Ok(Json(SessionResponse {
        user,
        token_valid: true,
        token_needs_refresh: claims.needs_refresh_at(now, state.sessions.refresh_threshold_secs()),
        expires_in: claims.remaining_at(now),
    }))
}

/// Identify the caller if they present a valid token.
#[utoipa::path(
    get,
    path = "/v1/auth/whoami",
    tag = "Auth",
    responses((status = 200, description = "Caller identity", body = WhoAmIResponse))
)]
pub async fn whoami(OptionalAuth(claims): OptionalAuth) -> Json<WhoAmIResponse> {
    Json(claims.into())
}

/// Retired login widget endpoint.
#[utoipa::path(
    post,
    path = "/v1/auth/telegram",
    tag = "Auth",
    responses((status = 410, description = "Login widget authentication is retired"))
)]
pub async fn legacy_widget() -> ApiError {
    ApiError::gone("Login widget authentication is no longer supported, use the mini-app sign-in")
}

/// Echo the verified identity of `Authorization: tma` init data.
#[utoipa::path(
    get,
    path = "/v1/debug/init-data",
    tag = "Auth",
    responses(
        (status = 200, description = "Verified identity", body = IdentityClaim),
        (status = 401, description = "Init data missing or rejected"),
    )
)]
pub async fn debug_init_data(InitDataAuth(claim): InitDataAuth) -> Json<IdentityClaim> {
    Json(claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::init_data::sign_payload;
    use crate::state::tests::{test_state, TEST_PLATFORM_SECRET};

    fn unsigned(id: Option<i64>, first_name: Option<&str>) -> UnsignedIdentity {
        UnsignedIdentity {
            id,
            first_name: first_name.map(str::to_string),
            last_name: None,
            username: None,
            photo_url: None,
        }
    }

    fn ada_init_data() -> String {
        sign_payload(
            &[
                ("auth_date", &Utc::now().timestamp().to_string()),
                ("user", r#"{"id":42,"first_name":"Ada"}"#),
            ],
            TEST_PLATFORM_SECRET,
        )
    }

    #[test]
    fn strict_mode_rejects_missing_init_data() {
        let state = test_state(AuthMode::Strict);
        let err = resolve_identity(&state, &HeaderMap::new(), None, unsigned(Some(1), Some("Eve")))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, Some("MALFORMED_IDENTITY"));
    }

    #[test]
    fn unsigned_mode_accepts_body_identity() {
        let state = test_state(AuthMode::AllowUnsigned);
        let claim =
            resolve_identity(&state, &HeaderMap::new(), Some("  "), unsigned(Some(1), Some("Eve")))
                .unwrap();
        assert_eq!(claim.external_id, 1);
        assert_eq!(claim.display_name, "Eve");
    }

    #[test]
    fn unsigned_mode_requires_identity_fields() {
        let state = test_state(AuthMode::AllowUnsigned);
        let no_id = resolve_identity(&state, &HeaderMap::new(), None, unsigned(None, Some("Eve")));
        let no_name = resolve_identity(&state, &HeaderMap::new(), None, unsigned(Some(1), None));
        assert_eq!(no_id.unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(no_name.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unsigned_mode_still_verifies_presented_init_data() {
        let state = test_state(AuthMode::AllowUnsigned);
        let forged = ada_init_data().replace("signature=", "signature=00");
        let err = resolve_identity(&state, &HeaderMap::new(), Some(&forged), unsigned(Some(1), Some("Eve")))
            .unwrap_err();
        assert_eq!(err.code, Some("BAD_SIGNATURE"));
    }

    #[test]
    fn header_init_data_takes_precedence() {
        let state = test_state(AuthMode::Strict);
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("tma {}", ada_init_data()).parse().unwrap(),
        );

        let claim = resolve_identity(&state, &headers, Some("garbage"), unsigned(None, None)).unwrap();
        assert_eq!(claim.external_id, 42);
    }
}
