// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints behind the `require_session` middleware.

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::{
    auth::SessionClaims,
    models::{DashboardResponse, ProfileResponse, SettingsResponse, UserSettings},
    state::AppState,
};

/// The caller's session claims and stored profile.
#[utoipa::path(
    get,
    path = "/v1/protected/profile",
    tag = "Protected",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or expired token"),
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
) -> Json<ProfileResponse> {
    let user = state.users.read().await.find_by_id(session.user_id).cloned();
    Json(ProfileResponse { session, user })
}

#[utoipa::path(
    get,
    path = "/v1/protected/settings",
    tag = "Protected",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller settings", body = SettingsResponse),
        (status = 401, description = "Missing, invalid or expired token"),
    )
)]
pub async fn settings(Extension(session): Extension<SessionClaims>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        user_id: session.user_id,
        username: session.username,
        settings: UserSettings::default(),
    })
}

/// Account summary for the mini-app home screen.
#[utoipa::path(
    get,
    path = "/v1/protected/dashboard",
    tag = "Protected",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller dashboard", body = DashboardResponse),
        (status = 401, description = "Missing, invalid or expired token"),
    )
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<SessionClaims>,
) -> Json<DashboardResponse> {
    let now = Utc::now();
    let member_since = state
        .users
        .read()
        .await
        .find_by_id(session.user_id)
        .map(|user| user.created_at);

    Json(DashboardResponse {
        user_id: session.user_id,
        external_id: session.external_id,
        member_since,
        account_age_days: member_since.map(|since| (now - since).num_days()),
        session_expires_in: session.remaining_at(now.timestamp()),
        username: session.username,
    })
}
