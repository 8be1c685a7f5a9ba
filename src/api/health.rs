// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::{auth::IdentityClaim, state::AppState};

/// Readiness report.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// `ok`, or `degraded` when session tokens cannot be minted
    pub status: String,
    pub auth_mode: String,
    /// `ok` when a probe token signs and verifies
    pub session_signing: String,
    pub registered_users: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn probe_identity() -> IdentityClaim {
    IdentityClaim {
        external_id: 0,
        display_name: "health-probe".to_string(),
        secondary_name: None,
        username: None,
        avatar_ref: None,
        issued_at: 0,
    }
}

/// Round-trip a probe token through the session manager.
fn session_signing_ok(state: &AppState) -> bool {
    let token = match state.sessions.issue(&probe_identity(), 0) {
        Ok(token) => token,
        Err(err) => {
            error!(error = %err, "Health probe could not sign a session token");
            return false;
        }
    };
    state.sessions.verify(token.as_str()).is_ok()
}

/// Readiness: reports auth mode and whether session signing works.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Ready", body = ReadyResponse),
        (status = 503, description = "Session signing unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let signing_ok = session_signing_ok(&state);
    let registered_users = state.users.read().await.len();

    let status = if signing_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let report = ReadyResponse {
        status: if signing_ok { "ok" } else { "degraded" }.to_string(),
        auth_mode: state.auth_mode.as_str().to_string(),
        session_signing: if signing_ok { "ok" } else { "failing" }.to_string(),
        registered_users,
    };
    (status, Json(report))
}

/// Liveness: 200 while the process runs.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Alive", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
