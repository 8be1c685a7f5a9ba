// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        middleware::{optional_session, require_session},
        IdentityClaim, SessionClaims,
    },
    models::{
        CompleteProfileRequest, DashboardResponse, MiniAppAuthRequest, MiniAppAuthResponse,
        ProfileResponse, SessionResponse, SettingsResponse, TokenResponse, UserRecord,
        UserSettings, WhoAmIResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod protected;

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/profile", get(protected::profile))
        .route("/settings", get(protected::settings))
        .route("/dashboard", get(protected::dashboard))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    // Claims attached here are picked up by `OptionalAuth`.
    let session_aware_routes = Router::new()
        .route("/auth/whoami", get(auth::whoami))
        .route_layer(from_fn_with_state(state.clone(), optional_session));

    let v1_routes = Router::new()
        .route("/auth/miniapp", post(auth::miniapp))
        .route("/auth/complete-profile", post(auth::complete_profile))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/session", get(auth::session))
        .route("/auth/telegram", post(auth::legacy_widget))
        .merge(session_aware_routes)
        .route("/debug/init-data", get(auth::debug_init_data))
        .nest("/protected", protected_routes)
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::miniapp,
        auth::complete_profile,
        auth::refresh,
        auth::session,
        auth::whoami,
        auth::legacy_widget,
        auth::debug_init_data,
        protected::profile,
        protected::settings,
        protected::dashboard,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            IdentityClaim,
            SessionClaims,
            UserRecord,
            MiniAppAuthRequest,
            MiniAppAuthResponse,
            CompleteProfileRequest,
            TokenResponse,
            SessionResponse,
            WhoAmIResponse,
            ProfileResponse,
            SettingsResponse,
            UserSettings,
            DashboardResponse,
            health::ReadyResponse,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Mini-app sign-in and sessions"),
        (name = "Protected", description = "Endpoints requiring a session token"),
        (name = "Health", description = "Liveness and readiness")
    )
)]
struct ApiDoc;
