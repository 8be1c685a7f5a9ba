// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session middleware for Axum.
//!
//! Middleware counterpart of the extractors in `extractor.rs`, for applying
//! authentication to an entire router subtree:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/profile", get(profile))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_session));
//! ```
//!
//! Verified [`SessionClaims`](super::SessionClaims) are inserted into the
//! request extensions, where the `Auth` extractor and `Extension` pick them up.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::extractor::authenticate;
use crate::state::AppState;

/// Reject the request with 401 unless it carries a valid session token.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state.sessions) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => {
            warn!(
                path = %request.uri().path(),
                code = rejection.error_code(),
                "Rejected unauthenticated request"
            );
            rejection.into_response()
        }
    }
}

/// Attach session claims when a valid token is present; never rejects.
pub async fn optional_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state.sessions) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
        }
        Err(rejection) => {
            debug!(code = rejection.error_code(), "No session attached");
        }
    }
    next.run(request).await
}
