// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use relational_miniapp_auth::{
    api::router,
    config::{AppConfig, AuthMode, Environment, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(config.log_format);

    let auth_mode = config.auth_mode();
    if config.allow_unsigned_requested && auth_mode == AuthMode::Strict {
        warn!(
            environment = ?config.environment,
            "AUTH_ALLOW_UNSIGNED ignored outside development, init data stays mandatory"
        );
    }
    if auth_mode == AuthMode::AllowUnsigned {
        warn!("Unsigned mini-app identities are accepted. Never run this mode in production");
    }

    let state = AppState::from_config(&config);
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    info!(
        %addr,
        auth_mode = auth_mode.as_str(),
        production = config.environment == Environment::Production,
        token_lifetime_secs = config.token_lifetime_secs,
        init_data_max_age_secs = config.init_data_max_age_secs,
        "Mini-app auth server listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
