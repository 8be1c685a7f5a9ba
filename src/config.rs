// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`AppConfig`] loaded once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TELEGRAM_BOT_TOKEN` | Platform secret used to verify init data | Required |
//! | `SESSION_SECRET` | Secret used to sign session tokens | Required |
//! | `SESSION_TTL_SECS` | Session token lifetime | `604800` (7 days) |
//! | `SESSION_REFRESH_THRESHOLD_SECS` | Remaining lifetime below which clients should refresh | `86400` (24 hours) |
//! | `INIT_DATA_MAX_AGE_SECS` | Maximum age of init data | `3600` |
//! | `APP_ENV` | `production` or `development` | `production` |
//! | `AUTH_ALLOW_UNSIGNED` | Accept unsigned identities (development only) | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::sync::Arc;

use crate::auth::init_data::DEFAULT_MAX_AGE_SECS;
use crate::auth::session::{DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_TOKEN_LIFETIME_SECS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Shared secret of the platform integration (bot token).
///
/// Only the init data verifier reads it.
pub const PLATFORM_SECRET_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Secret for signing session tokens. Must differ from the platform secret.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const REFRESH_THRESHOLD_ENV: &str = "SESSION_REFRESH_THRESHOLD_SECS";
pub const INIT_DATA_MAX_AGE_ENV: &str = "INIT_DATA_MAX_AGE_SECS";
pub const APP_ENV_ENV: &str = "APP_ENV";

/// Development-only switch for accepting identities without init data.
///
/// Ignored unless `APP_ENV=development`.
pub const ALLOW_UNSIGNED_ENV: &str = "AUTH_ALLOW_UNSIGNED";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Secret material that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Arc<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([redacted])")
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// How the boundary treats requests that carry no init data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Init data is always required
    Strict,
    /// Identity fields from the request body are accepted without a signature
    AllowUnsigned,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Strict => "strict",
            AuthMode::AllowUnsigned => "allow_unsigned",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("SESSION_SECRET must differ from TELEGRAM_BOT_TOKEN")]
    SharedSecretReuse,

    #[error("refresh threshold ({threshold}s) must be shorter than the token lifetime ({lifetime}s)")]
    RefreshWindow { threshold: i64, lifetime: i64 },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub platform_secret: SecretString,
    pub session_secret: SecretString,
    pub token_lifetime_secs: i64,
    pub refresh_threshold_secs: i64,
    pub init_data_max_age_secs: i64,
    pub environment: Environment,
    /// Raw `AUTH_ALLOW_UNSIGNED` value; see [`AppConfig::auth_mode`].
    pub allow_unsigned_requested: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());

        let platform_secret = get(PLATFORM_SECRET_ENV).ok_or(ConfigError::Missing(PLATFORM_SECRET_ENV))?;
        let session_secret = get(SESSION_SECRET_ENV).ok_or(ConfigError::Missing(SESSION_SECRET_ENV))?;
        if platform_secret == session_secret {
            return Err(ConfigError::SharedSecretReuse);
        }

        let port = match get(PORT_ENV) {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let token_lifetime_secs = parse_seconds(get(SESSION_TTL_ENV), SESSION_TTL_ENV, DEFAULT_TOKEN_LIFETIME_SECS)?;
        if token_lifetime_secs == 0 {
            return Err(ConfigError::Invalid {
                name: SESSION_TTL_ENV,
                value: "0".to_string(),
            });
        }
        let refresh_threshold_secs = parse_seconds(
            get(REFRESH_THRESHOLD_ENV),
            REFRESH_THRESHOLD_ENV,
            DEFAULT_REFRESH_THRESHOLD_SECS,
        )?;
        if refresh_threshold_secs >= token_lifetime_secs {
            return Err(ConfigError::RefreshWindow {
                threshold: refresh_threshold_secs,
                lifetime: token_lifetime_secs,
            });
        }
        let init_data_max_age_secs =
            parse_seconds(get(INIT_DATA_MAX_AGE_ENV), INIT_DATA_MAX_AGE_ENV, DEFAULT_MAX_AGE_SECS)?;

        let environment = match get(APP_ENV_ENV).map(|v| v.trim().to_lowercase()) {
            None => Environment::Production,
            Some(v) if v == "production" || v == "prod" => Environment::Production,
            Some(v) if v == "development" || v == "dev" => Environment::Development,
            Some(value) => return Err(ConfigError::Invalid { name: APP_ENV_ENV, value }),
        };

        let allow_unsigned_requested = match get(ALLOW_UNSIGNED_ENV) {
            None => false,
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: ALLOW_UNSIGNED_ENV,
                value,
            })?,
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|v| v.trim().to_lowercase()) {
            None => LogFormat::Pretty,
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(value) => return Err(ConfigError::Invalid { name: LOG_FORMAT_ENV, value }),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            platform_secret: SecretString::new(platform_secret),
            session_secret: SecretString::new(session_secret),
            token_lifetime_secs,
            refresh_threshold_secs,
            init_data_max_age_secs,
            environment,
            allow_unsigned_requested,
            log_format,
        })
    }

    /// Effective auth mode.
    ///
    /// Unsigned identities are only ever accepted in development.
    pub fn auth_mode(&self) -> AuthMode {
        if self.allow_unsigned_requested && self.environment == Environment::Development {
            AuthMode::AllowUnsigned
        } else {
            AuthMode::Strict
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_seconds(value: Option<String>, name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => match value.trim().parse::<i64>() {
            Ok(secs) if secs >= 0 => Ok(secs),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const SECRETS: [(&str, &str); 2] = [
        (PLATFORM_SECRET_ENV, "123:bot-token"),
        (SESSION_SECRET_ENV, "session-secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&SECRETS).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.token_lifetime_secs, 7 * 24 * 3600);
        assert_eq!(config.refresh_threshold_secs, 24 * 3600);
        assert_eq!(config.init_data_max_age_secs, 3600);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth_mode(), AuthMode::Strict);
    }

    #[test]
    fn secrets_are_required() {
        assert_eq!(
            load(&[(SESSION_SECRET_ENV, "x")]).unwrap_err(),
            ConfigError::Missing(PLATFORM_SECRET_ENV)
        );
        assert_eq!(
            load(&[(PLATFORM_SECRET_ENV, "x")]).unwrap_err(),
            ConfigError::Missing(SESSION_SECRET_ENV)
        );
    }

    #[test]
    fn secrets_must_differ() {
        let err = load(&[(PLATFORM_SECRET_ENV, "same"), (SESSION_SECRET_ENV, "same")]).unwrap_err();
        assert_eq!(err, ConfigError::SharedSecretReuse);
    }

    #[test]
    fn refresh_threshold_must_be_shorter_than_lifetime() {
        let mut vars = SECRETS.to_vec();
        vars.push((SESSION_TTL_ENV, "3600"));
        vars.push((REFRESH_THRESHOLD_ENV, "3600"));
        assert!(matches!(load(&vars), Err(ConfigError::RefreshWindow { .. })));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push((INIT_DATA_MAX_AGE_ENV, "-5"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: INIT_DATA_MAX_AGE_ENV, .. })
        ));
    }

    #[test]
    fn allow_unsigned_needs_development_environment() {
        let mut vars = SECRETS.to_vec();
        vars.push((ALLOW_UNSIGNED_ENV, "true"));
        let config = load(&vars).unwrap();
        assert!(config.allow_unsigned_requested);
        assert_eq!(config.auth_mode(), AuthMode::Strict);

        vars.push((APP_ENV_ENV, "development"));
        assert_eq!(load(&vars).unwrap().auth_mode(), AuthMode::AllowUnsigned);
    }

    #[test]
    fn development_alone_stays_strict() {
        let mut vars = SECRETS.to_vec();
        vars.push((APP_ENV_ENV, "development"));
        assert_eq!(load(&vars).unwrap().auth_mode(), AuthMode::Strict);
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let config = load(&SECRETS).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("bot-token"));
        assert!(!debug.contains("session-secret"));
        assert!(debug.contains("[redacted]"));
    }
}
