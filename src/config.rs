// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! typed [`Config`] loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HMAC signing secret (at least 32 bytes) | Required |
//! | `JWT_TTL_SECS` | Access token lifetime in seconds (at most 30 days) | `86400` |
//! | `JWT_ALGORITHM` | `HS256`, `HS384` or `HS512` | `HS256` |
//! | `FRN_SERVICE` | Service segment of generated FRNs | `flashdash` |
//! | `PUBLIC_PATH_PREFIXES` | Comma-separated unauthenticated path prefixes | `/health,/v1/auth/,/docs,/api-doc` |
//! | `DATA_DIR` | Directory of the redb credential database | In-memory store |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Plain HTTP |
//! | `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD` | Admin account created at startup | None |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the token signing secret.
///
/// The secret is process-wide, read once at startup and never mutated.
/// There is no built-in fallback: a missing secret aborts startup.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_TTL_ENV: &str = "JWT_TTL_SECS";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const FRN_SERVICE_ENV: &str = "FRN_SERVICE";
pub const PUBLIC_PATHS_ENV: &str = "PUBLIC_PATH_PREFIXES";

/// Environment variable name for the credential database directory.
///
/// When unset the server runs with an in-memory credential store and every
/// account disappears on restart.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const TLS_CERT_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_ENV: &str = "TLS_KEY_PATH";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Default access token lifetime (24 hours).
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted access token lifetime (30 days).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default service segment used in `frn:<service>:...` identifiers.
pub const DEFAULT_FRN_SERVICE: &str = "flashdash";

/// Paths that bypass the authorization gate unless overridden.
pub const DEFAULT_PUBLIC_PATH_PREFIXES: &[&str] = &["/health", "/v1/auth/", "/docs", "/api-doc"];

/// Minimum accepted signing secret length in bytes (HS256 key size).
pub const MIN_SECRET_LEN: usize = 32;

pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// PEM files used to terminate TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Credentials of the administrator account created at startup.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Fully resolved runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub jwt_algorithm: Algorithm,
    pub frn_service: String,
    pub public_path_prefixes: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub tls: Option<TlsPaths>,
    pub seed_admin: Option<SeedAdmin>,
    pub log_format: LogFormat,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_ttl", &self.token_ttl)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("frn_service", &self.frn_service)
            .field("public_path_prefixes", &self.public_path_prefixes)
            .field("data_dir", &self.data_dir)
            .field("tls", &self.tls)
            .field("seed_admin", &self.seed_admin)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map of variables.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars
            .get(HOST_ENV)
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match vars.get(PORT_ENV) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = vars
            .get(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET_ENV.to_string()))?
            .clone();

        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::invalid(
                JWT_SECRET_ENV,
                format!(
                    "expected at least {MIN_SECRET_LEN} bytes, got {}",
                    jwt_secret.len()
                ),
            ));
        }

        let token_ttl = match vars.get(JWT_TTL_ENV) {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|e| ConfigError::invalid(JWT_TTL_ENV, e.to_string()))?;
                if secs == 0 {
                    return Err(ConfigError::invalid(JWT_TTL_ENV, "must be positive"));
                }
                let ttl = Duration::from_secs(secs);
                if ttl > MAX_TOKEN_TTL {
                    return Err(ConfigError::invalid(
                        JWT_TTL_ENV,
                        format!("must be at most {} seconds", MAX_TOKEN_TTL.as_secs()),
                    ));
                }
                ttl
            }
            None => DEFAULT_TOKEN_TTL,
        };

        let jwt_algorithm = match vars.get(JWT_ALGORITHM_ENV).map(|s| s.to_uppercase()) {
            None => Algorithm::HS256,
            Some(alg) => match alg.as_str() {
                "HS256" => Algorithm::HS256,
                "HS384" => Algorithm::HS384,
                "HS512" => Algorithm::HS512,
                other => {
                    return Err(ConfigError::invalid(
                        JWT_ALGORITHM_ENV,
                        format!("unsupported algorithm {other} (expected HS256, HS384 or HS512)"),
                    ))
                }
            },
        };

        let frn_service = vars
            .get(FRN_SERVICE_ENV)
            .cloned()
            .unwrap_or_else(|| DEFAULT_FRN_SERVICE.to_string());

        if frn_service.is_empty()
            || !frn_service
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ConfigError::invalid(
                FRN_SERVICE_ENV,
                "must be lowercase ASCII letters and digits",
            ));
        }

        let public_path_prefixes = match vars.get(PUBLIC_PATHS_ENV) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_PUBLIC_PATH_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        };

        let data_dir = vars
            .get(DATA_DIR_ENV)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let tls = match (vars.get(TLS_CERT_ENV), vars.get(TLS_KEY_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar(TLS_KEY_ENV.to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar(TLS_CERT_ENV.to_string())),
        };

        let seed_admin = match (
            vars.get(SEED_ADMIN_EMAIL_ENV),
            vars.get(SEED_ADMIN_PASSWORD_ENV),
        ) {
            (Some(email), Some(password)) => Some(SeedAdmin {
                email: email.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    SEED_ADMIN_PASSWORD_ENV.to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(SEED_ADMIN_EMAIL_ENV.to_string()))
            }
        };

        let log_format = match vars.get(LOG_FORMAT_ENV).map(|s| s.to_lowercase()) {
            Some(f) if f == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            host,
            port,
            jwt_secret,
            token_ttl,
            jwt_algorithm,
            frn_service,
            public_path_prefixes,
            data_dir,
            tls,
            seed_admin,
            log_format,
        })
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
