//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

use campus_print_core::validation::{DEFAULT_EMAIL_SUFFIX, DEFAULT_MAX_UPLOAD_BYTES};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// Domain suffix an address must carry to receive an OTP.
    pub email_suffix: String,
    /// Per-file upload ceiling, in bytes.
    pub max_upload_bytes: u64,
    /// Validity window of an issued OTP, in minutes.
    pub otp_validity_minutes: i64,
    /// How often the fulfillment worker polls the queue, in milliseconds.
    pub worker_poll_ms: u64,
    pub cors_origin: String,
    /// Optional `email:password` pairs registered at startup for the
    /// password sign-in path.
    pub seed_accounts: Vec<(String, String)>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure
    /// tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let email_suffix =
            std::env::var("EMAIL_SUFFIX").unwrap_or_else(|_| DEFAULT_EMAIL_SUFFIX.to_string());

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let otp_validity_minutes = parse_var("OTP_VALIDITY_MINUTES", 10i64)?;
        let worker_poll_ms = parse_var("WORKER_POLL_MS", 500u64)?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let seed_accounts = match std::env::var("SEED_ACCOUNTS") {
            Ok(raw) => parse_seed_accounts(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            bind_address,
            log_level,
            email_suffix,
            max_upload_bytes,
            otp_validity_minutes,
            worker_poll_ms,
            cors_origin,
            seed_accounts,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// `SEED_ACCOUNTS` is a comma-separated list of `email:password` pairs.
fn parse_seed_accounts(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            pair.split_once(':')
                .map(|(email, password)| (email.trim().to_string(), password.to_string()))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SEED_ACCOUNTS".to_string(),
                        format!("'{}' is not an email:password pair", pair),
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_accounts_parse() {
        let accounts =
            parse_seed_accounts("riya@college.edu:hunter2, dev@college.edu:pw").unwrap();
        assert_eq!(
            accounts,
            vec![
                ("riya@college.edu".to_string(), "hunter2".to_string()),
                ("dev@college.edu".to_string(), "pw".to_string()),
            ]
        );
        assert!(parse_seed_accounts("").unwrap().is_empty());
        assert!(parse_seed_accounts("no-colon-here").is_err());
    }
}
