//! services/api/src/error.rs
//!
//! The top-level error type of the `api` service. Everything that can stop
//! the server from starting or serving converges here.

use crate::config::ConfigError;
use campus_print_core::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment did not yield a usable configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One of the core's external collaborators failed.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Socket binding or another OS-level failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything that has no more specific variant.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}
