//! crates/campus_print_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the external collaborators the
//! core talks to. These traits form the boundary of the hexagonal
//! architecture, keeping the core independent of credential stores, mail
//! relays and print hardware.

use async_trait::async_trait;

use crate::domain::PrintJob;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the external services.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Credential storage and verification for the password sign-in path. The
/// core only orchestrates the check; how accounts are stored is not its
/// concern.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// True iff the pair matches a registered account. Implementations must
    /// answer `Ok(false)` for unknown addresses rather than erroring, so
    /// callers cannot distinguish them from a wrong password.
    async fn verify_credentials(&self, email: &str, password: &str) -> PortResult<bool>;
}

/// The notification sink that carries one-time passcodes to students.
/// Delivery (and any retry policy) is entirely the implementation's problem.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn deliver_otp(&self, email: &str, code: &str) -> PortResult<()>;
}

/// Hands a processing job over to the physical fulfillment backend.
#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    async fn dispatch(&self, job: &PrintJob) -> PortResult<()>;
}
