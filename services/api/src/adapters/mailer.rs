//! services/api/src/adapters/mailer.rs
//!
//! This module contains the notification-sink adapter for OTP delivery.
//! Actual email dispatch belongs to the campus mail relay; this adapter
//! stands in for it during development and logs the handoff instead.

use async_trait::async_trait;
use tracing::info;

use campus_print_core::ports::{OtpMailer, PortResult};

/// An `OtpMailer` that writes the passcode to the log instead of sending
/// mail. Useful for local development and tests; swap it for a real relay
/// adapter in production.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OtpMailer for LogMailer {
    async fn deliver_otp(&self, email: &str, code: &str) -> PortResult<()> {
        info!(email = %email, code = %code, "OTP handed to mail sink");
        Ok(())
    }
}
