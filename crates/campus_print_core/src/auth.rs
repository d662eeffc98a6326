//! crates/campus_print_core/src/auth.rs
//!
//! The auth session manager. Owns OTP issuance and verification plus the
//! password sign-in path, and issues the session tokens the rest of the
//! service trusts.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{AuthSession, AuthState, SessionToken};
use crate::ports::{CredentialStore, OtpMailer};
use crate::validation::{is_institutional_email, is_well_formed_otp};

/// How long an issued passcode stays valid unless configured otherwise.
pub const DEFAULT_OTP_VALIDITY_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Deliberately uniform: never says whether the email is registered.
    #[error("email or password did not match a registered account")]
    InvalidCredentials,
    #[error("email address is not on the institutional domain")]
    InvalidEmailDomain,
    #[error("no verification code is outstanding for this address")]
    NotPending,
    #[error("the verification code has expired")]
    Expired,
    #[error("the verification code did not match")]
    Mismatch,
    #[error("a verification code is exactly six digits")]
    Malformed,
    #[error("credential verification is unavailable: {0}")]
    StoreUnavailable(String),
}

/// Owns every `AuthSession`, keyed by lowercased email, plus the index of
/// live session tokens.
///
/// All session mutation happens under one mutex, so issuance for an address
/// is serialized against verification: a verify always checks the code that
/// is live at that instant, and a resend that lands first supersedes the old
/// code before the verify can read it.
pub struct AuthSessionManager {
    sessions: Mutex<HashMap<String, AuthSession>>,
    /// token -> email
    tokens: Mutex<HashMap<String, String>>,
    credentials: Arc<dyn CredentialStore>,
    mailer: Arc<dyn OtpMailer>,
    email_suffix: String,
    otp_validity: Duration,
}

impl AuthSessionManager {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        mailer: Arc<dyn OtpMailer>,
        email_suffix: impl Into<String>,
        otp_validity: Duration,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            tokens: Mutex::new(HashMap::new()),
            credentials,
            mailer,
            email_suffix: email_suffix.into(),
            otp_validity,
        }
    }

    /// Password sign-in: the direct `Unauthenticated -> SignedIn` edge.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        let email = normalize(email);
        let matched = self
            .credentials
            .verify_credentials(&email, password)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        if !matched {
            return Err(AuthError::InvalidCredentials);
        }

        let mut sessions = self.sessions.lock();
        let entry = sessions
            .entry(email.clone())
            .or_insert_with(|| AuthSession::new(&email));
        entry.clear_otp();
        entry.state = AuthState::SignedIn;
        info!(email = %email, "password sign-in succeeded");
        Ok(self.issue_token(&email))
    }

    /// Issues a fresh six-digit code for an institutional address and hands
    /// it to the mail sink. A delivery failure is reported but never rolls
    /// back the stored code; resending always regenerates.
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        if !is_institutional_email(email, &self.email_suffix) {
            return Err(AuthError::InvalidEmailDomain);
        }
        let email = normalize(email);
        let code = generate_code();
        let issued_at = Utc::now();
        {
            let mut sessions = self.sessions.lock();
            let entry = sessions
                .entry(email.clone())
                .or_insert_with(|| AuthSession::new(&email));
            entry.state = AuthState::OtpPending;
            entry.issued_otp = Some(code.clone());
            entry.otp_issued_at = Some(issued_at);
            entry.otp_expires_at = Some(issued_at + self.otp_validity);
        }

        // The guard is dropped before awaiting the sink.
        if let Err(e) = self.mailer.deliver_otp(&email, &code).await {
            warn!(email = %email, "OTP delivery failed, code remains valid: {e}");
        }
        Ok(())
    }

    /// Equivalent to `request_otp`; the previous code is superseded, never
    /// resent.
    pub async fn resend_otp(&self, email: &str) -> Result<(), AuthError> {
        self.request_otp(email).await
    }

    /// Consumes an outstanding code. Success is single-use: the code is
    /// invalidated and a session token is returned.
    pub fn verify_otp(&self, email: &str, code: &str) -> Result<SessionToken, AuthError> {
        if !is_well_formed_otp(code) {
            return Err(AuthError::Malformed);
        }
        let email = normalize(email);

        let mut sessions = self.sessions.lock();
        let entry = sessions.get_mut(&email).ok_or(AuthError::NotPending)?;
        if entry.state != AuthState::OtpPending {
            return Err(AuthError::NotPending);
        }
        let Some(issued) = entry.issued_otp.clone() else {
            // An expired code was already cleared; the flow must restart.
            return Err(AuthError::NotPending);
        };
        let expires_at = entry.otp_expires_at.ok_or(AuthError::NotPending)?;
        if Utc::now() > expires_at {
            entry.clear_otp();
            return Err(AuthError::Expired);
        }
        if issued != code {
            // The code stays live for another attempt until it expires.
            return Err(AuthError::Mismatch);
        }

        entry.clear_otp();
        // Verified exists only as the instant between acceptance and token
        // issuance; the same call completes sign-in.
        entry.state = AuthState::Verified;
        entry.state = AuthState::SignedIn;
        info!(email = %email, "OTP verified, session signed in");
        Ok(self.issue_token(&email))
    }

    /// The student started over with a different address: the old session
    /// returns to `Unauthenticated` and its code is dropped.
    pub fn change_email(&self, email: &str) {
        let email = normalize(email);
        if let Some(entry) = self.sessions.lock().get_mut(&email) {
            entry.reset();
        }
    }

    /// Ends the session behind a token. Idempotent.
    pub fn sign_out(&self, token: &str) {
        let email = self.tokens.lock().remove(token);
        if let Some(email) = email {
            if let Some(entry) = self.sessions.lock().get_mut(&email) {
                entry.reset();
            }
            info!(email = %email, "signed out");
        }
    }

    /// Resolves a bearer token to the email it authenticates.
    pub fn validate_token(&self, token: &str) -> Option<String> {
        self.tokens.lock().get(token).cloned()
    }

    /// Snapshot of a session, mainly for diagnostics and tests.
    pub fn session(&self, email: &str) -> Option<AuthSession> {
        self.sessions.lock().get(&normalize(email)).cloned()
    }

    fn issue_token(&self, email: &str) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        self.tokens.lock().insert(token.clone(), email.to_string());
        SessionToken::new(token)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    format!("{:06}", rng.random_range(0..1_000_000u32))
}
