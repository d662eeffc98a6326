//! crates/campus_print_core/src/domain.rs
//!
//! Defines the pure, core data structures for the print service.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::validation::AssetRejection;

//=========================================================================================
// Authentication
//=========================================================================================

/// Where an email-keyed session currently sits in the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// A one-time passcode has been issued and not yet consumed.
    OtpPending,
    /// The passcode was accepted; collapses into `SignedIn` in the same call.
    Verified,
    SignedIn,
}

/// One authentication session, keyed by its lowercased email address.
///
/// `issued_otp` is `Some` only while `state` is `OtpPending`; it is cleared
/// on successful verification and when expiry is detected.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub email: String,
    pub state: AuthState,
    pub issued_otp: Option<String>,
    pub otp_issued_at: Option<DateTime<Utc>>,
    pub otp_expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            state: AuthState::Unauthenticated,
            issued_otp: None,
            otp_issued_at: None,
            otp_expires_at: None,
        }
    }

    /// Returns the session to its initial state, dropping any outstanding code.
    pub fn reset(&mut self) {
        self.state = AuthState::Unauthenticated;
        self.clear_otp();
    }

    pub fn clear_otp(&mut self) {
        self.issued_otp = None;
        self.otp_issued_at = None;
        self.otp_expires_at = None;
    }
}

/// An opaque token proving that a session reached `SignedIn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//=========================================================================================
// Uploads
//=========================================================================================

/// Lifecycle of a single uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Validating,
    Transferring,
    Ready,
    Rejected,
}

/// A single uploaded file, tracked independently of the print job(s) that
/// may reference it.
///
/// `owner_email` is a weak reference to the owning auth session: it records
/// the relation only, the session does not own the asset.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    pub id: Uuid,
    pub owner_email: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Page count declared with the submission metadata; jobs sum it.
    pub page_count: u32,
    /// 0..=100, monotonically non-decreasing. Exactly 100 iff `Ready`.
    pub transfer_progress: u8,
    pub state: AssetState,
    pub rejection_reason: Option<AssetRejection>,
    pub submitted_at: DateTime<Utc>,
}

//=========================================================================================
// Print configuration
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Monochrome,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sides {
    SingleSided,
    DoubleSided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// How a job should be printed. A pure value object: jobs freeze a copy at
/// creation and never look at the live selection again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintConfiguration {
    pub color_mode: ColorMode,
    pub sides: Sides,
    pub orientation: Orientation,
    /// 1..=10 inclusive.
    pub copies: u32,
}

//=========================================================================================
// Print jobs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Terminal statuses reject all further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }
}

/// A submitted print order.
///
/// Holds references (not ownership) to its uploaded assets; the assets keep
/// existing independently after the job resolves. `price` is computed once
/// at creation and never recomputed, even if pricing rules change later.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintJob {
    pub id: Uuid,
    pub owner_email: String,
    /// Ordered as submitted; every asset was `Ready` at creation.
    pub asset_ids: Vec<Uuid>,
    pub configuration: PrintConfiguration,
    pub page_count: u32,
    pub price: Decimal,
    pub status: JobStatus,
    /// FIFO ordering key; ties are broken by `id`.
    pub submitted_at: DateTime<Utc>,
}
