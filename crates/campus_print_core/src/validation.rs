//! crates/campus_print_core/src/validation.rs
//!
//! Pure predicate functions shared by every other component. Nothing in this
//! module holds state or performs I/O; callers use these instead of
//! re-implementing the checks locally.

use thiserror::Error;

/// Domain suffix accepted for institutional accounts unless configured otherwise.
pub const DEFAULT_EMAIL_SUFFIX: &str = ".edu";

/// Per-file upload ceiling unless configured otherwise (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Length of an issued one-time passcode.
pub const OTP_LENGTH: usize = 6;

/// Mime types the print shop accepts: PDF, legacy and open-XML word
/// documents, JPEG and PNG.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
];

/// Why a submitted file was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssetRejection {
    #[error("unsupported file type")]
    UnsupportedType,
    #[error("file exceeds the maximum allowed size")]
    TooLarge,
}

/// True iff the address has a domain part whose suffix matches the
/// configured institutional suffix. The comparison is case-insensitive.
pub fn is_institutional_email(address: &str, suffix: &str) -> bool {
    let Some((local, domain)) = address.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain
        .to_ascii_lowercase()
        .ends_with(&suffix.to_ascii_lowercase())
}

/// Checks a file against the type allowlist and the size ceiling.
pub fn is_allowed_asset(
    mime_type: &str,
    size_bytes: u64,
    max_size_bytes: u64,
) -> Result<(), AssetRejection> {
    if !ALLOWED_MIME_TYPES.contains(&mime_type) {
        return Err(AssetRejection::UnsupportedType);
    }
    if size_bytes > max_size_bytes {
        return Err(AssetRejection::TooLarge);
    }
    Ok(())
}

/// True iff the code is exactly six ASCII digits.
pub fn is_well_formed_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_institutional_addresses() {
        assert!(is_institutional_email("riya@college.edu", ".edu"));
        assert!(is_institutional_email("riya@CS.COLLEGE.EDU", ".edu"));
    }

    #[test]
    fn rejects_other_domains() {
        assert!(!is_institutional_email("riya@gmail.com", ".edu"));
        assert!(!is_institutional_email("riya@college.education.org", ".edu"));
        assert!(!is_institutional_email("not-an-address", ".edu"));
        assert!(!is_institutional_email("@college.edu", ".edu"));
        assert!(!is_institutional_email("riya@", ".edu"));
    }

    #[test]
    fn allowlist_covers_exactly_the_supported_types() {
        for mime in ALLOWED_MIME_TYPES {
            assert_eq!(is_allowed_asset(mime, 1024, DEFAULT_MAX_UPLOAD_BYTES), Ok(()));
        }
        assert_eq!(
            is_allowed_asset("image/gif", 1024, DEFAULT_MAX_UPLOAD_BYTES),
            Err(AssetRejection::UnsupportedType)
        );
        assert_eq!(
            is_allowed_asset("text/plain", 1024, DEFAULT_MAX_UPLOAD_BYTES),
            Err(AssetRejection::UnsupportedType)
        );
    }

    #[test]
    fn oversized_files_are_rejected() {
        assert_eq!(
            is_allowed_asset("application/pdf", DEFAULT_MAX_UPLOAD_BYTES + 1, DEFAULT_MAX_UPLOAD_BYTES),
            Err(AssetRejection::TooLarge)
        );
        // The boundary itself is allowed.
        assert_eq!(
            is_allowed_asset("application/pdf", DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES),
            Ok(())
        );
    }

    #[test]
    fn otp_shape() {
        assert!(is_well_formed_otp("042317"));
        assert!(!is_well_formed_otp("12345"));
        assert!(!is_well_formed_otp("1234567"));
        assert!(!is_well_formed_otp("12a456"));
        assert!(!is_well_formed_otp("12 456"));
        assert!(!is_well_formed_otp(""));
    }
}
