//! services/api/src/web/rest.rs
//!
//! The master definition of the OpenAPI specification, plus the uniform
//! error body every handler answers with and the mapping from core errors
//! to HTTP statuses.

use axum::{http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use campus_print_core::{AuthError, JobError, PricingError, UploadError};

use crate::web::{auth, jobs, uploads};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_otp_handler,
        auth::resend_otp_handler,
        auth::verify_otp_handler,
        auth::sign_in_handler,
        auth::logout_handler,
        uploads::submit_uploads_handler,
        uploads::list_uploads_handler,
        uploads::get_upload_handler,
        uploads::remove_upload_handler,
        uploads::clear_uploads_handler,
        jobs::quote_handler,
        jobs::create_job_handler,
        jobs::list_jobs_handler,
        jobs::job_stats_handler,
        jobs::get_job_handler,
        jobs::cancel_job_handler,
    ),
    components(schemas(
        ErrorBody,
        auth::RequestOtpRequest,
        auth::VerifyOtpRequest,
        auth::SignInRequest,
        auth::TokenResponse,
        uploads::ManifestEntry,
        uploads::AssetDto,
        uploads::AssetStateDto,
        uploads::RejectedUploadDto,
        uploads::SubmitUploadsResponse,
        uploads::ClearUploadsResponse,
        jobs::ColorModeDto,
        jobs::SidesDto,
        jobs::OrientationDto,
        jobs::PrintConfigurationDto,
        jobs::QuoteRequest,
        jobs::QuoteResponse,
        jobs::CreateJobRequest,
        jobs::JobDto,
        jobs::JobStatusDto,
        jobs::JobStatsDto,
    )),
    tags(
        (name = "Campus Print API", description = "Print order lifecycle and pricing for campus printing.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Uniform Error Body
//=========================================================================================

/// Every failed request answers with this shape; `error` carries a stable
/// reason code a UI can branch on.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

pub type ErrorResponse = (StatusCode, Json<ErrorBody>);

pub fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> ErrorResponse {
    (
        status,
        Json(ErrorBody {
            error: code.to_string(),
            message: message.into(),
        }),
    )
}

//=========================================================================================
// Core Error -> HTTP Mapping
//=========================================================================================

/// Validation problems are 400, credential/OTP outcomes are a uniform 401
/// (no account enumeration), infrastructure trouble is 500.
pub fn auth_error(e: AuthError) -> ErrorResponse {
    let message = e.to_string();
    match e {
        AuthError::InvalidEmailDomain => {
            error_response(StatusCode::BAD_REQUEST, "InvalidEmailDomain", message)
        }
        AuthError::Malformed => error_response(StatusCode::BAD_REQUEST, "Malformed", message),
        AuthError::InvalidCredentials => {
            error_response(StatusCode::UNAUTHORIZED, "InvalidCredentials", message)
        }
        AuthError::NotPending => error_response(StatusCode::UNAUTHORIZED, "NotPending", message),
        AuthError::Expired => error_response(StatusCode::UNAUTHORIZED, "Expired", message),
        AuthError::Mismatch => error_response(StatusCode::UNAUTHORIZED, "Mismatch", message),
        AuthError::StoreUnavailable(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal",
            "authentication is temporarily unavailable",
        ),
    }
}

/// Lifecycle conflicts are 409 so a UI can explain "this job already
/// started"; unknown ids are 404; bad input is 400.
pub fn job_error(e: JobError) -> ErrorResponse {
    let message = e.to_string();
    match e {
        JobError::EmptyAssetSet => {
            error_response(StatusCode::BAD_REQUEST, "EmptyAssetSet", message)
        }
        JobError::UnknownAsset(_) => error_response(StatusCode::NOT_FOUND, "UnknownAsset", message),
        JobError::AssetsNotReady(_) => {
            error_response(StatusCode::CONFLICT, "AssetsNotReady", message)
        }
        JobError::JobNotFound(_) => error_response(StatusCode::NOT_FOUND, "JobNotFound", message),
        JobError::InvalidTransition { .. } => {
            error_response(StatusCode::CONFLICT, "InvalidTransition", message)
        }
        JobError::Pricing(e) => pricing_error(e),
    }
}

pub fn pricing_error(e: PricingError) -> ErrorResponse {
    let message = e.to_string();
    match e {
        PricingError::NoPages => error_response(StatusCode::BAD_REQUEST, "NoPages", message),
        PricingError::InvalidCopies => {
            error_response(StatusCode::BAD_REQUEST, "InvalidCopies", message)
        }
    }
}

pub fn upload_error(e: UploadError) -> ErrorResponse {
    let message = e.to_string();
    match e {
        UploadError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "NotFound", message),
        UploadError::AssetInUse(_) => error_response(StatusCode::CONFLICT, "AssetInUse", message),
        UploadError::TransferInProgress(_) => {
            error_response(StatusCode::CONFLICT, "TransferInProgress", message)
        }
    }
}
