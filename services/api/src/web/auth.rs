//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: the OTP sign-up flow, password sign-in and
//! logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::web::rest::{auth_error, ErrorBody, ErrorResponse};
use crate::web::state::{AppState, CurrentSession};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RequestOtpRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub session_token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/otp/request - Issue a verification code for an institutional address
#[utoipa::path(
    post,
    path = "/auth/otp/request",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Verification code issued"),
        (status = 400, description = "Address is not on the institutional domain", body = ErrorBody)
    )
)]
pub async fn request_otp_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    state
        .auth
        .request_otp(&req.email)
        .await
        .map_err(auth_error)?;
    Ok(StatusCode::OK)
}

/// POST /auth/otp/resend - Regenerate and re-deliver the verification code
#[utoipa::path(
    post,
    path = "/auth/otp/resend",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "A fresh verification code was issued"),
        (status = 400, description = "Address is not on the institutional domain", body = ErrorBody)
    )
)]
pub async fn resend_otp_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    // Always a regeneration; the superseded code stops working immediately.
    state
        .auth
        .resend_otp(&req.email)
        .await
        .map_err(auth_error)?;
    Ok(StatusCode::OK)
}

/// POST /auth/otp/verify - Exchange a verification code for a session token
#[utoipa::path(
    post,
    path = "/auth/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted, session signed in", body = TokenResponse),
        (status = 400, description = "Code is not six digits", body = ErrorBody),
        (status = 401, description = "Code expired, mismatched, or not outstanding", body = ErrorBody)
    )
)]
pub async fn verify_otp_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let token = state
        .auth
        .verify_otp(&req.email, &req.code)
        .map_err(auth_error)?;
    Ok(Json(TokenResponse {
        session_token: token.as_str().to_string(),
    }))
}

/// POST /auth/sign-in - Password sign-in for an existing account
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn sign_in_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let token = state
        .auth
        .sign_in(&req.email, &req.password)
        .await
        .map_err(auth_error)?;
    Ok(Json(TokenResponse {
        session_token: token.as_str().to_string(),
    }))
}

/// POST /auth/logout - End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session ended"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> impl IntoResponse {
    state.auth.sign_out(&session.token);
    StatusCode::OK
}
