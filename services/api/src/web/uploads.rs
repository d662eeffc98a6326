//! services/api/src/web/uploads.rs
//!
//! Upload endpoints. A submission is multipart: a `manifest` part declares
//! the batch (names, types, sizes, page counts) and is validated as a whole,
//! then the file parts stream in and drive each asset's transfer progress
//! chunk by chunk.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use campus_print_core::{AssetRejection, AssetState, NewUpload, UploadedAsset};

use crate::web::rest::{error_response, upload_error, ErrorBody, ErrorResponse};
use crate::web::state::{AppState, CurrentSession};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// One file announced by the `manifest` part of a submission.
#[derive(Deserialize, ToSchema)]
pub struct ManifestEntry {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Declared page count, used later for pricing.
    #[serde(default = "one_page")]
    pub pages: u32,
}

fn one_page() -> u32 {
    1
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetStateDto {
    Validating,
    Transferring,
    Ready,
    Rejected,
}

impl From<AssetState> for AssetStateDto {
    fn from(state: AssetState) -> Self {
        match state {
            AssetState::Validating => Self::Validating,
            AssetState::Transferring => Self::Transferring,
            AssetState::Ready => Self::Ready,
            AssetState::Rejected => Self::Rejected,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AssetDto {
    pub id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub page_count: u32,
    pub transfer_progress: u8,
    pub state: AssetStateDto,
    pub submitted_at: DateTime<Utc>,
}

impl From<UploadedAsset> for AssetDto {
    fn from(asset: UploadedAsset) -> Self {
        Self {
            id: asset.id,
            file_name: asset.file_name,
            mime_type: asset.mime_type,
            size_bytes: asset.size_bytes,
            page_count: asset.page_count,
            transfer_progress: asset.transfer_progress,
            state: asset.state.into(),
            submitted_at: asset.submitted_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RejectedUploadDto {
    pub file_name: String,
    pub reason: String,
}

impl RejectedUploadDto {
    fn from_asset(asset: &UploadedAsset) -> Self {
        let reason = match asset.rejection_reason {
            Some(AssetRejection::UnsupportedType) => "UnsupportedType",
            Some(AssetRejection::TooLarge) => "TooLarge",
            // A rejected asset always carries its reason.
            None => "Rejected",
        };
        Self {
            file_name: asset.file_name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// The batch outcome: every submitted file shows up in exactly one list.
#[derive(Serialize, ToSchema)]
pub struct SubmitUploadsResponse {
    pub accepted: Vec<AssetDto>,
    pub rejected: Vec<RejectedUploadDto>,
}

#[derive(Serialize, ToSchema)]
pub struct ClearUploadsResponse {
    pub removed: Vec<Uuid>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /uploads - Submit a batch of files
///
/// Multipart layout: a `manifest` part (JSON array of `ManifestEntry`)
/// followed by one `file` part per accepted entry, in manifest order.
#[utoipa::path(
    post,
    path = "/uploads",
    request_body(content_type = "multipart/form-data", description = "Manifest part, then file parts."),
    responses(
        (status = 200, description = "Batch registered; accepted and rejected files listed", body = SubmitUploadsResponse),
        (status = 400, description = "Missing or malformed manifest", body = ErrorBody),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn submit_uploads_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ErrorResponse> {
    // 1. The manifest part declares the batch.
    let manifest_field = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {e}")))?
        .ok_or_else(|| bad_request("Multipart form must start with a manifest part"))?;
    if manifest_field.name() != Some("manifest") {
        return Err(bad_request("The first part must be named 'manifest'"));
    }
    let manifest_json = manifest_field
        .text()
        .await
        .map_err(|e| bad_request(format!("Failed to read manifest: {e}")))?;
    let manifest: Vec<ManifestEntry> = serde_json::from_str(&manifest_json)
        .map_err(|e| bad_request(format!("Manifest is not valid JSON: {e}")))?;
    if manifest.is_empty() {
        return Err(bad_request("Manifest declares no files"));
    }

    // 2. Register the whole batch; validation failures become rejected
    //    entries while the rest proceed.
    let uploads = manifest
        .into_iter()
        .map(|entry| NewUpload {
            file_name: entry.file_name,
            mime_type: entry.mime_type,
            size_bytes: entry.size_bytes,
            page_count: entry.pages,
        })
        .collect();
    let outcome = state.uploads.submit(&session.email, uploads);

    // 3. Stream the file parts and drive transfer progress from the actual
    //    bytes as they arrive. Parts for rejected files are drained and
    //    ignored.
    let mut awaiting: VecDeque<(Uuid, String, u64)> = outcome
        .accepted
        .iter()
        .map(|a| (a.id, a.file_name.clone(), a.size_bytes))
        .collect();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {e}")))?
    {
        let part_name = field.file_name().unwrap_or_default().to_string();
        let position = awaiting.iter().position(|(_, name, _)| *name == part_name);
        let Some(position) = position else {
            // Not an accepted file; consume and move on.
            while field
                .chunk()
                .await
                .map_err(|e| bad_request(format!("Failed to read file bytes: {e}")))?
                .is_some()
            {}
            continue;
        };
        let (asset_id, _, declared_size) = awaiting
            .remove(position)
            .ok_or_else(|| internal("upload bookkeeping lost a pending file"))?;

        let mut received: u64 = 0;
        let mut reported: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| bad_request(format!("Failed to read file bytes: {e}")))?
        {
            received += chunk.len() as u64;
            let target = (received * 100 / declared_size.max(1)).min(100);
            if target > reported {
                state
                    .uploads
                    .advance_progress(asset_id, (target - reported) as u32)
                    .map_err(upload_error)?;
                reported = target;
            }
        }
        // A transfer that delivered everything it declared is complete.
        if received >= declared_size && reported < 100 {
            state
                .uploads
                .advance_progress(asset_id, (100 - reported) as u32)
                .map_err(upload_error)?;
        }
    }

    // 4. Report the batch with final snapshots.
    let accepted = outcome
        .accepted
        .iter()
        .filter_map(|a| state.uploads.get(a.id))
        .map(AssetDto::from)
        .collect();
    let rejected = outcome.rejected.iter().map(RejectedUploadDto::from_asset).collect();
    Ok(Json(SubmitUploadsResponse { accepted, rejected }))
}

/// GET /uploads - List the session's assets in submission order
#[utoipa::path(
    get,
    path = "/uploads",
    responses(
        (status = 200, description = "Assets in insertion order", body = [AssetDto]),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_uploads_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> impl IntoResponse {
    let assets: Vec<AssetDto> = state
        .uploads
        .list_for_owner(&session.email)
        .into_iter()
        .map(AssetDto::from)
        .collect();
    Json(assets)
}

/// GET /uploads/{id} - Snapshot of one asset, e.g. for progress polling
#[utoipa::path(
    get,
    path = "/uploads/{id}",
    params(("id" = Uuid, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Current snapshot", body = AssetDto),
        (status = 404, description = "Unknown asset", body = ErrorBody)
    )
)]
pub async fn get_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let asset = owned_asset(&state, &session, id)?;
    Ok(Json(AssetDto::from(asset)))
}

/// DELETE /uploads/{id} - Remove a settled asset
#[utoipa::path(
    delete,
    path = "/uploads/{id}",
    params(("id" = Uuid, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Asset removed", body = AssetDto),
        (status = 404, description = "Unknown asset", body = ErrorBody),
        (status = 409, description = "Asset in use or still transferring", body = ErrorBody)
    )
)]
pub async fn remove_upload_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    owned_asset(&state, &session, id)?;
    let removed = state.uploads.remove(id).map_err(upload_error)?;
    Ok(Json(AssetDto::from(removed)))
}

/// DELETE /uploads - Remove every removable asset of the session
#[utoipa::path(
    delete,
    path = "/uploads",
    responses(
        (status = 200, description = "Ids of the removed assets", body = ClearUploadsResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn clear_uploads_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> impl IntoResponse {
    let removed = state.uploads.clear_for_owner(&session.email);
    Json(ClearUploadsResponse { removed })
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Fetches an asset, answering 404 for both unknown ids and other owners'
/// assets so ids cannot be probed across sessions.
fn owned_asset(
    state: &AppState,
    session: &CurrentSession,
    id: Uuid,
) -> Result<UploadedAsset, ErrorResponse> {
    state
        .uploads
        .get(id)
        .filter(|asset| asset.owner_email == session.email)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "NotFound", format!("asset {id} is not registered")))
}

fn bad_request(message: impl Into<String>) -> ErrorResponse {
    error_response(StatusCode::BAD_REQUEST, "BadRequest", message)
}

fn internal(message: impl Into<String>) -> ErrorResponse {
    let message = message.into();
    error!("{message}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal", message)
}
