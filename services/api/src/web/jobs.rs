//! services/api/src/web/jobs.rs
//!
//! Print-job endpoints: quoting, creation, listing, status counters and
//! cancellation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use campus_print_core::{
    pricing, ColorMode, JobStats, JobStatus, Orientation, PrintConfiguration, PrintJob, Sides,
};

use crate::web::rest::{error_response, job_error, pricing_error, ErrorBody, ErrorResponse};
use crate::web::state::{AppState, CurrentSession};

//=========================================================================================
// Configuration DTOs
//=========================================================================================

#[derive(Serialize, Deserialize, Clone, Copy, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColorModeDto {
    Monochrome,
    Color,
}

#[derive(Serialize, Deserialize, Clone, Copy, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SidesDto {
    SingleSided,
    DoubleSided,
}

#[derive(Serialize, Deserialize, Clone, Copy, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrientationDto {
    Portrait,
    Landscape,
}

#[derive(Serialize, Deserialize, Clone, Copy, ToSchema)]
pub struct PrintConfigurationDto {
    pub color_mode: ColorModeDto,
    pub sides: SidesDto,
    pub orientation: OrientationDto,
    pub copies: u32,
}

impl From<PrintConfigurationDto> for PrintConfiguration {
    fn from(dto: PrintConfigurationDto) -> Self {
        Self {
            color_mode: match dto.color_mode {
                ColorModeDto::Monochrome => ColorMode::Monochrome,
                ColorModeDto::Color => ColorMode::Color,
            },
            sides: match dto.sides {
                SidesDto::SingleSided => Sides::SingleSided,
                SidesDto::DoubleSided => Sides::DoubleSided,
            },
            orientation: match dto.orientation {
                OrientationDto::Portrait => Orientation::Portrait,
                OrientationDto::Landscape => Orientation::Landscape,
            },
            copies: dto.copies,
        }
    }
}

impl From<PrintConfiguration> for PrintConfigurationDto {
    fn from(config: PrintConfiguration) -> Self {
        Self {
            color_mode: match config.color_mode {
                ColorMode::Monochrome => ColorModeDto::Monochrome,
                ColorMode::Color => ColorModeDto::Color,
            },
            sides: match config.sides {
                Sides::SingleSided => SidesDto::SingleSided,
                Sides::DoubleSided => SidesDto::DoubleSided,
            },
            orientation: match config.orientation {
                Orientation::Portrait => OrientationDto::Portrait,
                Orientation::Landscape => OrientationDto::Landscape,
            },
            copies: config.copies,
        }
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub configuration: PrintConfigurationDto,
    pub pages_per_asset: Vec<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct QuoteResponse {
    /// Amount with two decimal places, e.g. "21.60".
    pub price: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateJobRequest {
    pub asset_ids: Vec<Uuid>,
    pub configuration: PrintConfigurationDto,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatusDto {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl From<JobStatus> for JobStatusDto {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => Self::Pending,
            JobStatus::Processing => Self::Processing,
            JobStatus::Completed => Self::Completed,
            JobStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct JobDto {
    pub id: Uuid,
    pub asset_ids: Vec<Uuid>,
    pub configuration: PrintConfigurationDto,
    pub page_count: u32,
    /// Amount with two decimal places, frozen at creation.
    pub price: String,
    pub status: JobStatusDto,
    pub submitted_at: DateTime<Utc>,
}

impl From<PrintJob> for JobDto {
    fn from(job: PrintJob) -> Self {
        Self {
            id: job.id,
            asset_ids: job.asset_ids,
            configuration: job.configuration.into(),
            page_count: job.page_count,
            price: format!("{:.2}", job.price),
            status: job.status.into(),
            submitted_at: job.submitted_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct JobStatsDto {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl From<JobStats> for JobStatsDto {
    fn from(stats: JobStats) -> Self {
        Self {
            pending: stats.pending,
            processing: stats.processing,
            completed: stats.completed,
            cancelled: stats.cancelled,
        }
    }
}

#[derive(Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /pricing/quote - Price a configuration without creating a job
#[utoipa::path(
    post,
    path = "/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Computed amount", body = QuoteResponse),
        (status = 400, description = "No pages or invalid copy count", body = ErrorBody)
    )
)]
pub async fn quote_handler(
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let amount = pricing::price(&req.configuration.into(), &req.pages_per_asset)
        .map_err(pricing_error)?;
    Ok(Json(QuoteResponse {
        price: format!("{amount:.2}"),
    }))
}

/// POST /jobs - Create a print job from finished uploads
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job queued", body = JobDto),
        (status = 400, description = "Empty asset set or invalid configuration", body = ErrorBody),
        (status = 404, description = "Unknown asset", body = ErrorBody),
        (status = 409, description = "An asset has not finished transferring", body = ErrorBody)
    )
)]
pub async fn create_job_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let job = state
        .jobs
        .create_job(&session.email, req.asset_ids, req.configuration.into())
        .map_err(job_error)?;
    Ok((StatusCode::CREATED, Json(JobDto::from(job))))
}

/// GET /jobs - The session's jobs in FIFO order
#[utoipa::path(
    get,
    path = "/jobs",
    params(("status" = Option<String>, Query, description = "pending | processing | completed | cancelled")),
    responses(
        (status = 200, description = "Jobs in submission order", body = [JobDto]),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    )
)]
pub async fn list_jobs_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let jobs: Vec<JobDto> = state
        .jobs
        .list(Some(&session.email), status)
        .into_iter()
        .map(JobDto::from)
        .collect();
    Ok(Json(jobs))
}

/// GET /jobs/stats - Per-status counters for the session's dashboard
#[utoipa::path(
    get,
    path = "/jobs/stats",
    responses(
        (status = 200, description = "Counters per status", body = JobStatsDto),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn job_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> impl IntoResponse {
    Json(JobStatsDto::from(state.jobs.stats_for_owner(&session.email)))
}

/// GET /jobs/{id} - Snapshot of one job
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Current snapshot", body = JobDto),
        (status = 404, description = "Unknown job", body = ErrorBody)
    )
)]
pub async fn get_job_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let job = owned_job(&state, &session, id)?;
    Ok(Json(JobDto::from(job)))
}

/// POST /jobs/{id}/cancel - Cancel a job that has not started printing
#[utoipa::path(
    post,
    path = "/jobs/{id}/cancel",
    params(("id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job cancelled", body = JobDto),
        (status = 404, description = "Unknown job", body = ErrorBody),
        (status = 409, description = "The job already started or finished", body = ErrorBody)
    )
)]
pub async fn cancel_job_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ErrorResponse> {
    owned_job(&state, &session, id)?;
    state.jobs.cancel(id).map_err(job_error)?;
    let job = owned_job(&state, &session, id)?;
    Ok(Json(JobDto::from(job)))
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Fetches a job, answering 404 for both unknown ids and other sessions'
/// jobs so ids cannot be probed across sessions.
fn owned_job(
    state: &AppState,
    session: &CurrentSession,
    id: Uuid,
) -> Result<PrintJob, ErrorResponse> {
    state
        .jobs
        .get(id)
        .filter(|job| job.owner_email == session.email)
        .ok_or_else(|| {
            error_response(
                StatusCode::NOT_FOUND,
                "JobNotFound",
                format!("job {id} was not found"),
            )
        })
}

fn parse_status(raw: &str) -> Result<JobStatus, ErrorResponse> {
    match raw {
        "pending" => Ok(JobStatus::Pending),
        "processing" => Ok(JobStatus::Processing),
        "completed" => Ok(JobStatus::Completed),
        "cancelled" => Ok(JobStatus::Cancelled),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            format!("'{other}' is not a job status"),
        )),
    }
}
