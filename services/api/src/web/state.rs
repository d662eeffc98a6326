//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request session
//! identity inserted by the auth middleware.

use crate::config::Config;
use campus_print_core::{AuthSessionManager, JobQueueManager, UploadRegistry};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all
/// handlers. The three managers are the process-wide owners of session,
/// upload and job state.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthSessionManager>,
    pub uploads: Arc<UploadRegistry>,
    pub jobs: Arc<JobQueueManager>,
    pub config: Arc<Config>,
}

//=========================================================================================
// CurrentSession (Specific to One Authenticated Request)
//=========================================================================================

/// The authenticated identity of a request, resolved from the bearer token
/// by `require_auth` and stored in the request extensions.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub email: String,
    pub token: String,
}
