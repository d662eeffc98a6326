//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{InMemoryCredentialStore, LogDispatcher, LogMailer},
    config::Config,
    error::ApiError,
    fulfillment::fulfillment_worker,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use campus_print_core::{AuthSessionManager, JobQueueManager, UploadRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Port Adapters ---
    let credentials = Arc::new(InMemoryCredentialStore::new());
    for (email, password) in &config.seed_accounts {
        credentials.register(email, password)?;
    }
    if !config.seed_accounts.is_empty() {
        info!("Registered {} seed account(s).", config.seed_accounts.len());
    }
    let mailer = Arc::new(LogMailer::new());
    let dispatcher = Arc::new(LogDispatcher::new());

    // --- 3. Build the Core Managers ---
    let auth = Arc::new(AuthSessionManager::new(
        credentials,
        mailer,
        config.email_suffix.clone(),
        chrono::Duration::minutes(config.otp_validity_minutes),
    ));
    let uploads = Arc::new(UploadRegistry::new(config.max_upload_bytes));
    let jobs = Arc::new(JobQueueManager::new(uploads.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        auth,
        uploads: uploads.clone(),
        jobs: jobs.clone(),
        config: config.clone(),
    });

    // --- 5. Start the Fulfillment Worker ---
    let worker_token = CancellationToken::new();
    tokio::spawn(fulfillment_worker(
        jobs,
        dispatcher,
        Duration::from_millis(config.worker_poll_ms),
        worker_token.clone(),
    ));

    // --- 6. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("invalid CORS_ORIGIN: {e}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Room for a manifest plus a batch of full-size files in one request.
    let body_limit = (config.max_upload_bytes as usize).saturating_mul(8);
    let api_router = web::router(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(worker_token))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C, then stops the fulfillment worker alongside the server.
async fn shutdown_signal(worker_token: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received.");
    }
    worker_token.cancel();
}
