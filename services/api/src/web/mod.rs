pub mod auth;
pub mod jobs;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod uploads;

pub use middleware::require_auth;
pub use rest::ApiDoc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::web::state::AppState;

/// Builds the API router: public onboarding/quote routes plus the
/// token-protected order surface.
pub fn router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/otp/request", post(auth::request_otp_handler))
        .route("/auth/otp/resend", post(auth::resend_otp_handler))
        .route("/auth/otp/verify", post(auth::verify_otp_handler))
        .route("/auth/sign-in", post(auth::sign_in_handler))
        .route("/pricing/quote", post(jobs::quote_handler));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route(
            "/uploads",
            post(uploads::submit_uploads_handler)
                .get(uploads::list_uploads_handler)
                .delete(uploads::clear_uploads_handler),
        )
        .route(
            "/uploads/{id}",
            get(uploads::get_upload_handler).delete(uploads::remove_upload_handler),
        )
        .route(
            "/jobs",
            post(jobs::create_job_handler).get(jobs::list_jobs_handler),
        )
        .route("/jobs/stats", get(jobs::job_stats_handler))
        .route("/jobs/{id}", get(jobs::get_job_handler))
        .route("/jobs/{id}/cancel", post(jobs::cancel_job_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryCredentialStore, LogMailer};
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use campus_print_core::validation::DEFAULT_MAX_UPLOAD_BYTES;
    use campus_print_core::{AuthSessionManager, JobQueueManager, UploadRegistry};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tracing::Level;

    fn test_state() -> Arc<AppState> {
        let config = Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            log_level: Level::INFO,
            email_suffix: ".edu".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            otp_validity_minutes: 10,
            worker_poll_ms: 500,
            cors_origin: "http://localhost:3000".to_string(),
            seed_accounts: Vec::new(),
        });

        let credentials = Arc::new(InMemoryCredentialStore::new());
        credentials.register("riya@college.edu", "hunter2").unwrap();
        let auth = Arc::new(AuthSessionManager::new(
            credentials,
            Arc::new(LogMailer::new()),
            config.email_suffix.clone(),
            chrono::Duration::minutes(config.otp_validity_minutes),
        ));
        let uploads = Arc::new(UploadRegistry::new(config.max_upload_bytes));
        let jobs = Arc::new(JobQueueManager::new(uploads.clone()));

        Arc::new(AppState {
            auth,
            uploads,
            jobs,
            config,
        })
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn otp_request_rejects_foreign_domains() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                "/auth/otp/request",
                json!({"email": "riya@gmail.com"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "InvalidEmailDomain");
    }

    #[tokio::test]
    async fn sign_in_failures_are_uniform_401s() {
        let app = router(test_state());
        for (email, password) in [
            ("riya@college.edu", "wrong"),
            ("nobody@college.edu", "hunter2"),
        ] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "/auth/sign-in",
                    json!({"email": email, "password": password}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let body = body_json(response).await;
            assert_eq!(body["error"], "InvalidCredentials");
        }
    }

    #[tokio::test]
    async fn a_token_opens_the_protected_surface() {
        let app = router(test_state());

        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/sign-in",
                json!({"email": "riya@college.edu", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["session_token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/jobs")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn the_protected_surface_requires_a_token() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/uploads").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn quotes_match_the_published_rates() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                "/pricing/quote",
                json!({
                    "configuration": {
                        "color_mode": "monochrome",
                        "sides": "double_sided",
                        "orientation": "portrait",
                        "copies": 1
                    },
                    "pages_per_asset": [8]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["price"], "21.60");
    }

    #[tokio::test]
    async fn the_full_order_lifecycle_over_http() {
        let app = router(test_state());

        // Sign in.
        let response = app
            .clone()
            .oneshot(json_request(
                "/auth/sign-in",
                json!({"email": "riya@college.edu", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        let token = body_json(response).await["session_token"]
            .as_str()
            .unwrap()
            .to_string();

        // Upload one pdf and one unsupported file in a single batch.
        let content = "x".repeat(2048);
        let manifest = json!([
            {"file_name": "notes.pdf", "mime_type": "application/pdf", "size_bytes": 2048, "pages": 5},
            {"file_name": "clip.mp4", "mime_type": "video/mp4", "size_bytes": 16, "pages": 1}
        ]);
        let boundary = "campusprintboundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"manifest\"\r\n\r\n\
             {manifest}\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"notes.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             {content}\r\n\
             --{boundary}--\r\n"
        );
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/uploads")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let batch = body_json(response).await;
        assert_eq!(batch["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(batch["accepted"][0]["state"], "ready");
        assert_eq!(batch["accepted"][0]["transfer_progress"], 100);
        assert_eq!(batch["rejected"][0]["file_name"], "clip.mp4");
        assert_eq!(batch["rejected"][0]["reason"], "UnsupportedType");
        let asset_id = batch["accepted"][0]["id"].as_str().unwrap().to_string();

        // Create a job from the finished upload.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/jobs")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "asset_ids": [asset_id],
                            "configuration": {
                                "color_mode": "monochrome",
                                "sides": "single_sided",
                                "orientation": "portrait",
                                "copies": 1
                            }
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let job = body_json(response).await;
        assert_eq!(job["price"], "15.00");
        assert_eq!(job["status"], "pending");
        let job_id = job["id"].as_str().unwrap().to_string();

        // Cancel it; a second cancel is a conflict.
        let cancel_uri = format!("/jobs/{job_id}/cancel");
        let cancel = |uri: String| {
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap()
        };
        let response = app.clone().oneshot(cancel(cancel_uri.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "cancelled");

        let response = app.oneshot(cancel(cancel_uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "InvalidTransition");
    }

    #[tokio::test]
    async fn quotes_reject_empty_documents() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                "/pricing/quote",
                json!({
                    "configuration": {
                        "color_mode": "color",
                        "sides": "single_sided",
                        "orientation": "portrait",
                        "copies": 1
                    },
                    "pages_per_asset": []
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "NoPages");
    }
}
