//! HTTP routes and handlers

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use threatscan_core::Prediction;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    // Any origin, method and header; credentials are not allowed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(ping))
        .route("/analyze", post(analyze))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn ping() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub predictions: Vec<Prediction>,
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    metrics::counter!("threatscan_requests_total", "route" => "analyze").increment(1);
    debug!("Analyzing {} chars", req.text.len());

    let start = Instant::now();
    let service = Arc::clone(&state.service);

    // Forward passes are blocking; keep them off the async workers.
    let predictions =
        tokio::task::spawn_blocking(move || service.predict_default(&req.text)).await??;

    metrics::histogram!("threatscan_inference_latency_us")
        .record(start.elapsed().as_micros() as f64);

    Ok(Json(AnalyzeResponse { predictions }))
}

async fn fallback() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "message": "Not found",
                "type": "not_found",
            }
        })),
    )
        .into_response()
}

/// Error handling
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Inference(#[from] threatscan_core::Error),

    #[error("inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);

        let kind = match &self {
            AppError::Inference(threatscan_core::Error::NotFound(_)) => "model_not_found",
            AppError::Inference(_) => "inference_error",
            AppError::Join(_) => "internal_error",
        };
        metrics::counter!("threatscan_errors_total", "type" => kind).increment(1);

        let body = json!({
            "error": {
                "message": self.to_string(),
                "type": kind,
            }
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
