use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::RepodocError;
use crate::pipeline::DocumentService;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateResponse {
    pub markdown: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router(service: Arc<DocumentService>) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn generate(
    State(service): State<Arc<DocumentService>>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(rejection),
    };
    let directive = request.prompt.unwrap_or_default();

    match service.generate(&directive).await {
        Ok(markdown) => Json(GenerateResponse { markdown }).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

// Malformed bodies, wrong content types and mistyped fields are all client errors.
fn rejection_response(rejection: JsonRejection) -> Response {
    warn!(status = rejection.status().as_u16(), "Rejected generate request body: {}", rejection.body_text());
    let body = ErrorResponse {
        error: format!("Invalid request body: {}", rejection.body_text()),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn error_response(err: RepodocError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(status = status.as_u16(), "Document generation failed: {}", err);
    }
    (status, Json(ErrorResponse { error: err.user_message() })).into_response()
}
