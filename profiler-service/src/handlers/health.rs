use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

use crate::startup::AppState;

/// Liveness check with a short status summary.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "profiler-service",
        "version": env!("CARGO_PKG_VERSION"),
        "questions": state.bank.len(),
        "provider": state.analyst.provider().name(),
    }))
}

/// Readiness: serving makes no sense without questions.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if state.bank.is_empty() {
        tracing::warn!("Question bank is empty, not ready");
        return Err(AppError::ServiceUnavailable);
    }
    Ok(StatusCode::OK)
}
