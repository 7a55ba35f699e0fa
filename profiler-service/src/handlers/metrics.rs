use axum::{extract::State, response::IntoResponse};

use crate::services::metrics as service_metrics;
use crate::startup::AppState;

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    service_metrics::set_active_sessions(state.sessions.len());
    service_metrics::get_metrics()
}
