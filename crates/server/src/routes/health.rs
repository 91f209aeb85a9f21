//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness check. Always 200 while the process is up.
///
/// GET /health
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness check. 200 only when the database answers.
///
/// GET /health/ready
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
