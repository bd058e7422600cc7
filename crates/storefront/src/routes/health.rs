//! Health check handlers.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Key read by the readiness probe. It never exists; only the read matters.
const PROBE_KEY: &str = "health-probe";

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the local store cannot be read.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().get(PROBE_KEY) {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
