//! Liveness probe backed by a store ping

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::middleware::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /api/v1/health
async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.pool.ping().await.map_err(|e| {
        tracing::warn!("Health check failed: {:#}", e);
        ApiError::new("SERVICE_UNAVAILABLE", "Database unavailable")
    })?;

    Ok(Json(HealthResponse { status: "ok" }))
}
