use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    pub completion_service: String,
}

/// Health check endpoint
///
/// The process stays "degraded" rather than unhealthy when the completion
/// service is unreachable: requests will fail individually with a 500.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let completion = state.analysis.pipeline().health_check().await;

    if let Err(e) = &completion {
        tracing::warn!(error = %e, "Completion service health check failed");
    }

    let (status, completion_status) = match completion {
        Ok(()) => ("healthy", "ok"),
        Err(_) => ("degraded", "error"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services: ServiceHealth {
            completion_service: completion_status.to_string(),
        },
    })
}
