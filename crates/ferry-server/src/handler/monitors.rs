//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::handler::response::HealthStatus;
use crate::service::{ServiceState, StorageRoot};
use crate::utility::TRACING_TARGET_HANDLER;

/// Reports whether the storage root is reachable.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(storage_root): State<StorageRoot>,
) -> (StatusCode, Json<HealthStatus>) {
    let is_healthy = storage_root.is_available().await;

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        is_healthy,
        status_code = status_code.as_u16(),
        "health status checked"
    );

    let response = HealthStatus {
        is_healthy,
        storage_root: storage_root.path().display().to_string(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
    };

    (status_code, Json(response))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}
