use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode};

use crate::app::errors;
use crate::app::services::AppServices;

pub async fn ping() -> &'static str {
    "ok"
}

/// Liveness plus a round trip to the backing store.
pub async fn health(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ping_store().await {
        Ok(()) => axum::response::IntoResponse::into_response(StatusCode::OK),
        Err(e) => {
            tracing::error!(error = ?e, "health check failed");
            errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "store unreachable")
        }
    }
}
