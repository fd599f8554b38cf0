//! Operational endpoints. They go through the access log like any other route
//! and land under the `healthz`, `readyz`, `metrics` and `version` modules.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::state::AppState;

const READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness: the process answers. Never touches the database.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness: the pool hands out a connection and the `books` table is readable.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let check = sqlx::query("SELECT id FROM books LIMIT 1").fetch_optional(&state.db);
    match tokio::time::timeout(READY_TIMEOUT, check).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response()
        }
        Err(_) => {
            tracing::warn!("Readiness check timed out after {:?}", READY_TIMEOUT);
            (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response()
        }
    }
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.get_snapshot())
}

pub async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        },
    }))
}
