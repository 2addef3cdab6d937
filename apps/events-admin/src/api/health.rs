//! Liveness and readiness endpoints

use axum::http::StatusCode;
use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    status: &'static str,
    storage: &'static str,
    /// `None` when MongoDB is not in use
    #[serde(skip_serializing_if = "Option::is_none")]
    mongodb: Option<bool>,
}

/// Create a health check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness check - verifies the MongoDB connection when one is configured
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let mongodb = match &state.mongo_client {
        Some(client) => Some(db::check_health(client).await),
        None => None,
    };
    let ready = mongodb.unwrap_or(true);

    let response = ReadyResponse {
        status: if ready { "ready" } else { "unhealthy" },
        storage: if mongodb.is_some() { "mongodb" } else { "memory" },
        mongodb,
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
