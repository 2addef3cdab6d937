//! API routes module
//!
//! Wires the events domain to the configured storage backend.

pub mod events;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Create all API routes; nested under `/api` by the server
pub async fn routes(state: &AppState) -> eyre::Result<Router> {
    Ok(events::router(state)
        .await?
        .merge(health::router(state.clone())))
}
