//! Shared application state.

use mongodb::Client;

/// Cloned into the routers that need it; the MongoDB client shares its pool
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// `None` when events are kept in memory
    pub mongo_client: Option<Client>,
}
