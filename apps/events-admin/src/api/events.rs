//! Events and admin profile routes
//!
//! MongoDB repositories when a client is connected, in-memory ones otherwise.

use crate::state::AppState;
use axum::Router;
use domain_events::{
    AdminProfileStore, EventRepository, EventService, InMemoryAdminStore,
    InMemoryEventRepository, MediaManager, MongoAdminStore, MongoEventRepository, admin_router,
    events_router,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Mount the events and admin routers on the configured backend
pub async fn router(state: &AppState) -> eyre::Result<Router> {
    let events_config = &state.config.events;
    let media = MediaManager::from_config(events_config.media.clone());
    if events_config.media.base_url.is_none() {
        warn!("MEDIA_BASE_URL not set, event images are kept in process memory");
    }

    let router = match (&state.mongo_client, &state.config.mongodb) {
        (Some(client), Some(mongodb)) => {
            let repository =
                MongoEventRepository::new(client, &mongodb.database, &events_config.collection);
            init_indexes(&repository).await?;

            let service = EventService::new(Arc::new(repository), media)
                .with_validation_mode(events_config.validation_mode);
            let admins = MongoAdminStore::new(
                client,
                &mongodb.database,
                &events_config.admin_collection,
            );

            mount(service, admins)
        }
        _ => {
            info!("Using in-memory event storage");
            let service = EventService::new(Arc::new(InMemoryEventRepository::new()), media)
                .with_validation_mode(events_config.validation_mode);

            mount(service, InMemoryAdminStore::new())
        }
    };

    Ok(router)
}

fn mount<R, S>(service: EventService<R>, admins: S) -> Router
where
    R: EventRepository + 'static,
    S: AdminProfileStore + 'static,
{
    Router::new()
        .nest("/events", events_router().with_state(Arc::new(service)))
        .nest("/admin", admin_router().with_state(Arc::new(admins)))
}

/// Initialize event indexes in MongoDB
async fn init_indexes(repository: &MongoEventRepository) -> eyre::Result<()> {
    repository
        .create_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create event indexes: {}", e))?;
    info!("Event collection indexes created");
    Ok(())
}

