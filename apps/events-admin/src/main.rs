use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod db;
mod openapi;
mod server;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    info!(storage = %config.events.storage, "Starting Events Admin API");

    let mongo_client = match &config.mongodb {
        Some(mongodb) => {
            let client = db::connect_from_config_with_retry(mongodb, None).await?;
            info!(
                "Successfully connected to MongoDB database: {}",
                mongodb.database
            );
            Some(client)
        }
        None => None,
    };

    let state = AppState {
        config,
        mongo_client,
    };

    let api_routes = api::routes(&state).await?;
    let app = server::create_router::<openapi::ApiDoc>(
        api_routes,
        &state.config.cors_allowed_origins,
    )?;

    info!(
        "Listening with graceful shutdown ({:?} timeout)",
        state.config.server.shutdown_timeout()
    );

    let server_config = state.config.server.clone();
    server::serve(app, &server_config, async move {
        if let Some(client) = state.mongo_client {
            info!("Shutting down: closing MongoDB connections");
            client.shutdown().await;
            info!("MongoDB connection closed successfully");
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Events Admin API shutdown complete");
    Ok(())
}
