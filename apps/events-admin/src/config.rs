use core_config::mongodb::MongoConfig;
use core_config::server::ServerConfig;
use core_config::{Environment, FromEnv};
use domain_events::{EventsConfig, StorageBackend};

/// Application configuration composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    /// Only loaded when events are stored in MongoDB
    pub mongodb: Option<MongoConfig>,
    pub server: ServerConfig,
    pub events: EventsConfig,
    pub environment: Environment,
    /// Comma-separated `CORS_ALLOWED_ORIGIN`; CORS stays off when empty
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let events = EventsConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let mongodb = match events.storage {
            StorageBackend::MongoDb => {
                let mongodb = MongoConfig::from_env()?;
                Some(match mongodb.app_name {
                    Some(_) => mongodb,
                    None => mongodb.with_app_name(env!("CARGO_PKG_NAME")),
                })
            }
            StorageBackend::Memory => None,
        };

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGIN")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            mongodb,
            server,
            events,
            environment,
            cors_allowed_origins,
        })
    }
}
