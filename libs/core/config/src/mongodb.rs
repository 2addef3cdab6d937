use crate::{env_first, env_parse, ConfigError, FromEnv};
use std::time::Duration;

/// MongoDB connection settings
///
/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` (required)
/// - `MONGODB_DATABASE` or `MONGO_DATABASE` (required)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (default: 100)
/// - `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,
    pub database: String,
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: "events_admin".to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_first(&["MONGODB_URL", "MONGO_URL"])
            .ok_or_else(|| ConfigError::MissingEnvVar("MONGODB_URL or MONGO_URL".to_string()))?;

        let database = env_first(&["MONGODB_DATABASE", "MONGO_DATABASE"]).ok_or_else(|| {
            ConfigError::MissingEnvVar("MONGODB_DATABASE or MONGO_DATABASE".to_string())
        })?;

        Ok(Self {
            url,
            database,
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: env_parse("MONGODB_MAX_POOL_SIZE", 100)?,
            min_pool_size: env_parse("MONGODB_MIN_POOL_SIZE", 5)?,
            connect_timeout_secs: env_parse("MONGODB_CONNECT_TIMEOUT_SECS", 10)?,
            server_selection_timeout_secs: env_parse("MONGODB_SERVER_SELECTION_TIMEOUT_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_config_with_database() {
        let config = MongoConfig::with_database("mongodb://db:27017", "events")
            .with_app_name("events-admin");
        assert_eq!(config.url, "mongodb://db:27017");
        assert_eq!(config.database, "events");
        assert_eq!(config.app_name.as_deref(), Some("events-admin"));
        assert_eq!(config.max_pool_size, 100);
    }

    #[test]
    fn test_mongo_config_from_env() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("testdb")),
                ("MONGODB_MAX_POOL_SIZE", Some("20")),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url, "mongodb://localhost:27017");
                assert_eq!(config.database, "testdb");
                assert_eq!(config.max_pool_size, 20);
                assert_eq!(config.min_pool_size, 5);
            },
        );
    }

    #[test]
    fn test_mongo_config_from_env_fallback_names() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", None::<&str>),
                ("MONGO_URL", Some("mongodb://fallback:27017")),
                ("MONGODB_DATABASE", None),
                ("MONGO_DATABASE", Some("fallbackdb")),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url, "mongodb://fallback:27017");
                assert_eq!(config.database, "fallbackdb");
            },
        );
    }

    #[test]
    fn test_mongo_config_from_env_missing_url() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", None::<&str>),
                ("MONGO_URL", None),
                ("MONGODB_DATABASE", Some("testdb")),
            ],
            || {
                let err = MongoConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("MONGODB_URL"));
            },
        );
    }
}
