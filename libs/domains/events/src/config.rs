//! Events domain configuration

use crate::validation::{MAX_IMAGES_PER_EVENT, ValidationMode};
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use strum::{Display, EnumString};

/// Where events and admin profiles are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StorageBackend {
    #[default]
    #[strum(to_string = "mongodb", serialize = "mongo")]
    MongoDb,
    #[strum(to_string = "memory")]
    Memory,
}

/// Blob store and image batch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConfig {
    /// HTTP endpoint of the blob store; in-process store when unset
    pub base_url: Option<String>,
    /// Key prefix for uploaded images
    pub folder: String,
    pub max_images: usize,
    /// Delete already-uploaded blobs when a batch upload fails
    pub rollback_on_failure: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            folder: "event_images".to_string(),
            max_images: MAX_IMAGES_PER_EVENT,
            rollback_on_failure: false,
        }
    }
}

impl FromEnv for MediaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let base_url = std::env::var("MEDIA_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            base_url,
            folder: env_or_default("MEDIA_FOLDER", &defaults.folder),
            max_images: env_parse("MEDIA_MAX_IMAGES", defaults.max_images)?,
            rollback_on_failure: env_parse(
                "MEDIA_ROLLBACK_ON_FAILURE",
                defaults.rollback_on_failure,
            )?,
        })
    }
}

/// Events domain settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsConfig {
    pub storage: StorageBackend,
    pub collection: String,
    pub admin_collection: String,
    pub validation_mode: ValidationMode,
    pub media: MediaConfig,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            collection: "events".to_string(),
            admin_collection: "admin_users".to_string(),
            validation_mode: ValidationMode::default(),
            media: MediaConfig::default(),
        }
    }
}

impl FromEnv for EventsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            storage: env_parse("EVENTS_STORAGE", defaults.storage)?,
            collection: env_or_default("EVENTS_COLLECTION", &defaults.collection),
            admin_collection: env_or_default("ADMIN_USERS_COLLECTION", &defaults.admin_collection),
            validation_mode: env_parse("EVENTS_VALIDATION_MODE", defaults.validation_mode)?,
            media: MediaConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 8] = [
        "EVENTS_STORAGE",
        "EVENTS_COLLECTION",
        "ADMIN_USERS_COLLECTION",
        "EVENTS_VALIDATION_MODE",
        "MEDIA_BASE_URL",
        "MEDIA_FOLDER",
        "MEDIA_MAX_IMAGES",
        "MEDIA_ROLLBACK_ON_FAILURE",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            let config = EventsConfig::from_env().unwrap();
            assert_eq!(config, EventsConfig::default());
            assert_eq!(config.storage, StorageBackend::MongoDb);
            assert_eq!(config.validation_mode, ValidationMode::Full);
            assert_eq!(config.media.max_images, 5);
            assert!(config.media.base_url.is_none());
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("EVENTS_STORAGE", Some("Memory")),
                ("EVENTS_COLLECTION", Some("events_v2")),
                ("EVENTS_VALIDATION_MODE", Some("basic")),
                ("MEDIA_BASE_URL", Some("https://blobs.example.com/")),
                ("MEDIA_MAX_IMAGES", Some("3")),
                ("MEDIA_ROLLBACK_ON_FAILURE", Some("true")),
            ],
            || {
                let config = EventsConfig::from_env().unwrap();
                assert_eq!(config.storage, StorageBackend::Memory);
                assert_eq!(config.collection, "events_v2");
                assert_eq!(config.validation_mode, ValidationMode::Basic);
                assert_eq!(
                    config.media.base_url.as_deref(),
                    Some("https://blobs.example.com")
                );
                assert_eq!(config.media.max_images, 3);
                assert!(config.media.rollback_on_failure);
            },
        );
    }

    #[test]
    fn test_invalid_storage_backend() {
        temp_env::with_var("EVENTS_STORAGE", Some("postgres"), || {
            let err = EventsConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "EVENTS_STORAGE"));
        });
    }

    #[test]
    fn test_blank_media_url_is_ignored() {
        temp_env::with_var("MEDIA_BASE_URL", Some("  "), || {
            assert!(MediaConfig::from_env().unwrap().base_url.is_none());
        });
    }
}
