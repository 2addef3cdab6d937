pub mod mongodb;
pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an environment variable or fail with [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read the first variable of `keys` that is set
pub fn env_first(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env::var(key).ok())
}

/// Read and parse an environment variable, using `default` when unset
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("EVENTS_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("EVENTS_TEST_VAR", "fallback"), "value");
        });
        temp_env::with_var_unset("EVENTS_TEST_VAR", || {
            assert_eq!(env_or_default("EVENTS_TEST_VAR", "fallback"), "fallback");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("EVENTS_MISSING_REQUIRED", || {
            let err = env_required("EVENTS_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("EVENTS_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_first_prefers_earlier_keys() {
        temp_env::with_vars(
            [("EVENTS_PRIMARY", Some("a")), ("EVENTS_SECONDARY", Some("b"))],
            || {
                assert_eq!(
                    env_first(&["EVENTS_PRIMARY", "EVENTS_SECONDARY"]),
                    Some("a".to_string())
                );
            },
        );
        temp_env::with_vars(
            [("EVENTS_PRIMARY", None), ("EVENTS_SECONDARY", Some("b"))],
            || {
                assert_eq!(
                    env_first(&["EVENTS_PRIMARY", "EVENTS_SECONDARY"]),
                    Some("b".to_string())
                );
            },
        );
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var("EVENTS_PARSE", Some(" 42 "), || {
            assert_eq!(env_parse::<u32>("EVENTS_PARSE", 1).unwrap(), 42);
        });
        temp_env::with_var_unset("EVENTS_PARSE", || {
            assert_eq!(env_parse::<u32>("EVENTS_PARSE", 7).unwrap(), 7);
        });
        temp_env::with_var("EVENTS_PARSE", Some("many"), || {
            let err = env_parse::<u32>("EVENTS_PARSE", 7).unwrap_err();
            assert!(err.to_string().contains("EVENTS_PARSE"));
        });
    }
}
