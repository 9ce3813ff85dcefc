//! Environment configuration
//!
//! This module reads the process environment (after `.env` has been loaded by
//! `dotenvy`) into a typed configuration. Missing values fall back to
//! development defaults; malformed values are an error.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::clients::directions::DirectionsConfig;

/// Configuration failures detected at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime environment configuration
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    /// Absent means trips are kept in memory.
    pub database_url: Option<String>,
    pub directions: DirectionsConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(60),
            database_url: None,
            directions: DirectionsConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Load the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut directions = DirectionsConfig::new(env_string("MAPBOX_TOKEN").unwrap_or_default());
        if let Some(base_url) = env_string("DIRECTIONS_BASE_URL") {
            directions = directions.with_base_url(base_url);
        }
        if let Some(profile) = env_string("DIRECTIONS_PROFILE") {
            directions = directions.with_profile(profile);
        }
        if let Some(secs) = env_parse::<u64>("DIRECTIONS_TIMEOUT_SECS")? {
            directions = directions.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            environment: env_string("ENVIRONMENT").unwrap_or(defaults.environment),
            host: env_string("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT")?.unwrap_or(defaults.port),
            cors_origins: env_string("CORS_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
            request_timeout: env_parse::<u64>("REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            database_url: env_string("DATABASE_URL"),
            directions,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Address the server binds to
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Non-blank environment value.
pub(crate) fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse an optional environment value.
pub(crate) fn env_parse<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
