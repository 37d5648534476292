//! Live feed configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ATELIER_GRAPHQL_URL` - GraphQL endpoint for the snapshot query
//! - `ATELIER_EVENTS_URL` - SSE endpoint delivering order mutation events
//! - `ATELIER_API_TOKEN` - Bearer token for both endpoints
//!
//! ## Optional
//! - `ATELIER_SOUND_ENABLED` - Play an audio cue on new orders (default: false)
//! - `ATELIER_SOUND_URL` - Cue location (required when sound is enabled)
//! - `ATELIER_EVENT_BUFFER_CAPACITY` - Pre-snapshot buffer size (default: 256)
//! - `ATELIER_NOTIFY_SECONDS` - Toast display duration (default: 5)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::buffer;

const DEFAULT_NOTIFY_SECONDS: u64 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Live feed configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct LiveConfig {
    /// GraphQL endpoint for the snapshot query.
    pub graphql_url: Url,
    /// SSE endpoint delivering mutation events.
    pub events_url: Url,
    /// Bearer token for both endpoints.
    pub api_token: SecretString,
    /// Audio cue location; `None` disables sound.
    pub sound_url: Option<String>,
    /// Capacity of the pre-snapshot event buffer.
    pub buffer_capacity: usize,
    /// Toast display duration.
    pub notify_duration: Duration,
}

impl std::fmt::Debug for LiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConfig")
            .field("graphql_url", &self.graphql_url.as_str())
            .field("events_url", &self.events_url.as_str())
            .field("api_token", &"[REDACTED]")
            .field("sound_url", &self.sound_url)
            .field("buffer_capacity", &self.buffer_capacity)
            .field("notify_duration", &self.notify_duration)
            .finish()
    }
}

impl LiveConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if sound is enabled without a cue URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let graphql_url = get_url("ATELIER_GRAPHQL_URL")?;
        let events_url = get_url("ATELIER_EVENTS_URL")?;
        let api_token = SecretString::from(get_required_env("ATELIER_API_TOKEN")?);

        let sound_enabled = get_env_or_default("ATELIER_SOUND_ENABLED", "false")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ATELIER_SOUND_ENABLED".to_string(), e.to_string())
            })?;
        let sound_url = if sound_enabled {
            Some(get_required_env("ATELIER_SOUND_URL")?)
        } else {
            None
        };

        let buffer_capacity = get_env_or_default(
            "ATELIER_EVENT_BUFFER_CAPACITY",
            &buffer::DEFAULT_CAPACITY.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ATELIER_EVENT_BUFFER_CAPACITY".to_string(), e.to_string())
        })?;

        let notify_seconds = get_env_or_default(
            "ATELIER_NOTIFY_SECONDS",
            &DEFAULT_NOTIFY_SECONDS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ATELIER_NOTIFY_SECONDS".to_string(), e.to_string())
        })?;

        Ok(Self {
            graphql_url,
            events_url,
            api_token,
            sound_url,
            buffer_capacity,
            notify_duration: Duration::from_secs(notify_seconds),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a required environment variable parsed as a URL.
fn get_url(key: &str) -> Result<Url, ConfigError> {
    get_required_env(key)?
        .parse::<Url>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_token() {
        let config = LiveConfig {
            graphql_url: "https://api.atelier.test/graphql".parse().unwrap(),
            events_url: "https://api.atelier.test/events".parse().unwrap(),
            api_token: SecretString::from("super_secret_token"),
            sound_url: None,
            buffer_capacity: 256,
            notify_duration: Duration::from_secs(5),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("https://api.atelier.test/graphql"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
