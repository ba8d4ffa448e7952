//! Compile-time geocoding service configuration.
//!
//! The service endpoint and the pipeline's default tuning (concurrency,
//! attempts, backoff, recovery pause) live in `services/google.toml`, which
//! is embedded at compile time and exposed via [`google_service`]. Callers
//! override individual values (e.g. from CLI flags) before building the
//! [`BatchOptions`].

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::batch::BatchOptions;
use crate::retry::RetryPolicy;

const GOOGLE_TOML: &str = include_str!("../services/google.toml");

/// Errors from parsing a service configuration.
#[derive(Debug, Error)]
pub enum ServiceConfigError {
    /// The TOML document is malformed or missing required fields.
    #[error("Invalid service config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("Invalid service config value for '{field}': {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },
}

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Unique identifier (e.g., `"google"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Endpoint URL.
    pub base_url: String,
    /// Region bias passed to the service, if any.
    #[serde(default)]
    pub region: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum in-flight resolutions during the concurrent phase.
    #[serde(default = "default_concurrent")]
    pub concurrent_requests: usize,
    /// Attempts per address tier before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Pause before each request in the recovery phase, in milliseconds.
    #[serde(default = "default_recovery_pause_ms")]
    pub recovery_pause_ms: u64,
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_concurrent() -> usize {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_base_ms() -> u64 {
    100
}

const fn default_recovery_pause_ms() -> u64 {
    20
}

impl ServiceConfig {
    /// Parses and validates a service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceConfigError`] if the document is malformed or a
    /// value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self, ServiceConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServiceConfigError> {
        if self.base_url.is_empty() {
            return Err(ServiceConfigError::Invalid {
                field: "base_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.concurrent_requests == 0 {
            return Err(ServiceConfigError::Invalid {
                field: "concurrent_requests",
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ServiceConfigError::Invalid {
                field: "max_attempts",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Batch options derived from this configuration.
    #[must_use]
    pub const fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency_limit: self.concurrent_requests,
            policy: RetryPolicy {
                max_attempts: self.max_attempts,
                base_delay: Duration::from_millis(self.backoff_base_ms),
                request_pause: Duration::ZERO,
            },
            recovery_pause: Duration::from_millis(self.recovery_pause_ms),
        }
    }
}

/// Returns the embedded Google Geocoding API configuration.
///
/// # Panics
///
/// Panics if the embedded TOML is malformed (a build-time mistake, caught by
/// the tests below).
#[must_use]
pub fn google_service() -> ServiceConfig {
    ServiceConfig::from_toml(GOOGLE_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse geocoding service 'google': {e}"))
}
