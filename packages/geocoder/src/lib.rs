#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding pipeline for GP practice addresses.
//!
//! Converts practice addresses to latitude/longitude coordinates against a
//! rate-limited geocoding API in two phases:
//!
//! 1. **Concurrent phase**: every [`AddressRecord`] is resolved through a
//!    bounded pool of in-flight requests (see [`batch::run`]).
//! 2. **Recovery phase**: records that failed under concurrency are retried
//!    one at a time with a pause between requests, since rate-limit
//!    rejections cluster when many requests are in flight.
//!
//! Both phases go through the same [`client::GeocodeClient`], which retries
//! transient failures with exponential backoff and falls back from the short
//! address to the long one. Individual failures never abort a batch; every
//! record ends up as exactly one [`GeocodeOutcome`].
//!
//! The network side is abstracted behind [`GeocodeService`]. The production
//! implementation is [`google::GoogleGeocoder`], configured from the
//! embedded `services/google.toml` (see [`config`]).
//!
//! [`AddressRecord`]: qof_map_geocoder_models::AddressRecord
//! [`GeocodeOutcome`]: qof_map_geocoder_models::GeocodeOutcome

pub mod address;
pub mod batch;
pub mod client;
pub mod config;
pub mod google;
pub mod progress;
pub mod retry;

#[cfg(test)]
mod test_support;

use async_trait::async_trait;
use qof_map_geocoder_models::Coordinate;
use thiserror::Error;

/// The answer to a single geocoding request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup {
    /// The first location returned by the service.
    Match(Coordinate),
    /// The service confirmed the address has no match.
    NoMatch,
}

/// Retryable errors from a single geocoding request.
///
/// A definite "no match" is not an error; it is reported as
/// [`Lookup::NoMatch`].
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The service answered with an unsuccessful status.
    #[error("Service returned status {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code or API status string.
        status: String,
        /// Error message from the service, if any.
        message: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A geocoding backend that answers one address per call.
///
/// Implementations issue exactly one request per call and hold no
/// concurrency control of their own; throttling, retries and tier fallback
/// are layered on top by [`client::GeocodeClient`] and [`batch`].
#[async_trait]
pub trait GeocodeService: Send + Sync {
    /// Looks up a single free-form address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] for any failure worth retrying.
    async fn lookup(&self, address: &str) -> Result<Lookup, GeocodeError>;
}
