//! Google Geocoding API client.
//!
//! Issues `GET {base_url}?address=...&key=...` and interprets the `status`
//! field of the JSON body:
//!
//! - `OK`: the first result's `geometry.location` is the match.
//! - `ZERO_RESULTS`: a definite no-match; retrying will not help.
//! - anything else (`OVER_QUERY_LIMIT`, `UNKNOWN_ERROR`, ...): retryable.
//!
//! The API enforces a per-project request rate, so callers must bound
//! concurrency themselves (see [`crate::batch`]).
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use std::time::Duration;

use async_trait::async_trait;
use qof_map_geocoder_models::Coordinate;

use crate::config::ServiceConfig;
use crate::{GeocodeError, GeocodeService, Lookup};

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// A [`GeocodeService`] backed by the Google Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    region: Option<String>,
}

impl GoogleGeocoder {
    /// Creates a geocoder that sends requests through `client`.
    ///
    /// The client is shared, not owned: build it once with
    /// [`build_http_client`] and pass it to every consumer.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            region: None,
        }
    }

    /// Creates a geocoder from the embedded service configuration.
    #[must_use]
    pub fn from_config(
        client: reqwest::Client,
        config: &ServiceConfig,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            region: config.region.clone(),
            ..Self::new(client, config.base_url.clone(), api_key)
        }
    }
}

/// Builds the HTTP client used for geocoding requests.
///
/// Every request carries `timeout`; exceeding it surfaces as a retryable
/// [`GeocodeError::Http`].
///
/// # Errors
///
/// Returns [`GeocodeError::Http`] if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, GeocodeError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("qof_map/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

#[async_trait]
impl GeocodeService for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> Result<Lookup, GeocodeError> {
        let mut params = vec![("address", address), ("key", self.api_key.as_str())];
        if let Some(region) = &self.region {
            params.push(("region", region.as_str()));
        }

        let resp = self.client.get(&self.base_url).query(&params).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().to_string(),
                message: None,
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Geocoding API JSON response.
fn parse_response(body: &serde_json::Value) -> Result<Lookup, GeocodeError> {
    let status = body
        .get("status")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| GeocodeError::Parse {
            message: "Geocoding response missing 'status'".to_string(),
        })?;

    match status {
        STATUS_OK => {}
        STATUS_ZERO_RESULTS => return Ok(Lookup::NoMatch),
        other => {
            return Err(GeocodeError::Status {
                status: other.to_string(),
                message: body
                    .get("error_message")
                    .and_then(serde_json::Value::as_str)
                    .map(String::from),
            });
        }
    }

    let location = body
        .pointer("/results/0/geometry/location")
        .ok_or_else(|| GeocodeError::Parse {
            message: "OK response without results[0].geometry.location".to_string(),
        })?;

    let lat = location["lat"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "latitude is not a number".to_string(),
        })?;
    let lng = location["lng"]
        .as_f64()
        .ok_or_else(|| GeocodeError::Parse {
            message: "longitude is not a number".to_string(),
        })?;

    Ok(Lookup::Match(Coordinate::new(lat, lng)))
}
