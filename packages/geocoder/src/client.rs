//! Retrying, tier-falling-back geocode client.
//!
//! [`GeocodeClient::resolve`] turns one address into a coordinate, retrying
//! retryable failures with exponential backoff and stopping immediately on a
//! definite no-match. [`GeocodeClient::resolve_with_fallback`] tries a
//! record's short address first and its long address second.
//!
//! The client never touches shared mutable state; concurrency limits are
//! enforced by [`crate::batch`].

use std::sync::Arc;

use qof_map_geocoder_models::{
    AddressRecord, AddressTier, Coordinate, ErrorKind, GeocodeOutcome, ResolvedRecord,
    UnresolvedRecord,
};

use crate::retry::RetryPolicy;
use crate::{GeocodeService, Lookup};

/// Wraps a [`GeocodeService`] with retry and fallback behaviour.
#[derive(Clone)]
pub struct GeocodeClient {
    service: Arc<dyn GeocodeService>,
}

impl GeocodeClient {
    /// Creates a client over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GeocodeService>) -> Self {
        Self { service }
    }

    /// Resolves a single address.
    ///
    /// Returns the first location on success, [`ErrorKind::NoMatch`] as soon
    /// as the service reports no match (or for a blank address), and
    /// [`ErrorKind::Exhausted`] once `policy.max_attempts` retryable
    /// failures have occurred.
    ///
    /// # Errors
    ///
    /// Returns the [`ErrorKind`] explaining why no coordinate was produced.
    pub async fn resolve(
        &self,
        address: &str,
        policy: &RetryPolicy,
    ) -> Result<Coordinate, ErrorKind> {
        if address.trim().is_empty() {
            return Err(ErrorKind::NoMatch);
        }

        let attempts = policy.attempts();

        for attempt in 0..attempts {
            if !policy.request_pause.is_zero() {
                tokio::time::sleep(policy.request_pause).await;
            }

            match self.service.lookup(address).await {
                Ok(Lookup::Match(coord)) => return Ok(coord),
                Ok(Lookup::NoMatch) => {
                    log::debug!("No match for '{address}'");
                    return Err(ErrorKind::NoMatch);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let delay = policy.backoff(attempt);
                        log::warn!(
                            "Geocode attempt {}/{attempts} for '{address}' failed: {e}; retrying in {delay:?}",
                            attempt + 1,
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        log::warn!("Geocode for '{address}' failed after {attempts} attempts: {e}");
                    }
                }
            }
        }

        Err(ErrorKind::Exhausted)
    }

    /// Resolves a record, trying the short address before the long one.
    ///
    /// The long address is only requested when the short one fails. When
    /// both fail the outcome carries the long-address error.
    pub async fn resolve_with_fallback(
        &self,
        record: &AddressRecord,
        policy: &RetryPolicy,
    ) -> GeocodeOutcome {
        let mut last_error = ErrorKind::NoMatch;

        for tier in AddressTier::FALLBACK_ORDER {
            match self.resolve(record.address(tier), policy).await {
                Ok(coord) => {
                    return GeocodeOutcome::Resolved(ResolvedRecord {
                        organisation_id: record.organisation_id.clone(),
                        latitude: coord.latitude,
                        longitude: coord.longitude,
                        address_used: tier,
                    });
                }
                Err(kind) => last_error = kind,
            }
        }

        GeocodeOutcome::Unresolved(UnresolvedRecord {
            organisation_id: record.organisation_id.clone(),
            last_error,
        })
    }
}
