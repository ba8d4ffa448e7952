#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for the practice geocoding pipeline.
//!
//! An [`AddressRecord`] is the unit of work: one organisation with a short
//! and a long candidate address. Every record fed into the pipeline ends up
//! as exactly one [`GeocodeOutcome`], and the outcomes of a run are
//! collected into a [`BatchResult`].

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// An organisation whose address still needs coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Organisation (practice) code. Unique within a batch.
    pub organisation_id: String,
    /// Name + postcode form of the address. Tried first.
    pub short_address: String,
    /// Full multi-line form of the address. Tried when the short form fails.
    pub long_address: String,
}

impl AddressRecord {
    /// Creates a new address record.
    #[must_use]
    pub fn new(
        organisation_id: impl Into<String>,
        short_address: impl Into<String>,
        long_address: impl Into<String>,
    ) -> Self {
        Self {
            organisation_id: organisation_id.into(),
            short_address: short_address.into(),
            long_address: long_address.into(),
        }
    }

    /// Returns the candidate address for the given tier.
    #[must_use]
    pub fn address(&self, tier: AddressTier) -> &str {
        match tier {
            AddressTier::Short => &self.short_address,
            AddressTier::Long => &self.long_address,
        }
    }
}

/// A resolved WGS84 location.
///
/// Unresolved locations are represented as `Option<Coordinate>::None`, so a
/// latitude can never be present without its longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude/longitude pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Which candidate address produced a match.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AddressTier {
    /// Practice name and postcode.
    Short,
    /// Practice name, address lines and postcode.
    Long,
}

impl AddressTier {
    /// Tiers in the order they are attempted.
    pub const FALLBACK_ORDER: [Self; 2] = [Self::Short, Self::Long];
}

/// Terminal reason an address could not be geocoded.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ErrorKind {
    /// The service confirmed there is no match for the address.
    NoMatch,
    /// Every attempt failed with a retryable error.
    Exhausted,
}

/// The single result produced for each [`AddressRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeocodeOutcome {
    /// The record was geocoded.
    Resolved(ResolvedRecord),
    /// Neither address tier could be geocoded.
    Unresolved(UnresolvedRecord),
}

impl GeocodeOutcome {
    /// Organisation code this outcome belongs to.
    #[must_use]
    pub fn organisation_id(&self) -> &str {
        match self {
            Self::Resolved(r) => &r.organisation_id,
            Self::Unresolved(u) => &u.organisation_id,
        }
    }

    /// Returns `true` if the record was geocoded.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A successfully geocoded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    /// Organisation code.
    pub organisation_id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// The tier whose address matched.
    pub address_used: AddressTier,
}

impl ResolvedRecord {
    /// Location of the record.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A record that could not be geocoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedRecord {
    /// Organisation code.
    pub organisation_id: String,
    /// Error from the last tier attempted.
    pub last_error: ErrorKind,
}

/// One row of the persisted coordinate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRow {
    /// Organisation code.
    pub organisation_id: String,
    /// Location, or `None` when the record is unresolved.
    pub coordinate: Option<Coordinate>,
}

impl CoordinateRow {
    /// Latitude, or `None` when unresolved.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.coordinate.map(|c| c.latitude)
    }

    /// Longitude, or `None` when unresolved.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.coordinate.map(|c| c.longitude)
    }
}

/// The terminal artifact of a geocoding run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Records that were geocoded, in either phase.
    pub resolved: Vec<ResolvedRecord>,
    /// Records that stayed unresolved after the recovery phase.
    pub unresolved: Vec<UnresolvedRecord>,
    /// How many records the recovery phase moved into `resolved`.
    pub recovered: usize,
}

impl BatchResult {
    /// Splits a set of outcomes into resolved and unresolved records.
    #[must_use]
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = GeocodeOutcome>) -> Self {
        let mut result = Self::default();
        for outcome in outcomes {
            match outcome {
                GeocodeOutcome::Resolved(r) => result.resolved.push(r),
                GeocodeOutcome::Unresolved(u) => result.unresolved.push(u),
            }
        }
        result
    }

    /// Number of geocoded records.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Number of records left without coordinates.
    #[must_use]
    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// Total number of records in the batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }

    /// One row per input record, sorted by organisation code. Unresolved
    /// records have no coordinate.
    #[must_use]
    pub fn rows(&self) -> Vec<CoordinateRow> {
        let mut rows: Vec<CoordinateRow> = self
            .resolved
            .iter()
            .map(|r| CoordinateRow {
                organisation_id: r.organisation_id.clone(),
                coordinate: Some(r.coordinate()),
            })
            .chain(self.unresolved.iter().map(|u| CoordinateRow {
                organisation_id: u.organisation_id.clone(),
                coordinate: None,
            }))
            .collect();
        rows.sort_by(|a, b| a.organisation_id.cmp(&b.organisation_id));
        rows
    }
}
