//! Two-phase batch orchestration.
//!
//! [`run`] resolves every record concurrently through a bounded pool, then
//! sweeps the failures one at a time. Rate-limit rejections cluster when
//! many requests are in flight; a slow sequential pass afterwards recovers
//! most of them without lowering the batch's overall throughput.
//!
//! Both phases call [`resolve_all`] with the same [`GeocodeClient`]; only the
//! [`ConcurrencyMode`] and the retry policy differ.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt as _};
use qof_map_geocoder_models::{AddressRecord, BatchResult, GeocodeOutcome};

use crate::client::GeocodeClient;
use crate::progress::ProgressCallback;
use crate::retry::RetryPolicy;

/// How [`resolve_all`] schedules resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// At most `limit` resolutions in flight at once. A limit of 0 is
    /// treated as 1.
    Concurrent {
        /// Maximum simultaneous resolutions.
        limit: usize,
    },
    /// One resolution at a time, in input order.
    Sequential,
}

/// Tuning for a full [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum in-flight resolutions during the concurrent phase.
    pub concurrency_limit: usize,
    /// Attempts and backoff used by both phases.
    pub policy: RetryPolicy,
    /// Pause before every request in the recovery phase.
    pub recovery_pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 10,
            policy: RetryPolicy::default(),
            recovery_pause: Duration::from_millis(20),
        }
    }
}

/// Resolves every record, producing exactly one outcome per record.
///
/// In [`ConcurrencyMode::Concurrent`] outcomes are returned in completion
/// order; in [`ConcurrencyMode::Sequential`] they follow input order.
pub async fn resolve_all(
    client: &GeocodeClient,
    records: &[AddressRecord],
    mode: ConcurrencyMode,
    policy: &RetryPolicy,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Vec<GeocodeOutcome> {
    resolve_indexed(client, records, mode, policy, progress)
        .await
        .into_iter()
        .map(|(_, outcome)| outcome)
        .collect()
}

/// Like [`resolve_all`], pairing each outcome with its record's index in
/// `records`.
async fn resolve_indexed(
    client: &GeocodeClient,
    records: &[AddressRecord],
    mode: ConcurrencyMode,
    policy: &RetryPolicy,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> Vec<(usize, GeocodeOutcome)> {
    match mode {
        ConcurrencyMode::Concurrent { limit } => {
            stream::iter(records.iter().enumerate().map(|(index, record)| async move {
                let outcome = client.resolve_with_fallback(record, policy).await;
                if let Some(p) = progress {
                    p.inc(1);
                }
                (index, outcome)
            }))
            .buffer_unordered(limit.max(1))
            .collect()
            .await
        }
        ConcurrencyMode::Sequential => {
            let mut outcomes = Vec::with_capacity(records.len());
            for (index, record) in records.iter().enumerate() {
                outcomes.push((index, client.resolve_with_fallback(record, policy).await));
                if let Some(p) = progress {
                    p.inc(1);
                }
            }
            outcomes
        }
    }
}

/// Geocodes a batch of records.
///
/// 1. Resolves every record with at most `options.concurrency_limit`
///    resolutions in flight.
/// 2. Retries each unresolved record sequentially, pausing
///    `options.recovery_pause` before every request.
///
/// Never fails: records that cannot be geocoded are reported in
/// [`BatchResult::unresolved`] with the last error kind.
pub async fn run(
    client: &GeocodeClient,
    records: &[AddressRecord],
    options: &BatchOptions,
    progress: Option<&Arc<dyn ProgressCallback>>,
) -> BatchResult {
    log::info!(
        "Geocoding {} addresses (concurrency={}, attempts={})...",
        records.len(),
        options.concurrency_limit,
        options.policy.attempts(),
    );

    if let Some(p) = progress {
        p.set_total(records.len() as u64);
        p.set_message("Geocoding".to_string());
    }

    let indexed = resolve_indexed(
        client,
        records,
        ConcurrencyMode::Concurrent {
            limit: options.concurrency_limit,
        },
        &options.policy,
        progress,
    )
    .await;

    // Failures are retried by input position, so repeated ids stay
    // one outcome per record.
    let mut failed: Vec<usize> = indexed
        .iter()
        .filter(|(_, outcome)| !outcome.is_resolved())
        .map(|(index, _)| *index)
        .collect();
    failed.sort_unstable();

    let mut result = BatchResult::from_outcomes(indexed.into_iter().map(|(_, outcome)| outcome));

    log::info!(
        "Concurrent phase: {} resolved, {} unresolved",
        result.resolved_count(),
        result.unresolved_count(),
    );

    if result.unresolved.is_empty() {
        if let Some(p) = progress {
            p.finish(format!("Geocoded {}/{}", result.resolved_count(), records.len()));
        }
        return result;
    }

    let retry_records: Vec<AddressRecord> =
        failed.iter().map(|&index| records[index].clone()).collect();

    log::info!(
        "Retrying {} addresses sequentially...",
        retry_records.len()
    );

    if let Some(p) = progress {
        p.set_total(retry_records.len() as u64);
        p.set_message("Recovering".to_string());
    }

    let recovery_policy = options.policy.with_request_pause(options.recovery_pause);
    let retried = resolve_all(
        client,
        &retry_records,
        ConcurrencyMode::Sequential,
        &recovery_policy,
        progress,
    )
    .await;

    let recovered = BatchResult::from_outcomes(retried);
    result.recovered = recovered.resolved_count();
    result.resolved.extend(recovered.resolved);
    result.unresolved = recovered.unresolved;

    log::info!(
        "Recovery phase rescued {} addresses; {} resolved, {} unresolved in total",
        result.recovered,
        result.resolved_count(),
        result.unresolved_count(),
    );

    if let Some(p) = progress {
        p.finish(format!(
            "Geocoded {}/{} ({} rescued)",
            result.resolved_count(),
            records.len(),
            result.recovered,
        ));
    }

    result
}
