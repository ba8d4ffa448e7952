//! Wires the database and geocoder crates into the CLI commands.
//!
//! Each command opens its own in-memory `DuckDB` connection; the geocoding
//! commands share one HTTP client and one progress bar per run.

use std::path::Path;
use std::sync::Arc;

use qof_map_cli_utils::{IndicatifProgress, MultiProgress};
use qof_map_database::{contacts, coordinates, records};
use qof_map_geocoder::batch::{self, BatchOptions};
use qof_map_geocoder::client::GeocodeClient;
use qof_map_geocoder::config::{ServiceConfig, google_service};
use qof_map_geocoder::google::{GoogleGeocoder, build_http_client};
use qof_map_geocoder_models::{AddressRecord, BatchResult};

/// Geocoding inputs that vary per invocation.
pub struct GeocodeSettings {
    /// Google Geocoding API key.
    pub api_key: String,
    /// Overrides the configured concurrency limit.
    pub concurrency: Option<usize>,
    /// Overrides the configured attempts per address form.
    pub retries: Option<u32>,
}

/// Builds the practice contact list.
///
/// # Errors
///
/// Returns an error if either CSV cannot be read or the output cannot be
/// written.
pub fn build_contacts(
    address_csv: &Path,
    gp_list_csv: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = qof_map_database::open_in_memory()?;
    let count = contacts::build_contact_list(&conn, address_csv, gp_list_csv, output)?;
    log::info!("Contact list ready: {count} practices");
    Ok(())
}

/// Geocodes every practice in `input` and writes the coordinate table.
///
/// # Errors
///
/// Returns an error if the input cannot be read, the HTTP client cannot be
/// built, or the output cannot be written. Per-practice lookup failures are
/// reported, not returned.
pub async fn geocode(
    multi: &MultiProgress,
    settings: &GeocodeSettings,
    input: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = qof_map_database::open_in_memory()?;
    let records = records::load_address_records(&conn, input)?;

    let result = run_batch(multi, settings, &records).await?;
    report(&result);

    coordinates::write_coordinates(&conn, &result, output)?;
    Ok(())
}

/// Geocodes practices in `target` that lack coordinates and writes the
/// updated table to `output`.
///
/// # Errors
///
/// Returns an error if the target cannot be read, the HTTP client cannot be
/// built, or the output cannot be written.
pub async fn fill_missing(
    multi: &MultiProgress,
    settings: &GeocodeSettings,
    target: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let conn = qof_map_database::open_in_memory()?;
    let records = records::load_missing_records(&conn, target)?;

    if records.is_empty() {
        log::info!("No practices are missing coordinates");
    }

    let result = run_batch(multi, settings, &records).await?;
    report(&result);

    let updated = coordinates::apply_coordinates(&conn, target, &result.resolved, output)?;
    log::info!("Filled coordinates for {updated} practices");
    Ok(())
}

async fn run_batch(
    multi: &MultiProgress,
    settings: &GeocodeSettings,
    records: &[AddressRecord],
) -> Result<BatchResult, Box<dyn std::error::Error>> {
    let config = google_service();
    let options = batch_options(&config, settings);

    let http = build_http_client(config.timeout())?;
    let service = GoogleGeocoder::from_config(http, &config, settings.api_key.clone());
    let client = GeocodeClient::new(Arc::new(service));

    log::info!("Using {} ({})", config.name, config.base_url);

    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding practices");
    Ok(batch::run(&client, records, &options, Some(&progress)).await)
}

/// Applies CLI overrides on top of the configured defaults.
fn batch_options(config: &ServiceConfig, settings: &GeocodeSettings) -> BatchOptions {
    let mut options = config.batch_options();
    if let Some(limit) = settings.concurrency {
        options.concurrency_limit = limit.max(1);
    }
    if let Some(retries) = settings.retries {
        options.policy.max_attempts = retries.max(1);
    }
    options
}

fn report(result: &BatchResult) {
    log::info!(
        "Geocoded {}/{} practices ({} unresolved, {} rescued by the sequential pass)",
        result.resolved_count(),
        result.total(),
        result.unresolved_count(),
        result.recovered,
    );

    for line in unresolved_lines(result) {
        log::warn!("{line}");
    }
}

/// One `"Unresolved <id>: <error kind>"` line per unresolved practice, sorted by id.
fn unresolved_lines(result: &BatchResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .unresolved
        .iter()
        .map(|u| format!("Unresolved {}: {}", u.organisation_id, u.last_error))
        .collect();
    lines.sort();
    lines
}
