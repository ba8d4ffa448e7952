//! Reads the address records to geocode.
//!
//! Input files carry at least `practice_code`, `short_address` and
//! `long_address` columns. Records are read once per run and never
//! modified.

use std::collections::BTreeSet;
use std::path::Path;

use duckdb::Connection;
use qof_map_geocoder_models::AddressRecord;

use crate::{DbError, sql_path};

/// Loads every practice in `path` as an [`AddressRecord`].
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or lacks the expected
/// columns.
pub fn load_address_records(conn: &Connection, path: &Path) -> Result<Vec<AddressRecord>, DbError> {
    let sql = format!(
        "SELECT practice_code, short_address, long_address
         FROM read_parquet({})",
        sql_path(path)?
    );
    query_records(conn, &sql)
}

/// Loads only the practices in `path` whose `lat` or `lon` is null.
///
/// # Errors
///
/// Returns [`DbError`] if the file cannot be read or lacks the expected
/// columns.
pub fn load_missing_records(conn: &Connection, path: &Path) -> Result<Vec<AddressRecord>, DbError> {
    let sql = format!(
        "SELECT practice_code, short_address, long_address
         FROM read_parquet({})
         WHERE lat IS NULL OR lon IS NULL",
        sql_path(path)?
    );
    query_records(conn, &sql)
}

/// Runs a `(practice_code, short_address, long_address)` query.
///
/// Null addresses become empty strings (the geocoder treats them as a
/// no-match); rows without a practice code are skipped, and repeated codes
/// keep their first row.
fn query_records(conn: &Connection, sql: &str) -> Result<Vec<AddressRecord>, DbError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    })?;

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut records = Vec::new();
    let mut skipped = 0u64;

    for row in rows {
        let (code, short, long) = row?;

        let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
            skipped += 1;
            continue;
        };

        if !seen.insert(code.clone()) {
            log::warn!("Duplicate practice code '{code}'; keeping the first row");
            continue;
        }

        records.push(AddressRecord::new(
            code,
            short.unwrap_or_default(),
            long.unwrap_or_default(),
        ));
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows without a practice code");
    }

    log::info!("Loaded {} address records", records.len());

    Ok(records)
}
