//! Persists geocoding results.
//!
//! Two outputs are supported:
//!
//! - [`write_coordinates`]: a standalone `(practice_code, lat, lon)` table
//!   with one row per geocoded record, nulls where unresolved.
//! - [`apply_coordinates`]: back-fills resolved coordinates into an
//!   existing practice table that already has `lat`/`lon` columns.

use std::path::Path;

use duckdb::Connection;
use qof_map_geocoder_models::{BatchResult, ResolvedRecord};

use crate::{DbError, paths, sql_path};

/// Writes one `(practice_code, lat, lon)` row per record in `result` to a
/// parquet file at `output`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError`] if the table cannot be built or written.
pub fn write_coordinates(
    conn: &Connection,
    result: &BatchResult,
    output: &Path,
) -> Result<usize, DbError> {
    paths::ensure_parent(output)?;

    conn.execute_batch(
        "CREATE OR REPLACE TABLE practice_coordinates (
            practice_code VARCHAR,
            lat DOUBLE,
            lon DOUBLE
        );",
    )?;

    let rows = result.rows();

    conn.execute_batch("BEGIN TRANSACTION")?;
    {
        let mut stmt = conn.prepare("INSERT INTO practice_coordinates VALUES (?, ?, ?)")?;
        for row in &rows {
            stmt.execute(duckdb::params![
                row.organisation_id,
                row.latitude(),
                row.longitude(),
            ])?;
        }
    }
    conn.execute_batch("COMMIT")?;

    conn.execute_batch(&format!(
        "COPY practice_coordinates TO {} (FORMAT PARQUET)",
        sql_path(output)?
    ))?;

    log::info!("Wrote {} coordinate rows to {}", rows.len(), output.display());

    Ok(rows.len())
}

/// Loads the practice table at `target`, sets `lat`/`lon` for every
/// resolved record, and writes the updated table to `output`.
///
/// Practices not in `resolved` keep their existing values. Returns the
/// number of rows updated.
///
/// # Errors
///
/// Returns [`DbError`] if the target cannot be read, lacks `practice_code`,
/// `lat` or `lon` columns, or the output cannot be written.
pub fn apply_coordinates(
    conn: &Connection,
    target: &Path,
    resolved: &[ResolvedRecord],
    output: &Path,
) -> Result<usize, DbError> {
    paths::ensure_parent(output)?;

    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE practices AS SELECT * FROM read_parquet({})",
        sql_path(target)?
    ))?;

    let mut updated = 0usize;

    conn.execute_batch("BEGIN TRANSACTION")?;
    {
        let mut stmt =
            conn.prepare("UPDATE practices SET lat = ?, lon = ? WHERE practice_code = ?")?;
        for record in resolved {
            updated += stmt.execute(duckdb::params![
                record.latitude,
                record.longitude,
                record.organisation_id,
            ])?;
        }
    }
    conn.execute_batch("COMMIT")?;

    conn.execute_batch(&format!(
        "COPY practices TO {} (FORMAT PARQUET)",
        sql_path(output)?
    ))?;

    log::info!(
        "Updated {updated} practices and wrote {}",
        output.display()
    );

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use qof_map_geocoder_models::{AddressTier, ErrorKind, UnresolvedRecord};

    use super::*;

    fn resolved(id: &str, lat: f64, lon: f64) -> ResolvedRecord {
        ResolvedRecord {
            organisation_id: id.to_string(),
            latitude: lat,
            longitude: lon,
            address_used: AddressTier::Short,
        }
    }

    fn read_coords(conn: &Connection, path: &Path) -> Vec<(String, Option<f64>, Option<f64>)> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT practice_code, lat, lon FROM read_parquet({}) ORDER BY practice_code",
                sql_path(path).unwrap()
            ))
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn writes_one_row_per_record_with_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("practice_coordinates.parquet");
        let conn = crate::open_in_memory().unwrap();

        let result = BatchResult {
            resolved: vec![resolved("A1", 51.5, -0.1)],
            unresolved: vec![UnresolvedRecord {
                organisation_id: "B2".to_string(),
                last_error: ErrorKind::NoMatch,
            }],
            recovered: 0,
        };

        assert_eq!(write_coordinates(&conn, &result, &output).unwrap(), 2);
        assert_eq!(
            read_coords(&conn, &output),
            vec![
                ("A1".to_string(), Some(51.5), Some(-0.1)),
                ("B2".to_string(), None, None),
            ]
        );
    }

    #[test]
    fn back_fills_resolved_practices() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("gp_location_info.parquet");
        let output = paths::with_stem_suffix(&target, "_new");
        let conn = crate::open_in_memory().unwrap();

        conn.execute_batch(&format!(
            "COPY (
                SELECT * FROM (VALUES
                    ('A1', 'Surgery A', 50.0::DOUBLE, 1.0::DOUBLE),
                    ('B2', 'Surgery B', NULL, NULL),
                    ('C3', 'Surgery C', NULL, NULL)
                ) t(practice_code, practice_name, lat, lon)
            ) TO {} (FORMAT PARQUET)",
            sql_path(&target).unwrap()
        ))
        .unwrap();

        let updated = apply_coordinates(
            &conn,
            &target,
            &[resolved("B2", 53.0, -2.0), resolved("Z9", 0.0, 0.0)],
            &output,
        )
        .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(
            read_coords(&conn, &output),
            vec![
                ("A1".to_string(), Some(50.0), Some(1.0)),
                ("B2".to_string(), Some(53.0), Some(-2.0)),
                ("C3".to_string(), None, None),
            ]
        );
    }
}
