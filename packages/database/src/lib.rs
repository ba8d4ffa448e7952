#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` storage for the practice geocoding pipeline.
//!
//! All inputs and outputs are parquet files; `DuckDB` is only used as an
//! in-process query engine over them:
//!
//! - [`contacts`] builds the practice contact list (with short and long
//!   addresses) from the NHS practice and QOF mapping CSVs.
//! - [`records`] reads [`AddressRecord`]s to geocode from a contact list.
//! - [`coordinates`] writes the coordinate table and back-fills missing
//!   coordinates into an existing practice table.
//!
//! [`AddressRecord`]: qof_map_geocoder_models::AddressRecord

pub mod contacts;
pub mod coordinates;
pub mod paths;
pub mod records;

use std::path::Path;

use duckdb::Connection;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` query error.
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens an in-memory `DuckDB` connection for querying parquet/CSV files.
///
/// # Errors
///
/// Returns [`DbError`] if the connection cannot be created.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("SET threads = 4;")?;
    Ok(conn)
}

/// Renders a filesystem path as a single-quoted SQL string literal.
///
/// `COPY ... TO` and file-reading table functions take literal paths, so
/// embedded quotes are doubled.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if the path is not valid UTF-8.
pub(crate) fn sql_path(path: &Path) -> Result<String, DbError> {
    let s = path.to_str().ok_or_else(|| DbError::Conversion {
        message: format!("Path is not valid UTF-8: {}", path.display()),
    })?;
    Ok(format!("'{}'", s.replace('\'', "''")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_paths() {
        assert_eq!(
            sql_path(Path::new("/tmp/o'brien/file.parquet")).unwrap(),
            "'/tmp/o''brien/file.parquet'"
        );
    }
}
