#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for pipeline artifacts.
//!
//! Defaults are relative to the project root's `data/` directory; the CLI
//! may point them at another directory instead.

use std::path::{Path, PathBuf};

/// File name of the practice contact list.
pub const CONTACT_INFO_FILE: &str = "GP_contact_info.parquet";

/// File name of the coordinate table.
pub const COORDINATES_FILE: &str = "practice_coordinates.parquet";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the default `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the contact list path inside `dir`.
#[must_use]
pub fn contact_info_path(dir: &Path) -> PathBuf {
    dir.join(CONTACT_INFO_FILE)
}

/// Returns the coordinate table path inside `dir`.
#[must_use]
pub fn coordinates_path(dir: &Path) -> PathBuf {
    dir.join(COORDINATES_FILE)
}

/// Appends `suffix` to the file stem, keeping the extension.
///
/// `practices.parquet` with suffix `_new` becomes `practices_new.parquet`.
#[must_use]
pub fn with_stem_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(file_name)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensures the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_stem_suffix() {
        assert_eq!(
            with_stem_suffix(Path::new("/data/gp_location_info.parquet"), "_new"),
            PathBuf::from("/data/gp_location_info_new.parquet")
        );
    }

    #[test]
    fn appends_stem_suffix_without_extension() {
        assert_eq!(
            with_stem_suffix(Path::new("coords"), "_new"),
            PathBuf::from("coords_new")
        );
    }

    #[test]
    fn artifact_paths_live_in_dir() {
        let dir = Path::new("/out");
        assert_eq!(
            contact_info_path(dir),
            PathBuf::from("/out/GP_contact_info.parquet")
        );
        assert_eq!(
            coordinates_path(dir),
            PathBuf::from("/out/practice_coordinates.parquet")
        );
    }
}
