//! Builds the practice contact list that feeds the geocoder.
//!
//! Joins two NHS Digital extracts:
//!
//! - the QOF practice mapping CSV (has a header; `practice_code`,
//!   `practice_name`), one row per practice in the QOF year, and
//! - the ODS `epraccur` CSV (no header), where `column00` is the practice
//!   code, `column04`..`column07` the address lines, `column09` the
//!   postcode and `column17` the telephone number.
//!
//! Every mapped practice is kept (LEFT JOIN) even when `epraccur` has no
//! address for it; its long address then degrades to the practice name.

use std::path::Path;

use duckdb::Connection;
use qof_map_geocoder::address::{clean_component, long_address, short_address};

use crate::{DbError, paths, sql_path};

/// One row of the contact list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeContact {
    /// Practice code.
    pub practice_code: String,
    /// Practice name from the QOF mapping file.
    pub practice_name: Option<String>,
    /// Lower-cased address lines 1-4.
    pub address_lines: [Option<String>; 4],
    /// Postcode.
    pub postcode: Option<String>,
    /// Name + postcode.
    pub short_address: String,
    /// Name + address lines + postcode.
    pub long_address: String,
    /// Telephone number.
    pub telephone_no: Option<String>,
}

/// Reads and joins the two extracts into [`PracticeContact`] rows, ordered
/// by practice code.
///
/// # Errors
///
/// Returns [`DbError`] if either CSV cannot be read or lacks the expected
/// columns.
pub fn read_contacts(
    conn: &Connection,
    address_csv: &Path,
    gp_list_csv: &Path,
) -> Result<Vec<PracticeContact>, DbError> {
    let sql = format!(
        "SELECT
            l.practice_code,
            l.practice_name,
            a.column04, a.column05, a.column06, a.column07,
            a.column09,
            a.column17
         FROM read_csv({gp_list}, header = true, all_varchar = true) l
         LEFT JOIN read_csv({address}, header = false, all_varchar = true) a
           ON l.practice_code = a.column00
         ORDER BY l.practice_code",
        gp_list = sql_path(gp_list_csv)?,
        address = sql_path(address_csv)?,
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        let mut fields: [Option<String>; 8] = Default::default();
        for (i, field) in fields.iter_mut().enumerate() {
            *field = row.get(i)?;
        }
        Ok(fields)
    })?;

    let mut contacts = Vec::new();
    for row in rows {
        let [code, name, l1, l2, l3, l4, postcode, telephone] = row?;
        let Some(practice_code) = clean_component(code.as_deref()) else {
            continue;
        };

        let raw_lines = [l1, l2, l3, l4];
        let line_refs: Vec<Option<&str>> = raw_lines.iter().map(Option::as_deref).collect();

        contacts.push(PracticeContact {
            short_address: short_address(name.as_deref(), postcode.as_deref()),
            long_address: long_address(name.as_deref(), &line_refs, postcode.as_deref()),
            address_lines: raw_lines
                .map(|l| clean_component(l.as_deref()).map(|s| s.to_lowercase())),
            practice_name: clean_component(name.as_deref()),
            postcode: clean_component(postcode.as_deref()),
            telephone_no: clean_component(telephone.as_deref()),
            practice_code,
        });
    }

    Ok(contacts)
}

/// Builds the contact list and writes it to `output` as parquet.
///
/// Columns: `practice_code, practice_name, address_line_1..4, postcode,
/// short_address, long_address, telephone_no`. Returns the number of rows
/// written.
///
/// # Errors
///
/// Returns [`DbError`] if the inputs cannot be read or the output cannot be
/// written.
pub fn build_contact_list(
    conn: &Connection,
    address_csv: &Path,
    gp_list_csv: &Path,
    output: &Path,
) -> Result<usize, DbError> {
    let contacts = read_contacts(conn, address_csv, gp_list_csv)?;
    paths::ensure_parent(output)?;

    conn.execute_batch(
        "CREATE OR REPLACE TABLE practice_contacts (
            practice_code VARCHAR NOT NULL,
            practice_name VARCHAR,
            address_line_1 VARCHAR,
            address_line_2 VARCHAR,
            address_line_3 VARCHAR,
            address_line_4 VARCHAR,
            postcode VARCHAR,
            short_address VARCHAR NOT NULL,
            long_address VARCHAR NOT NULL,
            telephone_no VARCHAR
        );",
    )?;

    conn.execute_batch("BEGIN TRANSACTION")?;
    {
        let mut stmt = conn.prepare(
            "INSERT INTO practice_contacts VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        for c in &contacts {
            let [l1, l2, l3, l4] = &c.address_lines;
            stmt.execute(duckdb::params![
                c.practice_code,
                c.practice_name,
                l1,
                l2,
                l3,
                l4,
                c.postcode,
                c.short_address,
                c.long_address,
                c.telephone_no,
            ])?;
        }
    }
    conn.execute_batch("COMMIT")?;

    conn.execute_batch(&format!(
        "COPY practice_contacts TO {} (FORMAT PARQUET)",
        sql_path(output)?
    ))?;

    log::info!(
        "Wrote {} practice contacts to {}",
        contacts.len(),
        output.display()
    );

    Ok(contacts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::load_address_records;

    /// An `epraccur` row: 18 columns, no header.
    fn epraccur_row(code: &str, lines: [&str; 4], postcode: &str, phone: &str) -> String {
        let mut cols = vec![String::new(); 18];
        cols[0] = code.to_string();
        cols[1] = "IGNORED NAME".to_string();
        for (i, line) in lines.iter().enumerate() {
            cols[4 + i] = (*line).to_string();
        }
        cols[9] = postcode.to_string();
        cols[17] = phone.to_string();
        cols.join(",")
    }

    fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let address_csv = dir.join("epraccur.csv");
        let gp_list_csv = dir.join("mapping_nhs_geographies_2324.csv");

        std::fs::write(
            &address_csv,
            [
                epraccur_row(
                    "A81001",
                    ["THE DENSHAM SURGERY", "THE HEALTH CENTRE", "LAWSON STREET", "STOCKTON"],
                    "TS18 1HU",
                    "01642 672351",
                ),
                epraccur_row("A81002", ["QUEENS PARK MEDICAL CENTRE", "", "", ""], "TS18 2AW", ""),
            ]
            .join("\n"),
        )
        .unwrap();

        std::fs::write(
            &gp_list_csv,
            "PRACTICE_CODE,PRACTICE_NAME\n\
             A81002,QUEENS PARK MEDICAL CENTRE\n\
             A81001,THE DENSHAM SURGERY\n\
             Z99999,UNLISTED PRACTICE\n",
        )
        .unwrap();

        (address_csv, gp_list_csv)
    }

    #[test]
    fn joins_and_builds_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let (address_csv, gp_list_csv) = write_inputs(dir.path());
        let conn = crate::open_in_memory().unwrap();

        let contacts = read_contacts(&conn, &address_csv, &gp_list_csv).unwrap();

        assert_eq!(contacts.len(), 3);
        let densham = &contacts[0];
        assert_eq!(densham.practice_code, "A81001");
        assert_eq!(densham.short_address, "THE DENSHAM SURGERY, TS18 1HU");
        assert_eq!(
            densham.long_address,
            "THE DENSHAM SURGERY, the densham surgery, the health centre, lawson street, stockton, TS18 1HU"
        );
        assert_eq!(densham.telephone_no.as_deref(), Some("01642 672351"));

        let queens = &contacts[1];
        assert_eq!(queens.address_lines[1], None);
        assert_eq!(queens.telephone_no, None);

        let unlisted = &contacts[2];
        assert_eq!(unlisted.practice_code, "Z99999");
        assert_eq!(unlisted.short_address, "UNLISTED PRACTICE");
        assert_eq!(unlisted.long_address, "UNLISTED PRACTICE");
        assert_eq!(unlisted.postcode, None);
    }

    #[test]
    fn contact_list_feeds_record_loader() {
        let dir = tempfile::tempdir().unwrap();
        let (address_csv, gp_list_csv) = write_inputs(dir.path());
        let output = crate::paths::contact_info_path(dir.path());
        let conn = crate::open_in_memory().unwrap();

        let written = build_contact_list(&conn, &address_csv, &gp_list_csv, &output).unwrap();
        assert_eq!(written, 3);

        let mut records = load_address_records(&conn, &output).unwrap();
        records.sort_by(|a, b| a.organisation_id.cmp(&b.organisation_id));
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].short_address, "QUEENS PARK MEDICAL CENTRE, TS18 2AW");
        assert_eq!(
            records[1].long_address,
            "QUEENS PARK MEDICAL CENTRE, queens park medical centre, TS18 2AW"
        );
    }
}
