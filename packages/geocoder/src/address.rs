//! Builders for the two candidate address forms of a practice.
//!
//! NHS practice listings provide a name, up to four address lines and a
//! postcode, any of which may be missing:
//!
//! - **short**: `"{name}, {postcode}"`. Resolves quickly and unambiguously
//!   for most practices.
//! - **long**: name, lower-cased address lines and postcode. Used when
//!   the short form is ambiguous or unknown to the geocoder.
//!
//! Missing or blank components are skipped rather than leaving empty
//! segments (`"a, , b"`).

const SEPARATOR: &str = ", ";

/// Trims a component and collapses internal whitespace runs.
///
/// Returns `None` for missing or blank input.
#[must_use]
pub fn clean_component(raw: Option<&str>) -> Option<String> {
    let cleaned = raw?.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Joins the present components with `", "`.
#[must_use]
pub fn join_components<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> String {
    parts
        .into_iter()
        .filter_map(clean_component)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Builds the short address: practice name and postcode.
#[must_use]
pub fn short_address(name: Option<&str>, postcode: Option<&str>) -> String {
    join_components([name, postcode])
}

/// Builds the long address: practice name, lower-cased address lines, and
/// postcode.
#[must_use]
pub fn long_address(name: Option<&str>, lines: &[Option<&str>], postcode: Option<&str>) -> String {
    let lowered: Vec<Option<String>> = lines.iter().map(|l| l.map(str::to_lowercase)).collect();

    join_components(
        std::iter::once(name)
            .chain(lowered.iter().map(Option::as_deref))
            .chain(std::iter::once(postcode)),
    )
}
