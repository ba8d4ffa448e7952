//! Progress reporting for geocoding runs.
//!
//! [`batch::run`](crate::batch::run) reports each phase as a total, one
//! tick per resolved or abandoned record, and a closing summary. The CLI
//! renders this with `indicatif`; tests pass [`NullProgress`] or `None`.

use std::sync::Arc;

/// Receives per-phase progress from a batch run.
///
/// One instance is shared by every in-flight resolution.
pub trait ProgressCallback: Send + Sync {
    /// Starts a phase of `total` records; the position resets to zero.
    fn set_total(&self, total: u64);

    /// Counts `delta` records as finished in the current phase.
    fn inc(&self, delta: u64);

    /// Names the current phase.
    fn set_message(&self, msg: String);

    /// Ends the run with a summary line.
    fn finish(&self, msg: String);
}

/// Discards all progress.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
