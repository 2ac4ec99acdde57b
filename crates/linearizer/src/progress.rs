//! Progress observer interface.

use std::sync::Arc;

/// Receives notifications from a running linearization.
///
/// The engine itself never prints; callers that want feedback inject an
/// implementation of this trait.
pub trait ProgressReporter: Send + Sync {
    /// Called every `progress_report_interval` processed entries, and once
    /// more when the run finishes.
    fn report(&self, processed: u64, skipped: u64);

    /// Called when an entry could not be read or decoded.
    fn report_error(&self, filename: &str, error: &str);
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn report(&self, processed: u64, skipped: u64) {
        (**self).report(processed, skipped)
    }

    fn report_error(&self, filename: &str, error: &str) {
        (**self).report_error(filename, error)
    }
}
