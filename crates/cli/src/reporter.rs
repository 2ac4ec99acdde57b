//! Console progress display.

use indicatif::{ProgressBar, ProgressStyle};
use linearizer::ProgressReporter;
use std::time::Duration;
use tracing::warn;

/// Spinner on stderr showing processed/skipped counts.
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, processed: u64, skipped: u64) {
        self.bar.set_message(format!(
            "Processed files: {}, skipped: {}",
            processed, skipped
        ));
    }

    fn report_error(&self, filename: &str, error: &str) {
        self.bar
            .suspend(|| warn!("Error reading {}: {}", filename, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_reporter_accepts_notifications() {
        let reporter = ConsoleReporter::new(true);
        reporter.report(10, 2);
        reporter.report_error("broken.py", "invalid checksum");
        assert_eq!(reporter.bar.message(), "Processed files: 10, skipped: 2");
        reporter.finish();
    }
}
