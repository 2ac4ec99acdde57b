//! Type definitions for archive linearization.

use crate::error::LinearizeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default delimiter written between consecutive emitted entries.
pub const DEFAULT_DELIMITER: &str = "\n---\n";

/// Default progress report interval, in processed entries.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Settings for a single linearization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSettings {
    /// Inserted between consecutive emitted entries, never before the first
    /// or after the last
    pub delimiter: String,

    /// Rule line written under every `File: <name>` header
    pub header_separator: String,

    /// Report progress every N processed entries (must be at least 1)
    pub progress_report_interval: u64,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            header_separator: "=".repeat(80),
            progress_report_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ProcessingSettings {
    /// Sets the text written between consecutive entries.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Sets the rule line written under each file header.
    pub fn with_header_separator(mut self, separator: impl Into<String>) -> Self {
        self.header_separator = separator.into();
        self
    }

    /// Sets how many processed entries pass between progress reports.
    pub fn with_progress_report_interval(mut self, interval: u64) -> Self {
        self.progress_report_interval = interval;
        self
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), LinearizeError> {
        if self.progress_report_interval == 0 {
            return Err(LinearizeError::InvalidSettings(
                "progress report interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Statistics about a completed linearization run.
///
/// At the end of a run `error_filenames.len() == error_files`, and
/// `processed_files + skipped_files + error_files == total_files` unless the
/// archive holds text entries with an empty body: those keep their header in
/// the output but are counted in none of the three buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStatistics {
    /// Number of non-directory entries in the archive
    pub total_files: u64,

    /// Text entries written with a non-empty body
    pub processed_files: u64,

    /// Entries not classified as text
    pub skipped_files: u64,

    /// Text entries that could not be read or decoded
    pub error_files: u64,

    /// Size of the archive file on disk, in bytes
    pub total_size: u64,

    /// UTF-8 byte length of all written entry bodies
    pub processed_size: u64,

    /// Names of failed entries, in processing order
    pub error_filenames: Vec<String>,
}

impl ProcessingStatistics {
    /// Whether any entry failed during the run.
    pub fn has_errors(&self) -> bool {
        self.error_files > 0
    }

    pub(crate) fn record_error(&mut self, name: &str) {
        self.error_files += 1;
        self.error_filenames.push(name.to_string());
    }
}

impl fmt::Display for ProcessingStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total files: {}", self.total_files)?;
        writeln!(f, "Processed: {}", self.processed_files)?;
        writeln!(f, "Skipped: {}", self.skipped_files)?;
        writeln!(f, "Errors: {}", self.error_files)?;
        writeln!(f, "Archive size: {}", format_size(self.total_size))?;
        write!(f, "Processed data: {}", format_size(self.processed_size))
    }
}

/// Formats a byte count with 1024-based units and two decimals.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    for unit in UNITS {
        // Escalate once the value would print as 1024.00 in this unit.
        if (size * 100.0).round() / 100.0 < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ProcessingSettings::default();
        assert_eq!(settings.delimiter, "\n---\n");
        assert_eq!(settings.header_separator.len(), 80);
        assert!(settings.header_separator.chars().all(|c| c == '='));
        assert_eq!(settings.progress_report_interval, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let settings = ProcessingSettings::default().with_progress_report_interval(0);
        assert!(matches!(
            settings.validate(),
            Err(LinearizeError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(512), "512.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_size(1024 * 1024 - 1), "1.00 MB");
        assert_eq!(format_size(1024 * 1024 - 10), "1023.99 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024 * 1024), "2.00 TB");
    }

    #[test]
    fn test_render_summary() {
        let stats = ProcessingStatistics {
            total_files: 10,
            processed_files: 5,
            skipped_files: 3,
            error_files: 2,
            total_size: 2048,
            processed_size: 1024,
            error_filenames: vec!["a.py".to_string(), "b.py".to_string()],
        };

        assert_eq!(
            stats.to_string(),
            "Total files: 10\n\
             Processed: 5\n\
             Skipped: 3\n\
             Errors: 2\n\
             Archive size: 2.00 KB\n\
             Processed data: 1.00 KB"
        );
        assert!(stats.has_errors());
    }

    #[test]
    fn test_record_error_keeps_counts_in_step() {
        let mut stats = ProcessingStatistics::default();
        stats.record_error("first.py");
        stats.record_error("second.py");

        assert_eq!(stats.error_files, 2);
        assert_eq!(stats.error_filenames, vec!["first.py", "second.py"]);
    }
}
