//! # Linearizer
//!
//! Flattens the contents of a ZIP archive into one linear text file.
//!
//! Every text entry is written as a header block followed by its content,
//! and consecutive entries are separated by a configurable delimiter:
//!
//! ```text
//! File: <entry-name>
//! <header-separator-line>
//!
//! <entry-content, newline-terminated>
//! <delimiter>
//! ```
//!
//! Entries are processed in ascending name order, so the output is
//! byte-identical across runs. Binary entries are skipped by name, and
//! entries that fail to read are recorded in the statistics without
//! aborting the run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use linearizer::{ExtensionClassifier, Linearizer, ProcessingSettings, Utf8Decoder};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = ProcessingSettings::default().with_delimiter("\n###\n");
//! let linearizer = Linearizer::new(ExtensionClassifier::new(), Utf8Decoder, settings);
//!
//! let stats = linearizer.process(Path::new("repo.zip"), Path::new("repo.linearized.txt"))?;
//! println!("{}", stats);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod decode;
pub mod error;
pub mod linearize;
pub mod progress;
pub mod types;
pub mod validate;

// Re-export main types
pub use classify::{ExtensionClassifier, TextClassifier};
pub use decode::{ContentDecoder, Utf8Decoder};
pub use error::{DecodeError, EntryError, LinearizeError};
pub use linearize::Linearizer;
pub use progress::ProgressReporter;
pub use types::{format_size, ProcessingSettings, ProcessingStatistics};
pub use validate::validate_archive;

use std::path::Path;

/// Linearize an archive with the default classifier, decoder and settings.
///
/// # Arguments
///
/// * `archive_path` - Path to the ZIP archive
/// * `output_path` - Path of the text file to create or overwrite
///
/// # Returns
///
/// Returns `ProcessingStatistics` describing the run on success.
///
/// # Errors
///
/// Returns an error if:
/// - The archive file doesn't exist or is corrupted
/// - The output file cannot be written
pub fn linearize(
    archive_path: &Path,
    output_path: &Path,
) -> Result<ProcessingStatistics, LinearizeError> {
    Linearizer::default().process(archive_path, output_path)
}
