//! Error types for archive linearization.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for linearization runs.
///
/// Only setup failures surface through this type. Failures while reading a
/// single entry are absorbed into the run statistics as [`EntryError`]s.
#[derive(Debug, Error)]
pub enum LinearizeError {
    /// Archive file not found at the specified path.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is not a readable, intact ZIP archive.
    #[error("Invalid archive {path}: {reason}")]
    InvalidArchive {
        /// Path that failed validation
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// The output file could not be created or written.
    #[error("Failed to write output {path}: {source}")]
    Output {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The processing settings are unusable.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// The run was cancelled through its cancel flag.
    #[error("Cancelled by user")]
    Cancelled,

    /// An I/O error occurred outside of output writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl LinearizeError {
    pub(crate) fn invalid_archive(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::InvalidArchive {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output(path: &std::path::Path, source: io::Error) -> Self {
        Self::Output {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A decoder could not turn entry bytes into text.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Failure to produce text for a single archive entry.
///
/// Never fatal: the engine records the entry as failed and moves on.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The entry could not be read out of the archive (bad CRC, unsupported
    /// compression, encryption, truncated data).
    #[error("{0}")]
    Read(String),

    /// The configured decoder rejected the entry bytes.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<zip::result::ZipError> for EntryError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Read(e.to_string())
    }
}

impl From<io::Error> for EntryError {
    fn from(e: io::Error) -> Self {
        Self::Read(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_path() {
        let err = LinearizeError::NotFound(PathBuf::from("missing.zip"));
        assert_eq!(err.to_string(), "Archive not found: missing.zip");
    }

    #[test]
    fn test_invalid_archive_keeps_cause() {
        let err = LinearizeError::invalid_archive(std::path::Path::new("a.zip"), "bad CRC");
        assert_eq!(err.to_string(), "Invalid archive a.zip: bad CRC");
    }

    #[test]
    fn test_entry_error_displays_decode_message() {
        let err: EntryError = DecodeError("not utf-8".to_string()).into();
        assert_eq!(err.to_string(), "not utf-8");
    }
}
