//! Up-front archive validation.
//!
//! Runs once before any output is created so that a missing or corrupt
//! archive never leaves a truncated output file behind.

use crate::error::LinearizeError;
use std::fs::File;
use std::io;
use std::path::Path;

/// Validates that `path` is an existing, intact ZIP archive.
///
/// Checks, in order:
/// - the path exists (else [`LinearizeError::NotFound`])
/// - the path is a regular file (else [`LinearizeError::InvalidArchive`])
/// - the file opens as a ZIP archive and every member decompresses with a
///   matching CRC (else [`LinearizeError::InvalidArchive`], with the
///   underlying cause in `reason`)
///
/// # Examples
///
/// ```no_run
/// use linearizer::validate_archive;
/// use std::path::Path;
///
/// validate_archive(Path::new("repo.zip"))?;
/// # Ok::<(), linearizer::LinearizeError>(())
/// ```
pub fn validate_archive(path: &Path) -> Result<(), LinearizeError> {
    if !path.exists() {
        return Err(LinearizeError::NotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(LinearizeError::invalid_archive(path, "path is not a file"));
    }

    test_archive(path).map_err(|e| LinearizeError::invalid_archive(path, e))
}

/// Reads every member to the end, which forces the CRC check.
fn test_archive(path: &Path) -> Result<(), String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| format!("not a valid ZIP archive: {}", e))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| e.to_string())?;
        io::copy(&mut entry, &mut io::sink())
            .map_err(|e| format!("entry '{}' failed integrity check: {}", entry.name(), e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_valid_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("valid.zip");

        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("test.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"content").unwrap();
        zip.finish().unwrap();

        assert!(validate_archive(&path).is_ok());
    }

    #[test]
    fn test_nonexistent_file() {
        let result = validate_archive(Path::new("nonexistent.zip"));
        assert!(matches!(result, Err(LinearizeError::NotFound(_))));
    }

    #[test]
    fn test_directory_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_archive(temp_dir.path());
        assert!(matches!(result, Err(LinearizeError::InvalidArchive { .. })));
    }

    #[test]
    fn test_text_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("invalid.zip");
        fs::write(&path, "This is not a zip file").unwrap();

        let result = validate_archive(&path);
        assert!(matches!(result, Err(LinearizeError::InvalidArchive { .. })));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.zip");
        File::create(&path).unwrap();

        let result = validate_archive(&path);
        assert!(matches!(result, Err(LinearizeError::InvalidArchive { .. })));
    }

    #[test]
    fn test_empty_archive_is_valid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.zip");
        zip::ZipWriter::new(File::create(&path).unwrap())
            .finish()
            .unwrap();

        assert!(validate_archive(&path).is_ok());
    }
}
