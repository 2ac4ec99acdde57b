//! Archive linearization engine.

use crate::classify::{ExtensionClassifier, TextClassifier};
use crate::decode::{ContentDecoder, Utf8Decoder};
use crate::error::{EntryError, LinearizeError};
use crate::progress::ProgressReporter;
use crate::types::{ProcessingSettings, ProcessingStatistics};
use crate::validate::validate_archive;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Name and position of an archive member, listed before iteration.
#[derive(Debug)]
struct EntryMeta {
    index: usize,
    name: String,
    is_dir: bool,
}

/// Flattens the text entries of a ZIP archive into one text file.
///
/// Collaborators are injected at construction; the engine keeps no global
/// state, so independent runs never interfere.
pub struct Linearizer {
    classifier: Box<dyn TextClassifier>,
    decoder: Box<dyn ContentDecoder>,
    settings: ProcessingSettings,
    reporter: Option<Box<dyn ProgressReporter>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl Default for Linearizer {
    fn default() -> Self {
        Self::new(
            ExtensionClassifier::new(),
            Utf8Decoder,
            ProcessingSettings::default(),
        )
    }
}

impl Linearizer {
    /// Creates an engine with the given classifier, decoder and settings.
    /// No progress observer or cancel flag is attached.
    pub fn new(
        classifier: impl TextClassifier + 'static,
        decoder: impl ContentDecoder + 'static,
        settings: ProcessingSettings,
    ) -> Self {
        Self {
            classifier: Box::new(classifier),
            decoder: Box::new(decoder),
            settings,
            reporter: None,
            cancel_flag: None,
        }
    }

    /// Attaches a progress observer.
    pub fn with_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Attaches a cancel flag, checked once per archive entry.
    pub fn with_cancel_flag(mut self, cancel_flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(cancel_flag);
        self
    }

    /// Settings this engine runs with.
    pub fn settings(&self) -> &ProcessingSettings {
        &self.settings
    }

    /// Linearize `archive_path` into `output_path`.
    ///
    /// The archive is validated before the output file is touched. Any
    /// existing file at `output_path` is truncated; missing parent
    /// directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings are invalid
    /// - The archive doesn't exist or is not an intact ZIP archive
    /// - The output file cannot be created or written
    /// - The run is cancelled
    ///
    /// Entries that fail to read or decode are not errors; they are counted
    /// in the returned statistics.
    pub fn process(
        &self,
        archive_path: &Path,
        output_path: &Path,
    ) -> Result<ProcessingStatistics, LinearizeError> {
        self.settings.validate()?;

        info!(archive = %archive_path.display(), "Starting archive processing");
        validate_archive(archive_path)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| LinearizeError::output(output_path, e))?;
            }
        }

        let total_size = fs::metadata(archive_path)?.len();
        let mut archive = ZipArchive::new(File::open(archive_path)?)
            .map_err(|e| LinearizeError::invalid_archive(archive_path, e))?;
        let entries = list_entries(&mut archive)
            .map_err(|e| LinearizeError::invalid_archive(archive_path, e))?;

        let mut out = OutputWriter::create(output_path)?;

        let mut stats = ProcessingStatistics {
            total_files: entries.iter().filter(|e| !e.is_dir).count() as u64,
            total_size,
            ..ProcessingStatistics::default()
        };

        for entry in &entries {
            self.check_cancelled()?;
            self.process_entry(&mut archive, entry, &mut out, &mut stats)?;
        }

        out.finish()?;

        if let Some(reporter) = &self.reporter {
            reporter.report(stats.processed_files, stats.skipped_files);
        }

        info!(
            processed = stats.processed_files,
            skipped = stats.skipped_files,
            errors = stats.error_files,
            output = %output_path.display(),
            "Processing completed"
        );
        Ok(stats)
    }

    fn process_entry(
        &self,
        archive: &mut ZipArchive<File>,
        entry: &EntryMeta,
        out: &mut OutputWriter,
        stats: &mut ProcessingStatistics,
    ) -> Result<(), LinearizeError> {
        if entry.is_dir {
            return Ok(());
        }

        if !self.classifier.is_text(&entry.name) {
            debug!(entry = %entry.name, "Skipping non-text entry");
            stats.skipped_files += 1;
            return Ok(());
        }

        if stats.processed_files > 0 {
            out.write(&self.settings.delimiter)?;
        }

        // The header stays even when the body turns out empty.
        out.write_header(&entry.name, &self.settings.header_separator)?;

        let content = match self.read_entry(archive, entry) {
            Ok(content) => content,
            Err(e) => {
                let message = e.to_string();
                warn!(entry = %entry.name, error = %message, "Error reading entry");
                stats.record_error(&entry.name);
                if let Some(reporter) = &self.reporter {
                    reporter.report_error(&entry.name, &message);
                }
                return Ok(());
            }
        };

        if content.is_empty() {
            return Ok(());
        }

        out.write(&content)?;
        stats.processed_size += content.len() as u64;
        if !content.ends_with('\n') {
            out.write("\n")?;
        }

        stats.processed_files += 1;
        debug!(entry = %entry.name, bytes = content.len(), "Processed entry");

        if let Some(reporter) = &self.reporter {
            if stats.processed_files % self.settings.progress_report_interval == 0 {
                reporter.report(stats.processed_files, stats.skipped_files);
            }
        }

        Ok(())
    }

    fn read_entry(
        &self,
        archive: &mut ZipArchive<File>,
        entry: &EntryMeta,
    ) -> Result<String, EntryError> {
        let mut file = archive.by_index(entry.index)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(self.decoder.decode(&bytes)?)
    }

    fn check_cancelled(&self) -> Result<(), LinearizeError> {
        match &self.cancel_flag {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(LinearizeError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Lists all members sorted by name, so output never depends on the
/// physical order inside the archive.
fn list_entries(archive: &mut ZipArchive<File>) -> zip::result::ZipResult<Vec<EntryMeta>> {
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let file = archive.by_index_raw(index)?;
        entries.push(EntryMeta {
            index,
            name: file.name().to_string(),
            is_dir: file.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Buffered output file that attaches its path to every write failure.
struct OutputWriter {
    inner: BufWriter<File>,
    path: PathBuf,
}

impl OutputWriter {
    fn create(path: &Path) -> Result<Self, LinearizeError> {
        let file = File::create(path).map_err(|e| LinearizeError::output(path, e))?;
        Ok(Self {
            inner: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    fn write(&mut self, text: &str) -> Result<(), LinearizeError> {
        self.inner
            .write_all(text.as_bytes())
            .map_err(|e| LinearizeError::output(&self.path, e))
    }

    fn write_header(&mut self, name: &str, separator: &str) -> Result<(), LinearizeError> {
        self.write(&format!("File: {}\n{}\n\n", name, separator))
    }

    fn finish(mut self) -> Result<(), LinearizeError> {
        self.inner
            .flush()
            .map_err(|e| LinearizeError::output(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    /// Fails on any entry whose bytes start with `!`.
    struct PickyDecoder;

    impl ContentDecoder for PickyDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
            if bytes.first() == Some(&b'!') {
                return Err(DecodeError("refused".to_string()));
            }
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_list_entries_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.zip");
        write_zip(&path, &[("b.txt", b"b"), ("a/c.txt", b"c"), ("a.txt", b"a")]);

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let names: Vec<_> = list_entries(&mut archive)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.txt", "a/c.txt", "b.txt"]);
    }

    #[test]
    fn test_decode_failure_leaves_orphan_header() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("test.zip");
        let output = temp_dir.path().join("out.txt");
        write_zip(&archive, &[("bad.txt", b"!nope"), ("good.txt", b"fine")]);

        let linearizer =
            Linearizer::new(ExtensionClassifier::new(), PickyDecoder, ProcessingSettings::default());
        let stats = linearizer.process(&archive, &output).unwrap();

        assert_eq!(stats.error_files, 1);
        assert_eq!(stats.error_filenames, vec!["bad.txt"]);
        assert_eq!(stats.processed_files, 1);

        let separator = "=".repeat(80);
        let expected = format!(
            "File: bad.txt\n{sep}\n\nFile: good.txt\n{sep}\n\nfine\n",
            sep = separator
        );
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
    }

    #[test]
    fn test_cancelled_run() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("test.zip");
        let output = temp_dir.path().join("out.txt");
        write_zip(&archive, &[("a.txt", b"a")]);

        let flag = Arc::new(AtomicBool::new(true));
        let result = Linearizer::default()
            .with_cancel_flag(flag)
            .process(&archive, &output);
        assert!(matches!(result, Err(LinearizeError::Cancelled)));
    }

    #[test]
    fn test_invalid_settings_rejected_before_validation() {
        let linearizer = Linearizer::new(
            ExtensionClassifier::new(),
            Utf8Decoder,
            ProcessingSettings::default().with_progress_report_interval(0),
        );
        let result = linearizer.process(Path::new("nonexistent.zip"), Path::new("out.txt"));
        assert!(matches!(result, Err(LinearizeError::InvalidSettings(_))));
    }
}
