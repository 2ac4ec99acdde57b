//! Command-line interface for archive linearization.
//!
//! Flattens a local ZIP archive, or a GitHub repository / pull request
//! downloaded on the fly, into a single text file.

mod github;
mod reporter;

use clap::Parser;
use github::{DownloadedArchive, GitHubClient};
use linearizer::types::DEFAULT_DELIMITER;
use linearizer::{ExtensionClassifier, Linearizer, ProcessingSettings, ProcessingStatistics, Utf8Decoder};
use reporter::ConsoleReporter;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "zip-linearizer")]
#[command(version, about = "Linearize ZIP archive contents into a single text file", long_about = None)]
#[command(after_help = "Examples:\n  \
  zip-linearizer archive.zip\n  \
  zip-linearizer archive.zip -o output.txt\n  \
  zip-linearizer https://github.com/owner/repo\n  \
  zip-linearizer https://github.com/owner/repo/tree/main\n  \
  zip-linearizer https://github.com/owner/repo/pull/123")]
struct Cli {
    /// Path to a ZIP file or a GitHub repository URL
    source: String,

    /// Output file (default: <archive>.linearized.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Delimiter between files
    #[arg(short, long, default_value = DEFAULT_DELIMITER)]
    delimiter: String,

    /// Rule line written under every file header (default: 80 '=')
    #[arg(long)]
    header_separator: Option<String>,

    /// Report progress every N processed files
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    progress_interval: u64,

    /// Verbose output (debug logging)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Keep the downloaded archive of a GitHub repository
    #[arg(long)]
    keep_temp: bool,

    /// Print statistics as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn is_github_source(&self) -> bool {
        is_github_source(&self.source)
    }

    fn settings(&self) -> ProcessingSettings {
        let settings = ProcessingSettings::default()
            .with_delimiter(self.delimiter.clone())
            .with_progress_report_interval(self.progress_interval);
        match &self.header_separator {
            Some(separator) => settings.with_header_separator(separator.clone()),
            None => settings,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match run(&cli).await {
        Ok(stats) if stats.has_errors() => process::exit(1),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<ProcessingStatistics, Box<dyn std::error::Error>> {
    if !cli.quiet {
        if cli.is_github_source() {
            eprintln!("Processing: GitHub repository: {}", cli.source);
        } else {
            eprintln!("Processing: {}", cli.source);
        }
    }

    let downloaded = if cli.is_github_source() {
        info!(url = %cli.source, "GitHub URL detected");
        let client = GitHubClient::new()?;
        let archive = client
            .download_from_url(&cli.source)
            .await
            .map_err(|e| format!("Error working with GitHub repository: {}", e))?;
        Some(archive)
    } else {
        None
    };

    let archive_path = match &downloaded {
        Some(archive) => archive.path().to_path_buf(),
        None => PathBuf::from(&cli.source),
    };
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&archive_path, downloaded.as_ref()));

    let result = handle_linearize(cli, archive_path, output_path.clone()).await;

    if let Some(archive) = downloaded {
        release_download(archive, cli.keep_temp);
    }

    let stats = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if !cli.quiet {
        eprintln!("\nProcessing completed!");
        eprintln!("{}", stats);
        eprintln!("Result saved to: {}", output_path.display());
    }

    if stats.has_errors() {
        warn!(files = ?stats.error_filenames, "Some files could not be read");
    }
    Ok(stats)
}

async fn handle_linearize(
    cli: &Cli,
    archive_path: PathBuf,
    output_path: PathBuf,
) -> Result<ProcessingStatistics, Box<dyn std::error::Error>> {
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel_flag.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed))?;

    let reporter = Arc::new(ConsoleReporter::new(cli.quiet || cli.json));
    let linearizer = Linearizer::new(ExtensionClassifier::new(), Utf8Decoder, cli.settings())
        .with_reporter(reporter.clone())
        .with_cancel_flag(cancel_flag);

    let result =
        tokio::task::spawn_blocking(move || linearizer.process(&archive_path, &output_path)).await;
    reporter.finish();

    Ok(result??)
}

/// Remove (or keep) the temporary archive; failures only warn.
fn release_download(archive: DownloadedArchive, keep: bool) {
    if keep {
        match archive.keep() {
            Ok(path) => info!(path = %path.display(), "Downloaded archive kept"),
            Err(e) => warn!("Failed to keep temporary file: {}", e),
        }
        return;
    }

    match archive.close() {
        Ok(()) => debug!("Temporary file deleted"),
        Err(e) => warn!("Failed to delete temporary file: {}", e),
    }
}

fn is_github_source(source: &str) -> bool {
    source.to_lowercase().contains("github.com")
        || source.starts_with("http://")
        || source.starts_with("https://")
}

/// `repo.zip` becomes `repo.linearized.txt`; downloads are named after the
/// repository and branch, in the current directory.
fn default_output_path(archive_path: &Path, downloaded: Option<&DownloadedArchive>) -> PathBuf {
    match downloaded {
        Some(archive) => PathBuf::from(format!("{}.linearized.txt", archive.stem())),
        None => archive_path.with_extension("linearized.txt"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["zip-linearizer", "archive.zip"]).unwrap();
        assert_eq!(cli.delimiter, "\n---\n");
        assert_eq!(cli.progress_interval, 10);
        assert_eq!(cli.settings(), ProcessingSettings::default());
        assert!(!cli.is_github_source());
    }

    #[test]
    fn test_custom_settings() {
        let cli = Cli::try_parse_from([
            "zip-linearizer",
            "archive.zip",
            "-d",
            "###",
            "--header-separator",
            "----",
            "--progress-interval",
            "5",
        ])
        .unwrap();

        let settings = cli.settings();
        assert_eq!(settings.delimiter, "###");
        assert_eq!(settings.header_separator, "----");
        assert_eq!(settings.progress_report_interval, 5);
    }

    #[test]
    fn test_zero_progress_interval_rejected() {
        let result =
            Cli::try_parse_from(["zip-linearizer", "archive.zip", "--progress-interval", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Cli::try_parse_from(["zip-linearizer", "archive.zip", "-v", "-q"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_github_source() {
        assert!(is_github_source("https://github.com/owner/repo"));
        assert!(is_github_source("GitHub.com/owner/repo"));
        assert!(is_github_source("http://example.com/archive"));
        assert!(!is_github_source("archive.zip"));
        assert!(!is_github_source("./downloads/repo-main.zip"));
    }

    #[test]
    fn test_default_output_path_for_local_archive() {
        assert_eq!(
            default_output_path(Path::new("dir/repo.zip"), None),
            PathBuf::from("dir/repo.linearized.txt")
        );
        assert_eq!(
            default_output_path(Path::new("archive"), None),
            PathBuf::from("archive.linearized.txt")
        );
    }
}
