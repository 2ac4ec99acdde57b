//! Name-based text file classification.
//!
//! Entries are never sniffed: an entry is text when its lower-cased suffix or
//! its lower-cased base name appears in the configured set. Misclassified
//! files are an accepted trade-off for speed.

use std::collections::HashSet;

/// Decides whether an archive entry should be emitted as text.
pub trait TextClassifier: Send + Sync {
    /// Returns `true` when `name` denotes a text file.
    fn is_text(&self, name: &str) -> bool;

    /// Returns a copy of the active extension/file name set.
    fn extensions(&self) -> HashSet<String>;
}

/// Built-in recognized suffixes and well-known file names.
const DEFAULT_EXTENSIONS: &[&str] = &[
    // Source code
    ".py", ".js", ".jsx", ".ts", ".tsx", ".java", ".c", ".cpp", ".h", ".hpp", ".cs", ".go",
    ".rb", ".php", ".swift", ".kt", ".scala", ".rs", ".m", ".mm",
    // Web
    ".html", ".css", ".scss", ".sass", ".less", ".json", ".xml", ".yaml", ".yml",
    // Configuration
    ".env", ".gitignore", ".dockerignore", ".editorconfig", ".eslintrc", ".babelrc",
    ".prettierrc", ".npmrc", ".env.example", ".env.local", ".env.development", ".toml",
    ".ini", ".cfg", ".conf", ".properties", ".lock", ".pom", ".gradle", ".sbt", ".cmake",
    "Makefile", ".makefile", "Dockerfile", ".dockerfile", ".gitattributes", ".gitconfig",
    ".htaccess", "nginx.conf", ".clang-format", ".clang-tidy", ".cmakelists.txt", ".flake8",
    ".pylintrc", ".mypy.ini", ".isort.cfg", ".bandit", ".coveragerc", "setup.cfg", "tox.ini",
    ".pro", ".qrc", ".ui",
    // Documentation
    ".md", ".markdown", ".txt", ".rst", ".rdoc", ".tex",
    // Data
    ".csv", ".tsv", ".sql", ".log",
];

/// Classifies entries by file suffix or exact base name, case-insensitively.
#[derive(Debug, Clone)]
pub struct ExtensionClassifier {
    extensions: HashSet<String>,
}

impl ExtensionClassifier {
    /// Creates a classifier over the built-in default set.
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }

    /// Creates a classifier over a caller-supplied set.
    ///
    /// Entries are either a leading-dot suffix (`.py`) or a bare file name
    /// (`Makefile`). Entries are case-folded here, so lookups stay
    /// case-insensitive on both sides.
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TextClassifier for ExtensionClassifier {
    fn is_text(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        let base = base_name(&lowered);

        if self.extensions.contains(base) {
            return true;
        }

        suffix(base).is_some_and(|s| self.extensions.contains(s))
    }

    fn extensions(&self) -> HashSet<String> {
        self.extensions.clone()
    }
}

/// Last slash-separated component of an entry name.
fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Suffix including its dot (`.py`). Dotfiles such as `.env` and names with a
/// trailing dot have none.
fn suffix(base: &str) -> Option<&str> {
    match base.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == base.len() => None,
        Some(idx) => Some(&base[idx..]),
    }
}
