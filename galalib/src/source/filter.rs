//! File filtering and discovery with glob pattern support.
//!
//! This module finds the files worth blaming: it walks the repository,
//! prunes dependency/build directories and drops anything matching the
//! built-in exclusions, user patterns, or the root `.gitignore`.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::GalaError;
use crate::Result;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    ".cache",
    "__pycache__",
    ".vscode",
    ".idea",
    ".vs",
    "dist",
    "build",
    ".next",
    ".nuxt",
];

/// File patterns excluded by default: lock files, binaries, media and other
/// content where line authorship means nothing.
#[rustfmt::skip]
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Lock files
    "*-lock.*", "*.lock", "Cargo.lock", "yarn.lock", "package-lock.json", "poetry.lock",
    // Images
    "*.gif", "*.png", "*.jpg", "*.jpeg", "*.webp", "*.ico", "*.tiff", "*.tif", "*.bmp", "*.svg",
    // Fonts
    "*.woff", "*.woff2", "*.ttf", "*.otf", "*.eot",
    // Media
    "*.mp4", "*.avi", "*.mov", "*.wmv", "*.flv", "*.webm", "*.mp3", "*.wav", "*.flac", "*.aac",
    "*.ogg",
    // Archives
    "*.zip", "*.tar", "*.tgz", "*.rar", "*.7z", "*.gz", "*.bz2", "*.xz",
    // Binaries
    "*.exe", "*.dll", "*.so", "*.dylib", "*.bin", "*.deb", "*.rpm", "*.dmg", "*.pkg", "*.msi",
    // Databases
    "*.db", "*.sqlite", "*.sqlite3", "*.mdb",
    // Documents
    "*.pdf", "*.doc", "*.docx", "*.xls", "*.xlsx", "*.ppt", "*.pptx",
    // Compiled
    "*.o", "*.obj", "*.class", "*.pyc", "*.pyo", "*.pyd", "*.a", "*.lib", "*.jar", "*.war",
    "*.ear",
    // Minified
    "*.min.js", "*.min.css", "*.min.html",
    // OS files
    ".DS_Store", "Thumbs.db", "desktop.ini", ".directory",
    // Editor files
    "*.swp", "*.swo", "*~", "*.tmp",
    // Logs
    "*.log", "*.logs",
    // Certificates
    "*.pem", "*.key", "*.p12", "*.pfx", "*.crt", "*.cer",
    // Backups
    "*.bak", "*.backup", "*.orig",
];

/// Configuration for file filtering.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Built-in and user-supplied exclusion globs
    pub exclude: Vec<Pattern>,
    /// Patterns read from `.gitignore`; also matched as path substrings
    pub gitignore: Vec<Pattern>,
    gitignore_raw: Vec<String>,
}

impl FilterConfig {
    /// Create an empty filter config (excludes nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter with [`DEFAULT_EXCLUDE_PATTERNS`] loaded.
    pub fn with_defaults() -> Self {
        let mut config = Self::default();
        for pattern in DEFAULT_EXCLUDE_PATTERNS {
            // The built-in list is known-good.
            if let Ok(pat) = Pattern::new(pattern) {
                config.exclude.push(pat);
            }
        }
        config
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        let pat = Pattern::new(pattern).map_err(|e| GalaError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.exclude.push(pat);
        Ok(self)
    }

    /// Add multiple exclude patterns.
    pub fn exclude_many<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            self = self.exclude(pattern.as_ref())?;
        }
        Ok(self)
    }

    /// Load patterns from `<root>/.gitignore`, if present.
    ///
    /// Comments, blank lines and negations are skipped; a trailing `/` is
    /// dropped. Lines that are not valid globs are still used as substrings.
    pub fn load_gitignore(mut self, root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(".gitignore");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(e) => return Err(e.into()),
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let pattern = line.strip_suffix('/').unwrap_or(line);
            if pattern.is_empty() {
                continue;
            }
            if let Ok(pat) = Pattern::new(pattern) {
                self.gitignore.push(pat);
            }
            self.gitignore_raw.push(pattern.to_string());
        }

        debug!(
            count = self.gitignore_raw.len(),
            "loaded .gitignore patterns"
        );
        Ok(self)
    }

    /// Check if a root-relative path should be left out.
    ///
    /// A path is excluded if any pattern matches its file name or its whole
    /// relative path; `.gitignore` entries also exclude any path containing
    /// them.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let path_str = relative.to_string_lossy();
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path_str.clone());

        let glob_hit = |pattern: &Pattern| {
            pattern.matches(&file_name) || pattern.matches(&path_str)
        };

        if self.exclude.iter().any(glob_hit) || self.gitignore.iter().any(glob_hit) {
            return true;
        }

        self.gitignore_raw
            .iter()
            .any(|raw| path_str.contains(raw.as_str()))
    }
}

/// Check if a directory should be skipped during traversal.
fn should_skip_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name)
}

/// Discover blameable files under `root`.
///
/// Returns paths relative to `root`, sorted for deterministic dispatch.
pub fn discover_files(root: impl AsRef<Path>, filter: &FilterConfig) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();

    if !root.exists() {
        return Err(GalaError::PathNotFound(root.to_path_buf()));
    }

    let walker = WalkDir::new(root).into_iter();
    let mut files = Vec::new();

    for entry in walker.filter_entry(|e| {
        if e.depth() == 0 {
            return true;
        }
        if e.file_type().is_dir() {
            let name = e.file_name().to_str().unwrap_or("");
            return !should_skip_dir(name);
        }
        true
    }) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };

        if !filter.is_excluded(&relative) {
            files.push(relative);
        }
    }

    files.sort();

    Ok(files)
}
