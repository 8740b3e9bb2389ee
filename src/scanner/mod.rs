//! Input discovery for OCR text files.
//!
//! The OCR engine runs upstream and leaves its recognized text behind as
//! files. This module turns the CLI inputs (files or directories) into an
//! ordered list of text files that pass the configured filters.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for input scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["txt"])
    pub extensions: Vec<String>,
    /// Names to skip while walking directories
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Maximum number of files to return
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string()],
            excludes: Vec::new(),
            max_file_size: 1024 * 1024,
            max_files: None,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
        }
    }
}

/// An OCR text file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub size: u64,
}

impl ScannedFile {
    /// Read the recognized text. Invalid UTF-8 is replaced rather than
    /// rejected, since OCR output is noisy anyway.
    pub fn read_text(&self) -> Result<String> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Scanner for OCR text inputs.
pub struct InputScanner {
    config: ScanConfig,
}

impl InputScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect text files from the given inputs.
    ///
    /// Explicit files are taken as given; directories are walked and
    /// filtered. The result is sorted by path and deduplicated.
    pub fn scan(&self, inputs: &[PathBuf]) -> Result<Vec<ScannedFile>> {
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                self.walk_dir(input, &mut files);
            } else {
                let metadata = fs::metadata(input)
                    .with_context(|| format!("Cannot access input {}", input.display()))?;
                files.push(ScannedFile {
                    path: input.clone(),
                    size: metadata.len(),
                });
            }
        }

        files.sort();
        files.dedup_by(|a, b| a.path == b.path);

        if let Some(max) = self.config.max_files {
            if files.len() > max {
                warn!("Found {} input files, keeping the first {}", files.len(), max);
                files.truncate(max);
            }
        }

        Ok(files)
    }

    /// Check if a file found while walking matches scan criteria.
    pub fn matches(&self, path: &Path, size: u64) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self
            .config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        {
            return false;
        }

        if size > self.config.max_file_size {
            debug!("Skipping {} ({} bytes)", path.display(), size);
            return false;
        }

        true
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        // The root of the walk is never excluded.
        if entry.depth() == 0 {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }

    fn walk_dir(&self, dir: &Path, files: &mut Vec<ScannedFile>) {
        let walker = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Cannot read directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    debug!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            if self.matches(entry.path(), size) {
                files.push(ScannedFile {
                    path: entry.into_path(),
                    size,
                });
            }
        }
    }
}
