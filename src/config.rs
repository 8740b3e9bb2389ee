//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.idstats.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".idstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Input scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Report output file. Unset prints to stdout.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Where records are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON array file holding all records.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Keep records in memory only.
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            in_memory: false,
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/id_cards.json")
}

/// Input scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum number of text files ingested per run.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File extensions treated as OCR output when walking directories.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory or file names skipped while walking.
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: Vec::new(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    1000
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1MB
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// JSON statistics snapshot
    Json,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Number of postal codes in the ranked table.
    #[serde(default = "default_top_postal_codes")]
    pub top_postal_codes: usize,

    /// Include the ranked postal code table.
    #[serde(default = "default_true")]
    pub include_ranking: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            top_postal_codes: default_top_postal_codes(),
            include_ranking: true,
        }
    }
}

fn default_top_postal_codes() -> usize {
    10
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where the CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }

        if let Some(ref data_file) = args.data_file {
            self.storage.data_file = data_file.clone();
        }
        if args.in_memory {
            self.storage.in_memory = true;
        }

        if let Some(ref extensions) = args.extensions {
            self.scanner.extensions = extensions.clone();
        }
        if let Some(max_files) = args.max_files {
            self.scanner.max_files = max_files;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(top) = args.top {
            self.report.top_postal_codes = top;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.data_file, PathBuf::from("data/id_cards.json"));
        assert!(!config.storage.in_memory);
        assert_eq!(config.scanner.extensions, vec!["txt"]);
        assert_eq!(config.report.top_postal_codes, 10);
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "stats.md"

[storage]
data_file = "/var/lib/idstats/cards.json"

[scanner]
extensions = ["txt", "ocr"]
excludes = ["processed"]

[report]
format = "json"
top_postal_codes = 5
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, Some(PathBuf::from("stats.md")));
        assert_eq!(
            config.storage.data_file,
            PathBuf::from("/var/lib/idstats/cards.json")
        );
        assert_eq!(config.scanner.extensions, vec!["txt", "ocr"]);
        assert_eq!(config.scanner.excludes, vec!["processed"]);
        assert_eq!(config.scanner.max_files, 1000);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.top_postal_codes, 5);
        assert!(config.report.include_ranking);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.storage.data_file, PathBuf::from("data/id_cards.json"));
    }
}
