//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// IDStats - ID card field extraction and distribution statistics
///
/// Reads the text an OCR engine recognized on scanned ID cards, extracts
/// gender, age, height and postal code, appends the records to the data
/// file and reports the distribution of each field.
///
/// Examples:
///   idstats scans/
///   idstats card1.txt card2.txt --format json --output stats.json
///   idstats --text "DOB: 1990-04-12 Height: 172 cm F V6B 4N8"
///   tesseract card.png - | idstats --stdin
///   idstats --skip-report scans/
///   idstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// OCR text files or directories of text files to ingest
    #[arg(value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Ingest recognized text given directly on the command line
    #[arg(long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Read one recognized text blob from standard input
    #[arg(long)]
    pub stdin: bool,

    /// Path of the JSON records file
    #[arg(long, value_name = "FILE", env = "IDSTATS_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Keep records in memory only (nothing is persisted)
    #[arg(long)]
    pub in_memory: bool,

    /// Output file for the statistics report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Number of postal codes in the ranked table
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// File extensions treated as OCR text when walking directories (comma-separated)
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Maximum number of input files per run
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .idstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Parse inputs and print the records without storing them
    #[arg(long)]
    pub dry_run: bool,

    /// Ingest only; do not produce a statistics report
    #[arg(long)]
    pub skip_report: bool,

    /// Generate a default .idstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether any recognized text was supplied.
    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty() || !self.text.is_empty() || self.stdin
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        if self.dry_run && !self.has_inputs() {
            return Err("--dry-run needs at least one input".to_string());
        }

        if self.in_memory && !self.has_inputs() {
            return Err("--in-memory without inputs has nothing to report".to_string());
        }

        for input in &self.inputs {
            if !input.exists() {
                return Err(format!("Input does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
