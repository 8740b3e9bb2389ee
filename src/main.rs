//! IDStats - ID card field extraction and distribution statistics
//!
//! A CLI tool that normalizes the text an OCR engine recognized on
//! scanned identification cards into structured records, appends them
//! to a record store and reports per-field distributions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, input, storage, report output)

mod analysis;
mod cli;
mod config;
mod error;
mod extract;
mod models;
mod report;
mod scanner;
mod storage;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, OutputFormat, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::Record;
use scanner::{InputScanner, ScanConfig};
use std::io::Read;
use storage::{JsonFileStore, MemoryStore, RecordStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// A piece of recognized text and where it came from.
struct TextInput {
    origin: String,
    text: String,
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    info!("IDStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .idstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so that stdout carries only the report.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Ingest every input, then report on the whole collection.
fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let inputs = collect_inputs(&args, &config)?;
    info!("Collected {} text input(s)", inputs.len());

    if args.dry_run {
        return handle_dry_run(&inputs);
    }

    let store = open_store(&config)?;
    let ingested = ingest(store.as_ref(), &inputs, args.quiet)?;

    if args.skip_report {
        info!("Ingested {} record(s); report skipped", ingested);
        return Ok(());
    }

    let report = report::build_report(store.as_ref(), ingested, &config.report)?;

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                eprintln!("✅ Report saved to: {}", path.display());
            }
        }
        None => print!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

fn open_store(config: &Config) -> Result<Box<dyn RecordStore>> {
    if config.storage.in_memory {
        debug!("Using in-memory record store");
        return Ok(Box::new(MemoryStore::new()));
    }

    let store = JsonFileStore::open(&config.storage.data_file).with_context(|| {
        format!(
            "Failed to open record store {}",
            config.storage.data_file.display()
        )
    })?;
    Ok(Box::new(store))
}

/// Gather recognized text from files, `--text` values and stdin, in that order.
fn collect_inputs(args: &Args, config: &Config) -> Result<Vec<TextInput>> {
    let mut inputs = Vec::new();

    if !args.inputs.is_empty() {
        let scanner = InputScanner::new(ScanConfig::from(&config.scanner));
        for file in scanner.scan(&args.inputs)? {
            debug!("Reading {} ({} bytes)", file.path.display(), file.size);
            inputs.push(TextInput {
                origin: file.path.display().to_string(),
                text: file.read_text()?,
            });
        }
    }

    for (i, text) in args.text.iter().enumerate() {
        inputs.push(TextInput {
            origin: format!("--text #{}", i + 1),
            text: text.clone(),
        });
    }

    if args.stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read text from stdin")?;
        inputs.push(TextInput {
            origin: "stdin".to_string(),
            text,
        });
    }

    Ok(inputs)
}

/// Parse and append every input. Returns the number of records appended.
fn ingest(store: &dyn RecordStore, inputs: &[TextInput], quiet: bool) -> Result<usize> {
    let progress = if inputs.len() > 1 && !quiet {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut appended = 0;
    for input in inputs {
        let record = extract::parse(&input.text);
        debug!("{} -> {:?}", input.origin, record);

        store
            .append(record)
            .with_context(|| format!("Failed to store record from {}", input.origin))?;
        appended += 1;

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Ingest complete");
    }

    info!("Appended {} record(s) to {}", appended, store.describe());
    Ok(appended)
}

/// Handle --dry-run: print each parsed record as a JSON line, store nothing.
fn handle_dry_run(inputs: &[TextInput]) -> Result<()> {
    for input in inputs {
        let record: Record = extract::parse(&input.text);
        let line = serde_json::to_string(&record)?;
        println!("{}", line);
    }
    Ok(())
}
