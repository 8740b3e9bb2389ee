//! Statistics report generation.
//!
//! This module turns a statistics snapshot into the Markdown or JSON
//! documents handed to the chart and map renderers.

use crate::analysis::ranked_postal_codes;
use crate::config::ReportConfig;
use crate::models::{Distribution, Report, ReportMetadata, Statistics};
use crate::storage::RecordStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::fmt::Display;

/// Build a report from one snapshot of the store.
pub fn build_report(
    store: &dyn RecordStore,
    ingested: usize,
    config: &ReportConfig,
) -> Result<Report> {
    let statistics = store
        .statistics()
        .context("Failed to compute statistics")?;

    let top_postal_codes = if config.include_ranking {
        ranked_postal_codes(
            &statistics.postal_code_distribution,
            Some(config.top_postal_codes),
        )
    } else {
        Distribution::default()
    };

    let metadata = ReportMetadata {
        generated_at: Utc::now(),
        data_source: store.describe(),
        record_count: statistics.record_count(),
        ingested,
    };

    Ok(Report {
        metadata,
        statistics,
        top_postal_codes,
    })
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# ID Card Statistics\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_distribution_sections(&report.statistics));

    if !report.top_postal_codes.is_empty() {
        output.push_str(&generate_distribution_table(
            "Top Postal Codes",
            "Postal Code",
            &report.top_postal_codes,
        ));
    }

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Data Source:** `{}`\n", metadata.data_source));
    section.push_str(&format!("- **Records:** {}\n", metadata.record_count));
    if metadata.ingested > 0 {
        section.push_str(&format!("- **Ingested This Run:** {}\n", metadata.ingested));
    }
    section.push('\n');

    section
}

fn generate_distribution_sections(stats: &Statistics) -> String {
    let mut sections = String::new();

    sections.push_str(&generate_distribution_table(
        "Gender Distribution",
        "Gender",
        &stats.gender_distribution,
    ));
    sections.push_str(&generate_distribution_table(
        "Age Group Distribution",
        "Age Group",
        &stats.age_group_distribution,
    ));
    sections.push_str(&generate_distribution_table(
        "Height Distribution",
        "Height (cm)",
        &stats.height_distribution,
    ));
    sections.push_str(&generate_distribution_table(
        "Postal Code Distribution",
        "Postal Code",
        &stats.postal_code_distribution,
    ));

    sections
}

/// One `| bucket | count | share |` table, in the distribution's own order.
fn generate_distribution_table<K: Display>(
    title: &str,
    label: &str,
    distribution: &Distribution<K>,
) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    if distribution.is_empty() {
        section.push_str("No data.\n\n");
        return section;
    }

    let total = distribution.total();

    section.push_str(&format!("| {} | Count | Share |\n", label));
    section.push_str("|:---|:---:|:---:|\n");

    for entry in distribution.iter() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            entry.bucket,
            entry.count,
            format_share(entry.count, total)
        ));
    }
    section.push('\n');

    section
}

fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
