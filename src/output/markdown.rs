//! Markdown report generation
//!
//! This module renders a finished batch as a human-readable markdown report
//! with overall statistics, a failure breakdown, and one row per URL.

use crate::fetch::ResultSet;
use crate::output::stats::BatchStatistics;
use crate::output::{OutputError, OutputResult};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report for a batch
///
/// # Arguments
///
/// * `results` - The batch results
/// * `stats` - Statistics computed from the same results
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    results: &ResultSet,
    stats: &BatchStatistics,
    output_path: &Path,
) -> OutputResult<()> {
    if output_path.is_dir() {
        return Err(OutputError::Write(format!(
            "report path {} is a directory",
            output_path.display()
        )));
    }

    let markdown = format_markdown_report(results, stats);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a batch as markdown
pub fn format_markdown_report(results: &ResultSet, stats: &BatchStatistics) -> String {
    let mut md = String::new();

    md.push_str("# Sumi-Fetch Report\n\n");
    md.push_str(&format!(
        "Generated {}\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **URLs**: {}\n", stats.total));
    md.push_str(&format!("- **Succeeded**: {}\n", stats.succeeded));
    md.push_str(&format!("- **Failed**: {}\n", stats.failed));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        stats.success_rate()
    ));
    md.push_str(&format!("- **Content Fetched**: {} bytes\n", stats.total_bytes));
    md.push_str(&format!("- **Batch Time**: {:?}\n", stats.elapsed));
    md.push_str(&format!("- **Mean Fetch Time**: {:?}\n", stats.mean_duration));
    if let Some((url, duration)) = &stats.slowest {
        md.push_str(&format!(
            "- **Slowest**: {} ({:?})\n",
            escape_cell(url),
            duration
        ));
    }
    md.push('\n');

    // Failure breakdown
    if !stats.failures_by_kind.is_empty() {
        md.push_str("## Failures by Kind\n\n");
        md.push_str("| Kind | Count |\n");
        md.push_str("|------|-------|\n");
        for (kind, count) in &stats.failures_by_kind {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    // Per-URL results
    md.push_str("## Results\n\n");
    if results.is_empty() {
        md.push_str("_No URLs were requested._\n");
        return md;
    }

    md.push_str("| # | URL | Outcome | Bytes | Duration | Completed |\n");
    md.push_str("|---|-----|---------|-------|----------|-----------|\n");
    for (index, result) in results.iter().enumerate() {
        let outcome = match result.error() {
            None => "ok".to_string(),
            Some(error) => format!("{}: {}", error.kind(), escape_cell(&error.to_string())),
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:?} | {} |\n",
            index,
            escape_cell(result.url()),
            outcome,
            result.content().len(),
            result.duration(),
            result.timestamp().format("%H:%M:%S%.3f")
        ));
    }

    md
}

/// Keeps a value from breaking a markdown table row
fn escape_cell(value: &str) -> String {
    if value.is_empty() {
        return "_(empty)_".to_string();
    }
    value.replace('|', "\\|").replace('\n', " ")
}
