//! Output formatting for CLI operations.

use serde_json::json;
use std::path::Path;

/// What `size` reports about a source
pub struct SizeReport<'a> {
    pub source: &'a Path,
    pub entries: usize,
    pub total_size: u64,
}

/// What `create` reports after writing an archive
pub struct CreateReport<'a> {
    pub source: &'a Path,
    pub output: Option<&'a Path>,
    pub entries: usize,
    pub bytes_written: u64,
}

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a size report
    fn format_size(&self, report: &SizeReport<'_>) -> String;

    /// Formats the result of writing an archive
    fn format_create_result(&self, report: &CreateReport<'_>) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_size(&self, report: &SizeReport<'_>) -> String {
        format!(
            "{} ({} entries, {})\n",
            report.total_size,
            report.entries,
            humanize_bytes(report.total_size)
        )
    }

    fn format_create_result(&self, report: &CreateReport<'_>) -> String {
        let target = report
            .output
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string());
        format!(
            "Archived {} entries from {} to {} ({})\n",
            report.entries,
            report.source.display(),
            target,
            humanize_bytes(report.bytes_written)
        )
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_size(&self, report: &SizeReport<'_>) -> String {
        let obj = json!({
            "source": report.source.display().to_string(),
            "entries": report.entries,
            "total_size": report.total_size,
            "blocks": report.total_size / tarstream::BLOCK_SIZE,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_create_result(&self, report: &CreateReport<'_>) -> String {
        let obj = json!({
            "source": report.source.display().to_string(),
            "output": report.output.map(|p| p.display().to_string()),
            "entries": report.entries,
            "bytes_written": report.bytes_written,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
