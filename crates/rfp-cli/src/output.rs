//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use rfp_domain::Record;
use rfp_extractor::{ChunkFailure, ExtractionResult, ServiceMatch};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const DESCRIPTION_WIDTH: usize = 72;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format extracted records.
    pub fn format_records(&self, records: &[Record]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(rfp_extractor::to_json(records)?),
            OutputFormat::Table => Ok(self.format_records_table(records)),
            OutputFormat::Quiet => Ok(records.iter().map(|r| r.id.to_string()).collect::<Vec<_>>().join("\n")),
        }
    }

    fn format_records_table(&self, records: &[Record]) -> String {
        if records.is_empty() {
            return self.colorize("No records found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Page", "Priority", "Category", "Confidence", "Method", "Description"]);

        for record in records {
            let id = record.id.to_string();
            let page = record.page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            builder.push_record([
                truncate(&id, 8),
                page,
                record.priority.to_string(),
                record.category.to_string(),
                format!("{:.2}", record.confidence.value()),
                record.extraction_method.to_string(),
                truncate(&record.description, DESCRIPTION_WIDTH),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format catalog matches.
    pub fn format_matches(&self, matches: &[ServiceMatch]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(matches)?),
            OutputFormat::Table => Ok(self.format_matches_table(matches)),
            OutputFormat::Quiet => Ok(matches
                .iter()
                .map(|m| format!("{} {}", m.record_id, m.service_id))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_matches_table(&self, matches: &[ServiceMatch]) -> String {
        if matches.is_empty() {
            return self.colorize("No catalog matches found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Requirement", "Service", "Score"]);
        for m in matches {
            builder.push_record([
                truncate(&m.requirement, DESCRIPTION_WIDTH),
                format!("{} ({})", m.service_name, m.service_id),
                format!("{:.2}", m.score),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// One-line summary of an extraction run.
    pub fn run_summary(&self, result: &ExtractionResult) -> String {
        let meta = &result.metadata;
        self.info(&format!(
            "{} {} from {}/{} chunks in {} ms ({} model, {} pattern candidates; {} below threshold, {} duplicates)",
            result.records.len(),
            meta.kind.plural(),
            meta.chunks_processed,
            meta.chunks_total,
            meta.processing_time_ms,
            meta.model_candidates,
            meta.pattern_candidates,
            meta.below_threshold,
            meta.duplicates_removed,
        ))
    }

    /// Describe a chunk that produced nothing.
    pub fn chunk_failure(&self, failure: &ChunkFailure) -> String {
        let page = failure
            .page
            .map(|p| format!(" (page {})", p))
            .unwrap_or_default();
        self.warning(&format!("Chunk {}{} failed: {}", failure.chunk_index, page, failure.reason))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
