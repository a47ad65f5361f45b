//! Configuration for the Extractor

use crate::patterns::PatternRule;
use rfp_domain::RecordKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
///
/// Built once and handed to the `Extractor` at construction; the
/// orchestrator never reads settings from anywhere else. Missing keys take
/// their default values when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Maximum chunk size (characters)
    pub chunk_size: usize,

    /// Characters shared by adjacent chunks
    pub chunk_overlap: usize,

    /// How far back a chunk end may move to land on a page boundary
    pub page_snap_tolerance: usize,

    /// Minimum confidence for requirement records
    pub min_confidence_requirement: f64,

    /// Minimum confidence for risk records
    pub min_confidence_risk: f64,

    /// Jaccard similarity at or above which two records are duplicates
    pub dedup_threshold: f64,

    /// Maximum time for a single LLM call (seconds)
    pub llm_timeout_secs: u64,

    /// Whether the regex matcher contributes candidates
    pub pattern_matching: bool,

    /// Confidence assigned to every pattern-derived candidate
    pub pattern_confidence: f64,

    /// Replacement requirement pattern table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_patterns: Option<Vec<PatternRule>>,

    /// Replacement risk pattern table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_patterns: Option<Vec<PatternRule>>,
}

impl ExtractorConfig {
    /// Get the LLM call timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Minimum confidence for records of `kind`
    pub fn min_confidence(&self, kind: RecordKind) -> f64 {
        match kind {
            RecordKind::Requirement => self.min_confidence_requirement,
            RecordKind::Risk => self.min_confidence_risk,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.page_snap_tolerance >= self.chunk_size - self.chunk_overlap {
            return Err("page_snap_tolerance must be smaller than chunk_size - chunk_overlap".to_string());
        }
        for (name, value) in [
            ("min_confidence_requirement", self.min_confidence_requirement),
            ("min_confidence_risk", self.min_confidence_risk),
            ("pattern_confidence", self.pattern_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0.0, 1.0]", name));
            }
        }
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            return Err("dedup_threshold must be within (0.0, 1.0]".to_string());
        }
        if self.llm_timeout_secs == 0 {
            return Err("llm_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 2_000_000,
            chunk_size: 4_000,
            chunk_overlap: 200,
            page_snap_tolerance: 300,
            min_confidence_requirement: 0.5,
            min_confidence_risk: 0.4,
            dedup_threshold: 0.8,
            llm_timeout_secs: 120,
            pattern_matching: true,
            pattern_confidence: 0.5,
            requirement_patterns: None,
            risk_patterns: None,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller chunks, shorter timeouts, stricter filtering
    pub fn aggressive() -> Self {
        Self {
            chunk_size: 2_000,
            chunk_overlap: 150,
            page_snap_tolerance: 200,
            min_confidence_requirement: 0.7,
            min_confidence_risk: 0.6,
            llm_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Lenient preset: larger chunks, longer timeouts, keep more candidates
    pub fn lenient() -> Self {
        Self {
            chunk_size: 8_000,
            chunk_overlap: 400,
            page_snap_tolerance: 600,
            min_confidence_requirement: 0.3,
            min_confidence_risk: 0.3,
            llm_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
