//! RFP Extractor
//!
//! Turns the text of an RFP document into requirement or risk records using
//! an LLM plus regex heuristics.
//!
//! # Overview
//!
//! A document is split into overlapping chunks, each chunk is sent to the
//! LLM through whatever `LlmProvider` the caller supplies (usually a
//! `ProviderChain`), and the free-text answers are parsed into candidate
//! records. A pattern matcher contributes candidates of its own. Candidates
//! below the confidence threshold are dropped, and duplicates produced by
//! overlapping chunks are collapsed.
//!
//! # Architecture
//!
//! ```text
//! Document → Chunker → LLM → Parser ─┐
//!         └──────→ PatternMatcher ───┴→ Filter → Dedup → Records
//! ```
//!
//! # Key Features
//!
//! - **Provider fallback**: any `LlmProvider<Error = LlmError>`, including chains
//! - **Tolerant parsing**: direct JSON, bracket span, then fenced block
//! - **Partial results**: a failing chunk never aborts the document
//! - **Cross-chunk deduplication**: Jaccard token overlap on descriptions
//! - **Export and catalog matching**: JSON records, service catalog lookup
//!
//! # Example Usage
//!
//! ```no_run
//! use rfp_extractor::{Extractor, ExtractorConfig, ExtractionRequest};
//! use rfp_domain::{Document, RecordKind};
//! use rfp_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new("[]");
//! let extractor = Extractor::new(llm, ExtractorConfig::default())?;
//!
//! let request = ExtractionRequest {
//!     document: Document::new("The supplier must support 99.9% uptime."),
//!     kind: RecordKind::Requirement,
//!     source_id: "tender_001".to_string(),
//! };
//!
//! let result = extractor.extract(request).await?;
//!
//! println!("Records: {}", result.records.len());
//! println!("Failed chunks: {}", result.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod catalog;
mod chunking;
mod config;
mod dedup;
mod error;
mod export;
mod extractor;
mod parser;
mod patterns;
mod prompt;
mod similarity;
mod types;


pub use catalog::{Service, ServiceCatalog, ServiceMatch, DEFAULT_MIN_SCORE};
pub use chunking::{Chunks, TextChunker};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use export::{from_json, read_records, to_json, write_records};
pub use extractor::Extractor;
pub use parser::{parse_llm_response, ParseStrategy, ParsedResponse};
pub use patterns::{default_requirement_rules, default_risk_rules, PatternMatcher, PatternRule};
pub use types::{
    CandidateRecord, Chunk, ChunkFailure, ChunkFailureKind, ExtractionMetadata, ExtractionRequest,
    ExtractionResult, ExtractionStage, ExtractionWarning,
};
