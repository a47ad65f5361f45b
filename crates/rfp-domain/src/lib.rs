//! RFP Domain Layer
//!
//! Core domain model for RFP requirement and risk extraction. This crate
//! defines the value objects shared by every other layer and the trait
//! interface for text-generation backends.
//!
//! ## Key Concepts
//!
//! - **Record**: an extracted requirement or risk clause with a category,
//!   priority and confidence
//! - **Confidence**: scalar certainty in `[0.0, 1.0]`
//! - **Document**: source text with page offsets
//! - **LlmProvider**: the capability every text-generation backend implements
//!
//! ## Architecture
//!
//! - Minimal external dependencies (identifiers and serialization only)
//! - Pure business logic only
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod document;
pub mod record;
pub mod traits;

// Re-exports for convenience
pub use confidence::Confidence;
pub use document::Document;
pub use record::{Category, ExtractionMethod, Priority, Record, RecordId, RecordKind};
