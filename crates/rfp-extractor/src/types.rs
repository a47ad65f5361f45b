//! Request and response types for extraction

use rfp_domain::{Category, Confidence, Document, ExtractionMethod, Priority, Record, RecordKind};
use std::cmp::Ordering;
use std::fmt;

/// Request to extract records from a document
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Document to extract from
    pub document: Document,

    /// Requirements or risks
    pub kind: RecordKind,

    /// Source identifier (file name, tender reference)
    pub source_id: String,
}

/// A window of document text handed to the LLM in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence
    pub index: usize,

    /// First character offset (inclusive)
    pub start: usize,

    /// Last character offset (exclusive)
    pub end: usize,

    /// 1-based page containing `start`, when known
    pub page: Option<u32>,

    /// Chunk text
    pub text: String,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Orchestrator progress for one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStage {
    /// Request accepted, nothing done yet
    Pending,
    /// Splitting the document into chunks
    Chunking,
    /// Calling the LLM and pattern matcher
    PerChunkExtraction,
    /// Dropping low-confidence candidates
    Filtering,
    /// Collapsing duplicates from overlapping chunks
    Deduplicating,
    /// Final records produced
    Done,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExtractionStage::Pending => "pending",
            ExtractionStage::Chunking => "chunking",
            ExtractionStage::PerChunkExtraction => "per_chunk_extraction",
            ExtractionStage::Filtering => "filtering",
            ExtractionStage::Deduplicating => "deduplicating",
            ExtractionStage::Done => "done",
        };
        f.write_str(label)
    }
}

/// A provisional record, before filtering and deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    /// Free-text statement
    pub description: String,

    /// Category from the closed set
    pub category: Category,

    /// Priority or severity
    pub priority: Priority,

    /// Extraction certainty
    pub confidence: Confidence,

    /// 1-based source page
    pub page: Option<u32>,

    /// How the candidate was produced
    pub method: ExtractionMethod,

    /// Chunk the candidate came from; `None` for document-wide pattern matches
    pub chunk_index: Option<usize>,

    /// Detection order across the whole run
    pub sequence: usize,
}

impl CandidateRecord {
    /// Ranking used when two candidates are duplicates: higher confidence
    /// first, then earlier page, earlier chunk, earlier detection
    pub(crate) fn rank(&self, other: &Self) -> Ordering {
        other
            .confidence
            .value()
            .total_cmp(&self.confidence.value())
            .then_with(|| cmp_none_last(self.page, other.page))
            .then_with(|| cmp_none_last(self.chunk_index, other.chunk_index))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }

    /// Output order: page ascending (unknown pages last), then detection order
    pub(crate) fn output_order(&self, other: &Self) -> Ordering {
        cmp_none_last(self.page, other.page).then_with(|| self.sequence.cmp(&other.sequence))
    }

    /// Promote to a final record
    pub fn into_record(self, kind: RecordKind) -> Record {
        Record::new(
            kind,
            self.description,
            self.category,
            self.priority,
            self.confidence,
            self.page,
            self.method,
        )
    }
}

fn cmp_none_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Why a chunk contributed no candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFailureKind {
    /// Every provider failed
    ProvidersExhausted,
    /// The provider layer failed for another reason
    Provider,
    /// The call exceeded `llm_timeout_secs`
    Timeout,
    /// The response held no recoverable list
    Unparsable,
}

/// A chunk whose extraction produced nothing
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Failed chunk
    pub chunk_index: usize,

    /// Page of the failed chunk
    pub page: Option<u32>,

    /// Failure class
    pub kind: ChunkFailureKind,

    /// Human-readable reason
    pub reason: String,
}

/// Run-level conditions the caller should surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// Every chunk ended in provider exhaustion or the per-call timeout
    AllProvidersExhausted {
        /// Number of chunks attempted
        chunks: usize,
    },
    /// The run was cancelled between chunks
    Cancelled {
        /// Chunks completed before cancellation
        chunks_processed: usize,
        /// Chunks in the document
        chunks_total: usize,
    },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::AllProvidersExhausted { chunks } => write!(
                f,
                "no LLM provider answered for any chunk ({} chunks); results contain pattern matches only",
                chunks
            ),
            ExtractionWarning::Cancelled { chunks_processed, chunks_total } => write!(
                f,
                "extraction cancelled after {} of {} chunks",
                chunks_processed, chunks_total
            ),
        }
    }
}

/// Result of an extraction operation
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Final records in output order
    pub records: Vec<Record>,

    /// Chunks that contributed no candidates
    pub failures: Vec<ChunkFailure>,

    /// Run-level warnings
    pub warnings: Vec<ExtractionWarning>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about an extraction operation
#[derive(Debug, Clone)]
pub struct ExtractionMetadata {
    /// Source identifier
    pub source_id: String,

    /// Requirements or risks
    pub kind: RecordKind,

    /// Timestamp when extraction finished (seconds since epoch)
    pub timestamp: u64,

    /// Name of the LLM provider used
    pub model_name: String,

    /// Stage the run reached
    pub stage: ExtractionStage,

    /// Chunks in the document
    pub chunks_total: usize,

    /// Chunks sent to the LLM
    pub chunks_processed: usize,

    /// Candidates produced by the LLM path
    pub model_candidates: usize,

    /// Candidates produced by the pattern matcher
    pub pattern_candidates: usize,

    /// Malformed items dropped from otherwise valid responses
    pub invalid_candidates: usize,

    /// Candidates dropped by the confidence threshold
    pub below_threshold: usize,

    /// Candidates dropped as duplicates
    pub duplicates_removed: usize,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(confidence: f64, page: Option<u32>, chunk: Option<usize>, sequence: usize) -> CandidateRecord {
        CandidateRecord {
            description: "Must support 99.9% uptime".to_string(),
            category: Category::Operational,
            priority: Priority::High,
            confidence: Confidence::new(confidence).unwrap(),
            page,
            method: ExtractionMethod::ModelDerived,
            chunk_index: chunk,
            sequence,
        }
    }

    #[test]
    fn test_rank_prefers_confidence() {
        let a = candidate(0.92, Some(3), Some(1), 5);
        let b = candidate(0.78, Some(2), Some(0), 1);
        assert_eq!(a.rank(&b), Ordering::Less);
    }

    #[test]
    fn test_rank_tie_breaks() {
        let early_page = candidate(0.8, Some(1), Some(4), 9);
        let late_page = candidate(0.8, Some(2), Some(0), 0);
        assert_eq!(early_page.rank(&late_page), Ordering::Less);

        let no_page = candidate(0.8, None, Some(0), 0);
        assert_eq!(late_page.rank(&no_page), Ordering::Less);

        let early_chunk = candidate(0.8, Some(2), Some(0), 7);
        let late_chunk = candidate(0.8, Some(2), Some(1), 3);
        assert_eq!(early_chunk.rank(&late_chunk), Ordering::Less);
    }

    #[test]
    fn test_output_order() {
        let a = candidate(0.5, Some(2), Some(0), 0);
        let b = candidate(0.9, Some(1), Some(1), 1);
        let c = candidate(0.9, None, None, 2);
        assert_eq!(b.output_order(&a), Ordering::Less);
        assert_eq!(a.output_order(&c), Ordering::Less);
    }

    #[test]
    fn test_into_record() {
        let record = candidate(0.92, Some(3), Some(1), 0).into_record(RecordKind::Requirement);
        assert_eq!(record.kind, RecordKind::Requirement);
        assert_eq!(record.page, Some(3));
        assert!(!record.verified);
        assert_eq!(record.extraction_method, ExtractionMethod::ModelDerived);
    }
}
