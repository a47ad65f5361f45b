//! Core Extractor implementation

use crate::chunking::TextChunker;
use crate::config::ExtractorConfig;
use crate::dedup::{deduplicate, filter_by_confidence};
use crate::error::ExtractorError;
use crate::parser::{candidates_from_items, parse_llm_response};
use crate::patterns::PatternMatcher;
use crate::prompt::PromptBuilder;
use crate::types::{
    CandidateRecord, Chunk, ChunkFailure, ChunkFailureKind, ExtractionMetadata, ExtractionRequest,
    ExtractionResult, ExtractionStage, ExtractionWarning,
};
use rfp_domain::traits::LlmProvider;
use rfp_domain::{Confidence, RecordKind};
use rfp_llm::LlmError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor turns RFP text into requirement or risk records
///
/// One call to [`Extractor::extract`] processes one document end to end:
/// chunks are sent to the LLM one after another, pattern matches are added,
/// then low-confidence and duplicate candidates are removed. Per-chunk
/// failures never abort the run.
pub struct Extractor<L>
where
    L: LlmProvider<Error = LlmError>,
{
    llm_provider: Arc<L>,
    patterns: PatternMatcher,
    config: ExtractorConfig,
    model_name: String,
    cancel: Option<Arc<AtomicBool>>,
}

impl<L> Extractor<L>
where
    L: LlmProvider<Error = LlmError> + Send + Sync + 'static,
{
    /// Create a new Extractor
    ///
    /// Fails with `ExtractorError::Config` when the configuration is invalid
    /// or a pattern does not compile.
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let patterns = PatternMatcher::from_config(&config)?;
        let model_name = llm_provider.name().to_string();

        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            patterns,
            config,
            model_name,
            cancel: None,
        })
    }

    /// Report a specific model name in result metadata
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Stop between chunks once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The configuration this extractor was built with
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Extract records of `request.kind` from `request.document`
    pub async fn extract(&self, request: ExtractionRequest) -> Result<ExtractionResult, ExtractorError> {
        let start_time = SystemTime::now();
        let document = &request.document;
        let kind = request.kind;
        let mut stage = ExtractionStage::Pending;

        if document.char_len() > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(document.char_len(), self.config.max_text_length));
        }

        info!(
            "Starting {} extraction for source '{}', text length {} chars, {} pages",
            kind,
            request.source_id,
            document.char_len(),
            document.page_count()
        );

        let mut metadata = ExtractionMetadata {
            source_id: request.source_id.clone(),
            kind,
            timestamp: 0,
            model_name: self.model_name.clone(),
            stage,
            chunks_total: 0,
            chunks_processed: 0,
            model_candidates: 0,
            pattern_candidates: 0,
            invalid_candidates: 0,
            below_threshold: 0,
            duplicates_removed: 0,
            processing_time_ms: 0,
        };

        if document.is_empty() {
            info!("Document is empty, nothing to extract");
            advance(&mut stage, ExtractionStage::Done);
            return Ok(finish(Vec::new(), Vec::new(), Vec::new(), metadata, stage, start_time));
        }

        // Chunking
        advance(&mut stage, ExtractionStage::Chunking);
        let chunks = TextChunker::from_config(&self.config).chunk(document);
        metadata.chunks_total = chunks.len();
        info!("Split text into {} chunks", chunks.len());

        // PerChunkExtraction
        advance(&mut stage, ExtractionStage::PerChunkExtraction);
        let mut candidates: Vec<CandidateRecord> = Vec::new();
        let mut failures: Vec<ChunkFailure> = Vec::new();
        let mut warnings: Vec<ExtractionWarning> = Vec::new();

        for chunk in &chunks {
            if self.cancelled() {
                warn!(
                    "Extraction cancelled after {}/{} chunks",
                    metadata.chunks_processed,
                    chunks.len()
                );
                warnings.push(ExtractionWarning::Cancelled {
                    chunks_processed: metadata.chunks_processed,
                    chunks_total: chunks.len(),
                });
                break;
            }

            debug!("Processing chunk {}/{}", chunk.index + 1, chunks.len());
            match self.extract_chunk(chunk, kind, &request.source_id).await {
                Ok((found, invalid)) => {
                    metadata.model_candidates += found.len();
                    metadata.invalid_candidates += invalid;
                    push_in_sequence(&mut candidates, found);
                }
                Err(failure) => {
                    warn!(
                        chunk = failure.chunk_index,
                        page = ?failure.page,
                        kind = ?failure.kind,
                        "chunk contributed no candidates: {}",
                        failure.reason
                    );
                    failures.push(failure);
                }
            }
            metadata.chunks_processed += 1;
        }

        if metadata.chunks_processed > 0
            && failures.len() == metadata.chunks_processed
            && failures
                .iter()
                .all(|f| matches!(f.kind, ChunkFailureKind::ProvidersExhausted | ChunkFailureKind::Timeout))
        {
            warn!("No LLM provider answered for any chunk");
            warnings.push(ExtractionWarning::AllProvidersExhausted {
                chunks: metadata.chunks_processed,
            });
        }

        if self.config.pattern_matching {
            let confidence = Confidence::new(self.config.pattern_confidence).map_err(ExtractorError::Config)?;
            let matches = self.patterns.find(document, kind, confidence);
            metadata.pattern_candidates = matches.len();
            push_in_sequence(&mut candidates, matches);
        }

        info!(
            "Collected {} candidates ({} from model, {} from patterns)",
            candidates.len(),
            metadata.model_candidates,
            metadata.pattern_candidates
        );

        // Filtering
        advance(&mut stage, ExtractionStage::Filtering);
        let (kept, below_threshold) = filter_by_confidence(candidates, self.config.min_confidence(kind));
        metadata.below_threshold = below_threshold;

        // Deduplicating
        advance(&mut stage, ExtractionStage::Deduplicating);
        let (survivors, duplicates_removed) = deduplicate(kept, self.config.dedup_threshold);
        metadata.duplicates_removed = duplicates_removed;

        let records = survivors.into_iter().map(|c| c.into_record(kind)).collect::<Vec<_>>();

        info!(
            "Extraction complete: {} {}, {} below threshold, {} duplicates, {} failed chunks",
            records.len(),
            kind.plural(),
            below_threshold,
            duplicates_removed,
            failures.len()
        );

        advance(&mut stage, ExtractionStage::Done);
        Ok(finish(records, failures, warnings, metadata, stage, start_time))
    }

    /// Prompt, call and parse one chunk
    async fn extract_chunk(
        &self,
        chunk: &Chunk,
        kind: RecordKind,
        source_id: &str,
    ) -> Result<(Vec<CandidateRecord>, usize), ChunkFailure> {
        let prompt = PromptBuilder::new(chunk, kind).with_source(source_id).build();
        debug!("Prompt length: {} chars", prompt.len());

        let response = self.call_llm(prompt).await.map_err(|e| ChunkFailure {
            chunk_index: chunk.index,
            page: chunk.page,
            kind: failure_kind(&e),
            reason: e.to_string(),
        })?;
        debug!("LLM response length: {} chars", response.len());

        let (items, _strategy) = parse_llm_response(&response).into_result().map_err(|e| ChunkFailure {
            chunk_index: chunk.index,
            page: chunk.page,
            kind: ChunkFailureKind::Unparsable,
            reason: e.to_string(),
        })?;

        Ok(candidates_from_items(&items, chunk))
    }

    /// Call the LLM provider
    async fn call_llm(&self, prompt: String) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);
        let budget = self.config.llm_timeout();
        let deadline = Instant::now() + budget;

        // Call in a blocking context since LlmProvider is not async. The
        // deadline keeps a chain from starting requests after we stop waiting.
        let call = tokio::task::spawn_blocking(move || llm.generate_by(&prompt, deadline));

        timeout(budget, call)
            .await
            .map_err(|_| ExtractorError::Timeout)?
            .map_err(|e| ExtractorError::Llm(LlmError::Other(format!("Task join error: {}", e))))?
            .map_err(ExtractorError::from)
    }
}

fn failure_kind(error: &ExtractorError) -> ChunkFailureKind {
    match error {
        ExtractorError::Llm(LlmError::AllProvidersExhausted { .. }) => ChunkFailureKind::ProvidersExhausted,
        ExtractorError::Timeout => ChunkFailureKind::Timeout,
        ExtractorError::UnparsableResponse(_) => ChunkFailureKind::Unparsable,
        _ => ChunkFailureKind::Provider,
    }
}

/// Append `found`, numbering it after everything already collected
fn push_in_sequence(candidates: &mut Vec<CandidateRecord>, found: Vec<CandidateRecord>) {
    for mut candidate in found {
        candidate.sequence = candidates.len();
        candidates.push(candidate);
    }
}

fn advance(stage: &mut ExtractionStage, next: ExtractionStage) {
    debug!(from = %stage, to = %next, "extraction stage");
    *stage = next;
}

fn finish(
    records: Vec<rfp_domain::Record>,
    failures: Vec<ChunkFailure>,
    warnings: Vec<ExtractionWarning>,
    mut metadata: ExtractionMetadata,
    stage: ExtractionStage,
    start_time: SystemTime,
) -> ExtractionResult {
    metadata.stage = stage;
    metadata.processing_time_ms = start_time
        .elapsed()
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64;
    metadata.timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    ExtractionResult {
        records,
        failures,
        warnings,
        metadata,
    }
}
