//! Confidence filtering and cross-chunk deduplication

use crate::similarity::{jaccard, tokenize};
use crate::types::CandidateRecord;
use std::collections::HashSet;
use tracing::debug;

/// Split candidates into those meeting `threshold` and the count dropped
pub fn filter_by_confidence(candidates: Vec<CandidateRecord>, threshold: f64) -> (Vec<CandidateRecord>, usize) {
    let before = candidates.len();
    let kept: Vec<CandidateRecord> = candidates
        .into_iter()
        .filter(|c| c.confidence.meets(threshold))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Collapse near-identical candidates
///
/// Candidates are visited from best to worst (confidence, then page, chunk
/// and detection order); each one survives only if it is less than
/// `threshold` similar to every survivor so far. Survivors are returned in
/// output order (page ascending, then detection order) with the number of
/// candidates removed.
pub fn deduplicate(candidates: Vec<CandidateRecord>, threshold: f64) -> (Vec<CandidateRecord>, usize) {
    let before = candidates.len();

    let mut ranked: Vec<(CandidateRecord, HashSet<String>)> = candidates
        .into_iter()
        .map(|c| {
            let tokens = tokenize(&c.description);
            (c, tokens)
        })
        .collect();
    ranked.sort_by(|(a, _), (b, _)| a.rank(b));

    let mut kept: Vec<(CandidateRecord, HashSet<String>)> = Vec::with_capacity(ranked.len());
    for (candidate, tokens) in ranked {
        if let Some((survivor, _)) = kept
            .iter()
            .find(|(_, kept_tokens)| jaccard(&tokens, kept_tokens) >= threshold)
        {
            debug!(
                dropped = %candidate.description,
                dropped_confidence = %candidate.confidence,
                kept_confidence = %survivor.confidence,
                "duplicate removed"
            );
            continue;
        }
        kept.push((candidate, tokens));
    }

    let mut survivors: Vec<CandidateRecord> = kept.into_iter().map(|(c, _)| c).collect();
    survivors.sort_by(|a, b| a.output_order(b));

    let removed = before - survivors.len();
    (survivors, removed)
}
