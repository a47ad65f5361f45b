//! Parse LLM output into candidate records

use crate::error::ExtractorError;
use crate::types::{CandidateRecord, Chunk};
use rfp_domain::{Category, Confidence, ExtractionMethod, Priority};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Keys under which a wrapper object may hold the record list
const LIST_KEYS: [&str; 4] = ["requirements", "risks", "items", "records"];

/// Keys accepted for the record text, in order of preference
const DESCRIPTION_KEYS: [&str; 6] = ["description", "text", "requirement", "risk", "clause", "statement"];

/// How the record list was recovered from the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// The whole response was JSON
    Direct,
    /// The span from the first `[` to the last `]`
    BracketSpan,
    /// The body of the first fenced code block
    FencedBlock,
}

impl ParseStrategy {
    /// Attempt number, starting at 1
    pub fn attempt(&self) -> usize {
        match self {
            ParseStrategy::Direct => 1,
            ParseStrategy::BracketSpan => 2,
            ParseStrategy::FencedBlock => 3,
        }
    }
}

impl fmt::Display for ParseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseStrategy::Direct => f.write_str("direct"),
            ParseStrategy::BracketSpan => f.write_str("bracket_span"),
            ParseStrategy::FencedBlock => f.write_str("fenced_block"),
        }
    }
}

/// Outcome of reading one LLM response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    /// A JSON list was recovered
    Parsed {
        /// Raw list elements, not yet validated
        items: Vec<Value>,
        /// Which attempt succeeded
        strategy: ParseStrategy,
    },
    /// No attempt produced a list
    Unparsable {
        /// Why the last attempt failed
        reason: String,
    },
}

impl ParsedResponse {
    /// Convert into a `Result`, mapping `Unparsable` to `UnparsableResponse`
    pub fn into_result(self) -> Result<(Vec<Value>, ParseStrategy), ExtractorError> {
        match self {
            ParsedResponse::Parsed { items, strategy } => Ok((items, strategy)),
            ParsedResponse::Unparsable { reason } => Err(ExtractorError::UnparsableResponse(reason)),
        }
    }
}

/// Recover the record list from raw LLM output
///
/// Tries the whole text, then the outermost bracket span, then the first
/// fenced code block.
pub fn parse_llm_response(response: &str) -> ParsedResponse {
    let trimmed = response.trim();

    let mut reason = match list_from_json(trimmed, true) {
        Ok(items) => return parsed(items, ParseStrategy::Direct),
        Err(e) => e,
    };

    if let Some(span) = bracket_span(trimmed) {
        match list_from_json(span, false) {
            Ok(items) => return parsed(items, ParseStrategy::BracketSpan),
            Err(e) => reason = e,
        }
    }

    if let Some(block) = fenced_block(trimmed) {
        match list_from_json(block, true) {
            Ok(items) => return parsed(items, ParseStrategy::FencedBlock),
            Err(e) => reason = e,
        }
    }

    debug!(reason = %reason, "no JSON list in response");
    ParsedResponse::Unparsable { reason }
}

fn parsed(items: Vec<Value>, strategy: ParseStrategy) -> ParsedResponse {
    debug!(strategy = %strategy, items = items.len(), "parsed LLM response");
    ParsedResponse::Parsed { items, strategy }
}

/// Parse `text` as a JSON array, or as an object wrapping one
fn list_from_json(text: &str, allow_wrapper: bool) -> Result<Vec<Value>, String> {
    let value: Value = serde_json::from_str(text).map_err(|e| format!("JSON parse error: {}", e))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) if allow_wrapper => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| "Expected JSON array".to_string()),
        _ => Err("Expected JSON array".to_string()),
    }
}

fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Body of the first ``` fence, without its language tag
///
/// The body may start on the fence line itself (```` ```json [...]``` ````).
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[tag_len..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Convert recovered list elements into candidates for `chunk`
///
/// Malformed elements are dropped with a warning; the second value counts
/// them.
pub fn candidates_from_items(items: &[Value], chunk: &Chunk) -> (Vec<CandidateRecord>, usize) {
    let mut candidates = Vec::with_capacity(items.len());
    let mut invalid = 0;

    for (idx, item) in items.iter().enumerate() {
        match parse_candidate(item, chunk) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                warn!(chunk = chunk.index, item = idx, "dropping candidate: {}", e);
                invalid += 1;
            }
        }
    }

    (candidates, invalid)
}

/// Convert one list element into a candidate
///
/// `sequence` is left at 0; the orchestrator assigns detection order.
pub fn parse_candidate(item: &Value, chunk: &Chunk) -> Result<CandidateRecord, ExtractorError> {
    let obj = item
        .as_object()
        .ok_or_else(|| invalid("item is not a JSON object"))?;

    let description = DESCRIPTION_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("missing or blank 'description'"))?
        .to_string();

    let category = match obj.get("category") {
        Some(Value::String(label)) => Category::from_str(label).unwrap_or(Category::Other),
        _ => return Err(invalid("missing or invalid 'category'")),
    };

    let priority = match field(obj, &["priority", "severity"]) {
        None | Some(Value::Null) => Priority::default(),
        Some(Value::String(label)) => Priority::from_str(label).map_err(|e| invalid(&e))?,
        Some(_) => return Err(invalid("'priority' is not a string")),
    };

    let confidence = parse_confidence(obj.get("confidence"))?;

    let page = obj
        .get("page")
        .and_then(Value::as_u64)
        .filter(|&p| p > 0)
        .and_then(|p| u32::try_from(p).ok())
        .or(chunk.page);

    Ok(CandidateRecord {
        description,
        category,
        priority,
        confidence,
        page,
        method: ExtractionMethod::ModelDerived,
        chunk_index: Some(chunk.index),
        sequence: 0,
    })
}

fn field<'v>(obj: &'v Map<String, Value>, keys: &[&str]) -> Option<&'v Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

fn parse_confidence(value: Option<&Value>) -> Result<Confidence, ExtractorError> {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid("'confidence' is not finite"))?,
        Some(Value::String(s)) => {
            let s = s.trim();
            match s.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f64>().map(|v| v / 100.0),
                None => s.parse::<f64>(),
            }
            .map_err(|_| invalid(&format!("unparsable 'confidence' {:?}", s)))?
        }
        _ => return Err(invalid("missing or invalid 'confidence'")),
    };
    Confidence::new(raw).map_err(|e| invalid(&e))
}

fn invalid(reason: &str) -> ExtractorError {
    ExtractorError::InvalidCandidate(reason.to_string())
}
