//! Regex heuristics that find requirement and risk sentences without an LLM

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::types::CandidateRecord;
use regex::{Regex, RegexBuilder};
use rfp_domain::{Category, Confidence, Document, ExtractionMethod, Priority, RecordKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sentences shorter than this are headings or list debris
const MIN_SENTENCE_CHARS: usize = 20;

/// A category-labelled pattern, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Category given to matching sentences
    pub category: Category,

    /// Priority (or severity) given to matching sentences
    pub priority: Priority,

    /// Regular expression, matched case-insensitively
    pub pattern: String,
}

impl PatternRule {
    /// Create a rule
    pub fn new(category: Category, priority: Priority, pattern: impl Into<String>) -> Self {
        Self {
            category,
            priority,
            pattern: pattern.into(),
        }
    }
}

/// Built-in requirement rules, most specific first
pub fn default_requirement_rules() -> Vec<PatternRule> {
    const MODAL: &str = r"\b(?:shall|must|is required to|are required to|will be required to)\b";
    vec![
        PatternRule::new(
            Category::Security,
            Priority::High,
            format!(
                r"{}.*\b(?:encrypt\w*|authenticat\w*|access control\w*|penetration test\w*|vulnerabilit\w*|iso\s*27001|soc\s*2|multi-factor|mfa)\b",
                MODAL
            ),
        ),
        PatternRule::new(
            Category::Compliance,
            Priority::High,
            format!(
                r"{}.*\b(?:gdpr|hipaa|pci[- ]dss|complian\w*|regulat\w*|accessibility|wcag)\b",
                MODAL
            ),
        ),
        PatternRule::new(
            Category::Timeline,
            Priority::High,
            format!(
                r"{}.*\b(?:no later than|deadline|within \d+ (?:business |working |calendar )?(?:days|weeks|months)|go-live|milestone)",
                MODAL
            ),
        ),
        PatternRule::new(
            Category::Operational,
            Priority::High,
            format!(
                r"{}.*(?:\b\d{{2}}(?:\.\d+)?\s*%|\buptime\b|\bavailability\b|\bservice levels?\b|\bsla\b|\b24\s*/\s*7\b|\bresponse times?\b)",
                MODAL
            ),
        ),
        PatternRule::new(
            Category::Technical,
            Priority::Medium,
            format!(
                r"{}.*\b(?:api|rest|integrat\w*|scalab\w*|latency|throughput|concurrent users|architecture)\b",
                MODAL
            ),
        ),
        PatternRule::new(Category::Functional, Priority::High, format!(r"{}|\bmandatory\b", MODAL)),
        PatternRule::new(
            Category::Functional,
            Priority::Medium,
            r"\b(?:should|desirable|preferred|nice to have)\b",
        ),
    ]
}

/// Built-in risk rules, most severe first
pub fn default_risk_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new(
            Category::Legal,
            Priority::Critical,
            r"\bunlimited liability\b|\bliability (?:is|shall be|will be) unlimited\b",
        ),
        PatternRule::new(
            Category::Financial,
            Priority::High,
            r"\b(?:liquidated damages|penalt(?:y|ies)|service credits?|withhold(?:ing)? (?:of )?payments?)\b",
        ),
        PatternRule::new(
            Category::Legal,
            Priority::High,
            r"\b(?:indemnif\w*|hold harmless|consequential (?:loss|losses|damages))\b",
        ),
        PatternRule::new(Category::Timeline, Priority::High, r"\btime is of the essence\b"),
        PatternRule::new(
            Category::Commercial,
            Priority::Medium,
            r"\b(?:terminat\w* for convenience|fixed[- ]price|most favou?red (?:customer|nation))\b",
        ),
        PatternRule::new(
            Category::Legal,
            Priority::Medium,
            r"\b(?:intellectual property|ip rights)\b.*\b(?:vest|transfer|assign)\w*",
        ),
        PatternRule::new(
            Category::Compliance,
            Priority::Medium,
            r"\b(?:audit rights?|right to audit|inspect\w* (?:the )?(?:books|records))\b",
        ),
        PatternRule::new(
            Category::Operational,
            Priority::Medium,
            r"\b(?:exclusiv\w*|step-in rights?|key personnel)\b",
        ),
    ]
}

struct CompiledRule {
    category: Category,
    priority: Priority,
    regex: Regex,
}

fn compile(rules: &[PatternRule]) -> Result<Vec<CompiledRule>, ExtractorError> {
    rules
        .iter()
        .map(|rule| {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .dot_matches_new_line(true)
                .build()
                .map_err(|e| ExtractorError::Config(format!("invalid pattern {:?}: {}", rule.pattern, e)))?;
            Ok(CompiledRule {
                category: rule.category,
                priority: rule.priority,
                regex,
            })
        })
        .collect()
}

/// Sentence-level regex matcher for both record kinds
pub struct PatternMatcher {
    requirement_rules: Vec<CompiledRule>,
    risk_rules: Vec<CompiledRule>,
    sentence_break: Regex,
}

impl PatternMatcher {
    /// Compile the given rule tables
    pub fn new(requirement_rules: &[PatternRule], risk_rules: &[PatternRule]) -> Result<Self, ExtractorError> {
        let sentence_break = Regex::new(r"[.!?]+\s+|\n\s*\n|\u{000C}")
            .map_err(|e| ExtractorError::Config(format!("sentence splitter: {}", e)))?;
        Ok(Self {
            requirement_rules: compile(requirement_rules)?,
            risk_rules: compile(risk_rules)?,
            sentence_break,
        })
    }

    /// Matcher with the built-in tables, unless the config replaces them
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        let requirement_rules = config
            .requirement_patterns
            .clone()
            .unwrap_or_else(default_requirement_rules);
        let risk_rules = config.risk_patterns.clone().unwrap_or_else(default_risk_rules);
        Self::new(&requirement_rules, &risk_rules)
    }

    /// Number of rules for `kind`
    pub fn rule_count(&self, kind: RecordKind) -> usize {
        self.rules(kind).len()
    }

    fn rules(&self, kind: RecordKind) -> &[CompiledRule] {
        match kind {
            RecordKind::Requirement => &self.requirement_rules,
            RecordKind::Risk => &self.risk_rules,
        }
    }

    /// Scan the whole document, one candidate per matching sentence
    ///
    /// Candidates carry no chunk index and are numbered from 0 in document
    /// order; the orchestrator renumbers them into its detection sequence.
    pub fn find(&self, document: &Document, kind: RecordKind, confidence: Confidence) -> Vec<CandidateRecord> {
        let rules = self.rules(kind);
        let mut candidates = Vec::new();

        for (char_offset, sentence) in self.sentences(document.text()) {
            if sentence.chars().count() < MIN_SENTENCE_CHARS {
                continue;
            }
            let Some(rule) = rules.iter().find(|rule| rule.regex.is_match(sentence)) else {
                continue;
            };

            candidates.push(CandidateRecord {
                description: sentence.split_whitespace().collect::<Vec<_>>().join(" "),
                category: rule.category,
                priority: rule.priority,
                confidence,
                page: document.page_at(char_offset),
                method: ExtractionMethod::PatternDerived,
                chunk_index: None,
                sequence: candidates.len(),
            });
        }

        debug!(kind = %kind, matches = candidates.len(), "pattern scan complete");
        candidates
    }

    /// Trimmed sentences with the char offset of their first character
    fn sentences<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        let mut sentences = Vec::new();
        let mut byte_pos = 0;
        let mut char_pos = 0;

        let mut push = |from: usize, to: usize, char_pos: usize| {
            let raw = &text[from..to];
            let trimmed = raw.trim_start();
            let leading = raw[..raw.len() - trimmed.len()].chars().count();
            let trimmed = trimmed.trim_end();
            if !trimmed.is_empty() {
                sentences.push((char_pos + leading, trimmed));
            }
        };

        for m in self.sentence_break.find_iter(text) {
            // Keep terminal punctuation with its sentence
            let end = m.start() + m.as_str().trim_end().len();
            push(byte_pos, end, char_pos);
            char_pos += text[byte_pos..m.end()].chars().count();
            byte_pos = m.end();
        }
        push(byte_pos, text.len(), char_pos);

        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> PatternMatcher {
        PatternMatcher::new(&default_requirement_rules(), &default_risk_rules()).unwrap()
    }

    fn half() -> Confidence {
        Confidence::new(0.5).unwrap()
    }

    #[test]
    fn test_default_rules_compile() {
        let m = matcher();
        assert_eq!(m.rule_count(RecordKind::Requirement), default_requirement_rules().len());
        assert_eq!(m.rule_count(RecordKind::Risk), default_risk_rules().len());
    }

    #[test]
    fn test_uptime_requirement_is_operational() {
        let doc = Document::new("Introduction. The platform must support 99.9% uptime during business hours.");
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, Category::Operational);
        assert_eq!(found[0].priority, Priority::High);
        assert_eq!(found[0].method, ExtractionMethod::PatternDerived);
        assert_eq!(found[0].chunk_index, None);
        assert_eq!(found[0].description, "The platform must support 99.9% uptime during business hours.");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let doc = Document::new("All data at rest must be encrypted to meet GDPR obligations.");
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found[0].category, Category::Security);
    }

    #[test]
    fn test_plain_mandatory_statement() {
        let doc = Document::new("The supplier shall provide monthly written progress reports.");
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found[0].category, Category::Functional);
        assert_eq!(found[0].priority, Priority::High);
    }

    #[test]
    fn test_desirable_statement_is_medium() {
        let doc = Document::new("The portal should offer a dark colour theme for operators.");
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found[0].priority, Priority::Medium);
    }

    #[test]
    fn test_risk_rules() {
        let doc = Document::new(
            "The Contractor accepts unlimited liability for data loss.\n\n\
             Late delivery will incur liquidated damages of 1% per week.",
        );
        let found = matcher().find(&doc, RecordKind::Risk, half());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].category, Category::Legal);
        assert_eq!(found[0].priority, Priority::Critical);
        assert_eq!(found[1].category, Category::Financial);
    }

    #[test]
    fn test_short_and_unmatched_sentences_skipped() {
        let doc = Document::new("Must encrypt. The weather in the region is generally mild.");
        assert!(matcher().find(&doc, RecordKind::Requirement, half()).is_empty());
    }

    #[test]
    fn test_pages_resolved_from_offsets() {
        let doc = Document::from_pages([
            "Background on the authority and its current estate.",
            "The supplier shall provide a named account manager.",
        ]);
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page, Some(2));
    }

    #[test]
    fn test_page_offsets_survive_multibyte_text() {
        let doc = Document::from_pages([
            "Überblick über die Ausschreibung für Dienstleistungen.",
            "The supplier shall provide a named account manager.",
        ]);
        let found = matcher().find(&doc, RecordKind::Requirement, half());
        assert_eq!(found[0].page, Some(2));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let rules = vec![PatternRule::new(Category::Other, Priority::Low, "(unclosed")];
        assert!(matches!(PatternMatcher::new(&rules, &[]), Err(ExtractorError::Config(_))));
    }

    #[test]
    fn test_config_replaces_tables() {
        let config = ExtractorConfig {
            risk_patterns: Some(vec![PatternRule::new(Category::Commercial, Priority::Low, r"\bescrow\b")]),
            ..ExtractorConfig::default()
        };
        let m = PatternMatcher::from_config(&config).unwrap();
        assert_eq!(m.rule_count(RecordKind::Risk), 1);

        let doc = Document::new("Source code must be deposited in escrow annually.");
        let found = m.find(&doc, RecordKind::Risk, half());
        assert_eq!(found[0].category, Category::Commercial);
    }
}
