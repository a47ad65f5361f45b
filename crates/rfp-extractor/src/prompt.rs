//! LLM prompt engineering for requirement and risk extraction

use crate::types::Chunk;
use rfp_domain::{Category, RecordKind};

/// Builds the per-chunk extraction prompt
pub struct PromptBuilder<'a> {
    chunk: &'a Chunk,
    kind: RecordKind,
    source_id: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder for one chunk
    pub fn new(chunk: &'a Chunk, kind: RecordKind) -> Self {
        Self {
            chunk,
            kind,
            source_id: None,
        }
    }

    /// Mention the source document in the prompt
    pub fn with_source(mut self, source_id: &'a str) -> Self {
        self.source_id = Some(source_id);
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Instructions and output format
        prompt.push_str(match self.kind {
            RecordKind::Requirement => REQUIREMENT_INSTRUCTIONS,
            RecordKind::Risk => RISK_INSTRUCTIONS,
        });
        prompt.push_str("\n\n");

        // 2. Closed vocabularies
        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        prompt.push_str(&format!("Allowed categories: {}\n", categories.join(", ")));
        prompt.push_str(&format!(
            "Allowed {}: low, medium, high, critical\n\n",
            self.priority_field()
        ));

        // 3. Where the text comes from
        if let Some(source) = self.source_id {
            prompt.push_str(&format!("Source document: {}\n", source));
        }
        if let Some(page) = self.chunk.page {
            prompt.push_str(&format!("The excerpt starts on page {}.\n", page));
        }

        // 4. The text to analyze
        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&self.chunk.text);
        prompt.push_str("\n---\n\n");

        // 5. Output format reminder
        prompt.push_str(&self.output_format());

        prompt
    }

    fn priority_field(&self) -> &'static str {
        match self.kind {
            RecordKind::Requirement => "priority",
            RecordKind::Risk => "severity",
        }
    }

    fn output_format(&self) -> String {
        format!(
            r#"Output format (JSON array only, no additional text):
[
  {{
    "description": "the {} in one sentence, close to the source wording",
    "category": "one of the allowed categories",
    "{}": "low | medium | high | critical",
    "confidence": 0.0-1.0,
    "page": page number if known, otherwise omit
  }}
]

Return [] if the text contains no {}.
Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#,
            match self.kind {
                RecordKind::Requirement => "requirement",
                RecordKind::Risk => "risk",
            },
            self.priority_field(),
            self.kind.plural(),
        )
    }
}

const REQUIREMENT_INSTRUCTIONS: &str = r#"You are analysing an excerpt of a Request for Proposal (RFP).
Extract every requirement the bidder must or should satisfy.

Rules:
- One requirement per item; split compound sentences
- Keep the obligation wording ("must", "shall", "should") in the description
- Priority: critical for pass/fail or disqualifying criteria, high for mandatory
  ("must", "shall"), medium for expected ("should"), low for optional or desirable
- Confidence reflects how clearly the text states a requirement:
  - Explicit obligation with a modal verb: 0.85-0.95
  - Clear but implicit expectation: 0.6-0.8
  - Inferred from context: 0.4-0.6
- Ignore background, instructions to bidders about formatting, and marketing text"#;

const RISK_INSTRUCTIONS: &str = r#"You are analysing an excerpt of a Request for Proposal (RFP) or draft contract.
Extract every clause that creates commercial, legal, financial or delivery risk for the bidder.

Rules:
- One risk per item; quote or closely paraphrase the clause
- Typical risks: penalties and liquidated damages, uncapped or unlimited liability,
  indemnities, termination for convenience, fixed pricing, aggressive deadlines,
  audit rights, exclusivity, transfer of intellectual property
- Severity: critical for unlimited or uninsurable exposure, high for material
  financial or legal exposure, medium for manageable exposure, low for minor items
- Confidence reflects how clearly the clause creates the risk (0.0-1.0)"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, page: Option<u32>) -> Chunk {
        Chunk {
            index: 0,
            start: 0,
            end: text.chars().count(),
            page,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prompt_includes_text() {
        let c = chunk("The system must support 99.9% uptime.", None);
        let prompt = PromptBuilder::new(&c, RecordKind::Requirement).build();
        assert!(prompt.contains("The system must support 99.9% uptime."));
        assert!(prompt.contains("Extract every requirement"));
        assert!(prompt.contains("\"priority\""));
    }

    #[test]
    fn test_risk_prompt_asks_for_severity() {
        let c = chunk("Liquidated damages apply.", None);
        let prompt = PromptBuilder::new(&c, RecordKind::Risk).build();
        assert!(prompt.contains("Extract every clause"));
        assert!(prompt.contains("\"severity\""));
        assert!(prompt.contains("no risks"));
    }

    #[test]
    fn test_prompt_lists_categories() {
        let c = chunk("text", None);
        let prompt = PromptBuilder::new(&c, RecordKind::Requirement).build();
        for category in Category::ALL {
            assert!(prompt.contains(category.as_str()));
        }
    }

    #[test]
    fn test_prompt_includes_page_and_source() {
        let c = chunk("text", Some(7));
        let prompt = PromptBuilder::new(&c, RecordKind::Requirement)
            .with_source("tender-2026-014.pdf")
            .build();
        assert!(prompt.contains("starts on page 7"));
        assert!(prompt.contains("tender-2026-014.pdf"));
    }

    #[test]
    fn test_prompt_without_page() {
        let c = chunk("text", None);
        let prompt = PromptBuilder::new(&c, RecordKind::Requirement).build();
        assert!(!prompt.contains("starts on page"));
        assert!(!prompt.contains("Source document"));
    }
}
