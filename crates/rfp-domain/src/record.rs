//! Record module - extracted requirements and risk clauses

use crate::Confidence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a record based on UUIDv7
///
/// Serialized as the canonical hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(u128);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    ///
    /// # Examples
    ///
    /// ```
    /// use rfp_domain::RecordId;
    ///
    /// let id = RecordId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RecordId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RecordId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid record id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_string(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

/// What an extraction run is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Something the bidder must deliver or comply with
    Requirement,
    /// A contractual or delivery clause that exposes the bidder to risk
    Risk,
}

impl RecordKind {
    /// Plural label used in prompts and logs
    pub fn plural(&self) -> &'static str {
        match self {
            RecordKind::Requirement => "requirements",
            RecordKind::Risk => "risks",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Requirement => write!(f, "requirement"),
            RecordKind::Risk => write!(f, "risk"),
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "requirement" | "requirements" => Ok(RecordKind::Requirement),
            "risk" | "risks" => Ok(RecordKind::Risk),
            other => Err(format!("Unknown record kind: {}", other)),
        }
    }
}

/// Closed set of record categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Technical capability, architecture, performance
    Technical,
    /// Functional behaviour of the delivered solution
    Functional,
    /// Regulatory or standards compliance
    Compliance,
    /// Security and data protection
    Security,
    /// Commercial terms and pricing structure
    Commercial,
    /// Contractual and legal terms
    Legal,
    /// Payment, penalties and financial exposure
    Financial,
    /// Deadlines, milestones and schedule
    Timeline,
    /// Operations, support and service levels
    Operational,
    /// Anything that does not fit the categories above
    Other,
}

impl Category {
    /// All categories in declaration order
    pub const ALL: [Category; 10] = [
        Category::Technical,
        Category::Functional,
        Category::Compliance,
        Category::Security,
        Category::Commercial,
        Category::Legal,
        Category::Financial,
        Category::Timeline,
        Category::Operational,
        Category::Other,
    ];

    /// Stable lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Functional => "functional",
            Category::Compliance => "compliance",
            Category::Security => "security",
            Category::Commercial => "commercial",
            Category::Legal => "legal",
            Category::Financial => "financial",
            Category::Timeline => "timeline",
            Category::Operational => "operational",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parse a category label, accepting common synonyms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match normalize_label(s).as_str() {
            "technical" | "tech" | "performance" | "architecture" | "integration" => Category::Technical,
            "functional" | "function" | "feature" => Category::Functional,
            "compliance" | "regulatory" | "standards" => Category::Compliance,
            "security" | "privacy" | "data_protection" => Category::Security,
            "commercial" | "pricing" | "business" => Category::Commercial,
            "legal" | "contractual" | "contract" | "liability" => Category::Legal,
            "financial" | "finance" | "payment" | "cost" => Category::Financial,
            "timeline" | "schedule" | "deadline" | "delivery" => Category::Timeline,
            "operational" | "operations" | "support" | "service_level" | "sla" => Category::Operational,
            "other" | "general" | "misc" => Category::Other,
            other => return Err(format!("Unknown category: {}", other)),
        };
        Ok(category)
    }
}

/// Requirement priority, or risk severity
///
/// Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Nice to have / minor exposure
    Low,
    /// Expected / moderate exposure
    Medium,
    /// Mandatory / major exposure
    High,
    /// Disqualifying if missed / severe exposure
    Critical,
}

impl Priority {
    /// Stable lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Parse a priority or severity label, including MoSCoW terms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let priority = match normalize_label(s).as_str() {
            "critical" | "severe" | "blocker" => Priority::Critical,
            "high" | "major" | "mandatory" | "must" | "must_have" => Priority::High,
            "medium" | "moderate" | "normal" | "should" | "should_have" => Priority::Medium,
            "low" | "minor" | "optional" | "could" | "could_have" => Priority::Low,
            other => return Err(format!("Unknown priority: {}", other)),
        };
        Ok(priority)
    }
}

/// How a record was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Produced by a language model
    ModelDerived,
    /// Produced by the regular-expression matcher
    PatternDerived,
    /// Entered by a user
    Manual,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::ModelDerived => write!(f, "model_derived"),
            ExtractionMethod::PatternDerived => write!(f, "pattern_derived"),
            ExtractionMethod::Manual => write!(f, "manual"),
        }
    }
}

/// A final extracted record
///
/// Records are flat so they serialize to a single JSON object per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier
    pub id: RecordId,

    /// Requirement or risk
    pub kind: RecordKind,

    /// Free-text statement of the requirement or risk
    pub description: String,

    /// Category from the closed set
    pub category: Category,

    /// Priority (requirements) or severity (risks)
    pub priority: Priority,

    /// Extraction certainty
    pub confidence: Confidence,

    /// 1-based source page, when known
    #[serde(default)]
    pub page: Option<u32>,

    /// How the record was produced
    pub extraction_method: ExtractionMethod,

    /// Whether a user has reviewed the record
    #[serde(default)]
    pub verified: bool,
}

impl Record {
    /// Create a new unverified record
    pub fn new(
        kind: RecordKind,
        description: impl Into<String>,
        category: Category,
        priority: Priority,
        confidence: Confidence,
        page: Option<u32>,
        extraction_method: ExtractionMethod,
    ) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            description: description.into(),
            category,
            priority,
            confidence,
            page,
            extraction_method,
            verified: false,
        }
    }

    /// Create a manually entered record
    ///
    /// Manual records are fully confident and already verified.
    pub fn manual(
        kind: RecordKind,
        description: impl Into<String>,
        category: Category,
        priority: Priority,
        page: Option<u32>,
    ) -> Self {
        let mut record = Self::new(
            kind,
            description,
            category,
            priority,
            Confidence::CERTAIN,
            page,
            ExtractionMethod::Manual,
        );
        record.verified = true;
        record
    }

    /// Mark the record as reviewed
    pub fn verify(&mut self) {
        self.verified = true;
    }
}

fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display_and_parse() {
        let id = RecordId::new();
        let id_str = id.to_string();
        assert_eq!(id_str.len(), 36);
        assert_eq!(RecordId::from_string(&id_str).unwrap(), id);
        assert!(RecordId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_category_synonyms() {
        assert_eq!("Regulatory".parse::<Category>().unwrap(), Category::Compliance);
        assert_eq!("service level".parse::<Category>().unwrap(), Category::Operational);
        assert_eq!("SLA".parse::<Category>().unwrap(), Category::Operational);
        assert!("astrology".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!("Must Have".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("severe".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!("could".parse::<Priority>().unwrap(), Priority::Low);
        assert!("whenever".parse::<Priority>().is_err());
        assert!(Priority::Critical > Priority::Low);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("risks".parse::<RecordKind>().unwrap(), RecordKind::Risk);
        assert_eq!("Requirement".parse::<RecordKind>().unwrap(), RecordKind::Requirement);
        assert!("clause".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_manual_record_is_verified() {
        let record = Record::manual(
            RecordKind::Requirement,
            "Provide on-site training",
            Category::Operational,
            Priority::Low,
            None,
        );
        assert!(record.verified);
        assert_eq!(record.extraction_method, ExtractionMethod::Manual);
        assert_eq!(record.confidence, Confidence::CERTAIN);
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new(
            RecordKind::Risk,
            "Unlimited liability for data loss",
            Category::Legal,
            Priority::Critical,
            Confidence::new(0.81).unwrap(),
            Some(7),
            ExtractionMethod::ModelDerived,
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["kind"], "risk");
        assert_eq!(value["category"], "legal");
        assert_eq!(value["priority"], "critical");
        assert_eq!(value["extraction_method"], "model_derived");
        assert_eq!(value["page"], 7);
        assert_eq!(value["verified"], false);
        assert_eq!(value["id"], record.id.to_string());
    }

    #[test]
    fn test_verified_defaults_to_false_on_import() {
        let json = r#"{
            "id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "kind": "requirement",
            "description": "Support SSO",
            "category": "security",
            "priority": "high",
            "confidence": 0.9,
            "extraction_method": "pattern_derived"
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert!(!record.verified);
        assert_eq!(record.page, None);
    }
}
