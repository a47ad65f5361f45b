//! Match extracted requirements to the service catalog

use crate::error::ExtractorError;
use crate::similarity::{overlap_coefficient, tokenize};
use rfp_domain::{Record, RecordId, RecordKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Default minimum overlap for a match
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// Words that carry no meaning for matching
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is", "it",
    "its", "must", "of", "on", "or", "our", "provide", "provided", "shall", "should", "that", "the", "their",
    "this", "to", "will", "with", "within", "bidder", "contractor", "supplier", "vendor", "system", "solution",
];

/// A service the organisation can offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Catalog identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// What the service covers
    #[serde(default)]
    pub description: String,

    /// Extra matching terms
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Best catalog service for one requirement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMatch {
    /// Matched requirement
    pub record_id: RecordId,

    /// Requirement text
    pub requirement: String,

    /// Matched service identifier
    pub service_id: String,

    /// Matched service name
    pub service_name: String,

    /// Share of requirement terms found in the service entry
    pub score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Service>),
    Wrapped { services: Vec<Service> },
}

/// In-memory service catalog
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<(Service, HashSet<String>)>,
}

impl ServiceCatalog {
    /// Build a catalog from services
    pub fn new(services: Vec<Service>) -> Self {
        let services = services
            .into_iter()
            .map(|service| {
                let mut text = format!("{} {}", service.name, service.description);
                for keyword in &service.keywords {
                    text.push(' ');
                    text.push_str(keyword);
                }
                let tokens = significant_tokens(&text);
                (service, tokens)
            })
            .collect();
        Self { services }
    }

    /// Parse a catalog: a JSON array of services or `{"services": [...]}`
    pub fn from_json(json: &str) -> Result<Self, ExtractorError> {
        let services = match serde_json::from_str::<CatalogFile>(json)? {
            CatalogFile::List(services) => services,
            CatalogFile::Wrapped { services } => services,
        };
        Ok(Self::new(services))
    }

    /// Load a catalog file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let catalog = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded {} catalog services from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Number of services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Best service per requirement with a score of at least `min_score`
    ///
    /// Risk records are skipped. Matches keep the order of `records`; on equal
    /// scores the service listed first wins.
    pub fn match_records(&self, records: &[Record], min_score: f64) -> Vec<ServiceMatch> {
        let mut matches = Vec::new();

        for record in records.iter().filter(|r| r.kind == RecordKind::Requirement) {
            let query = significant_tokens(&record.description);
            let best = self
                .services
                .iter()
                .map(|(service, tokens)| (service, overlap_coefficient(&query, tokens)))
                .fold(None::<(&Service, f64)>, |best, (service, score)| match best {
                    Some((_, best_score)) if best_score >= score => best,
                    _ => Some((service, score)),
                });

            match best {
                Some((service, score)) if score >= min_score => {
                    debug!(record = %record.id, service = %service.id, score, "matched requirement");
                    matches.push(ServiceMatch {
                        record_id: record.id,
                        requirement: record.description.clone(),
                        service_id: service.id.clone(),
                        service_name: service.name.clone(),
                        score,
                    });
                }
                _ => debug!(record = %record.id, "no catalog service above threshold"),
            }
        }

        matches
    }
}

fn significant_tokens(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfp_domain::{Category, Confidence, ExtractionMethod, Priority};

    const CATALOG: &str = r#"{
        "services": [
            {"id": "svc-hosting", "name": "Managed Hosting", "description": "Cloud hosting with 99.9% uptime SLA", "keywords": ["availability", "infrastructure"]},
            {"id": "svc-sec", "name": "Security Operations", "description": "Encryption, penetration testing and SOC monitoring", "keywords": ["iso27001"]}
        ]
    }"#;

    fn record(kind: RecordKind, description: &str) -> Record {
        Record::new(
            kind,
            description,
            Category::Technical,
            Priority::High,
            Confidence::new(0.9).unwrap(),
            None,
            ExtractionMethod::ModelDerived,
        )
    }

    #[test]
    fn test_parse_wrapped_and_plain() {
        assert_eq!(ServiceCatalog::from_json(CATALOG).unwrap().len(), 2);
        let plain = r#"[{"id": "x", "name": "Training"}]"#;
        assert_eq!(ServiceCatalog::from_json(plain).unwrap().len(), 1);
        assert!(ServiceCatalog::from_json("{\"nope\": 1}").is_err());
    }

    #[test]
    fn test_best_match_per_requirement() {
        let catalog = ServiceCatalog::from_json(CATALOG).unwrap();
        let records = vec![
            record(RecordKind::Requirement, "The vendor must guarantee 99.9% uptime for hosting"),
            record(RecordKind::Requirement, "All data must use encryption and annual penetration testing"),
            record(RecordKind::Requirement, "Staff must speak Welsh"),
        ];
        let matches = catalog.match_records(&records, DEFAULT_MIN_SCORE);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].service_id, "svc-hosting");
        assert_eq!(matches[0].record_id, records[0].id);
        assert_eq!(matches[1].service_id, "svc-sec");
        assert!(matches.iter().all(|m| m.score >= DEFAULT_MIN_SCORE));
    }

    #[test]
    fn test_risks_are_ignored() {
        let catalog = ServiceCatalog::from_json(CATALOG).unwrap();
        let records = vec![record(RecordKind::Risk, "Penalties for missing 99.9% uptime on hosting")];
        assert!(catalog.match_records(&records, 0.0).is_empty());
    }

    #[test]
    fn test_empty_catalog_matches_nothing() {
        let catalog = ServiceCatalog::default();
        assert!(catalog.is_empty());
        let records = vec![record(RecordKind::Requirement, "Managed hosting")];
        assert!(catalog.match_records(&records, 0.0).is_empty());
    }
}
