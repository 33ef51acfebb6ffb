//! Read-only festival facts.
//!
//! Facts are an opaque JSON document used as grounding context for both the
//! chat model and the voice model. A handful of well-known top-level fields
//! are also read into `FestivalSummary` so voice instructions can be phrased
//! as sentences rather than a JSON dump.

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Facts shipped with the binary, used when no data file is configured.
const BUNDLED_FACTS: &str = include_str!("../../data/festival.json");

/// Errors loading festival facts.
#[derive(Debug, Error)]
pub enum FestivalError {
    /// The data file could not be read
    #[error("Failed to read festival data {path}: {source}")]
    Io {
        /// Path of the data file
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The data file is not valid JSON
    #[error("Invalid festival data: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document is valid JSON but not an object
    #[error("Festival data must be a JSON object")]
    NotAnObject,
}

/// Restaurant entry as listed in the facts.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RestaurantFact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
}

/// Well-known top-level fields of the facts document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FestivalSummary {
    pub name: String,
    pub period: String,
    pub location: String,
    pub organizers: String,
    pub contact: String,
    pub price: String,
    pub programs: Vec<String>,
    pub transport: String,
    pub lost_and_found: String,
    pub restaurants: Vec<RestaurantFact>,
}

/// The festival facts document.
#[derive(Debug, Clone)]
pub struct FestivalFacts {
    raw: Value,
    summary: FestivalSummary,
}

impl FestivalFacts {
    /// Build from an already parsed JSON document.
    pub fn from_value(raw: Value) -> Result<Self, FestivalError> {
        if !raw.is_object() {
            return Err(FestivalError::NotAnObject);
        }

        let summary = match serde_json::from_value::<FestivalSummary>(raw.clone()) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Festival facts do not match the expected summary fields");
                FestivalSummary::default()
            }
        };

        Ok(Self { raw, summary })
    }

    /// Parse a JSON string.
    pub fn from_json(json: &str) -> Result<Self, FestivalError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FestivalError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FestivalError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Facts shipped with the binary.
    pub fn bundled() -> Result<Self, FestivalError> {
        Self::from_json(BUNDLED_FACTS)
    }

    /// The full document.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn summary(&self) -> &FestivalSummary {
        &self.summary
    }

    /// Compact JSON rendering used inside model prompts.
    pub fn to_prompt_context(&self) -> String {
        self.raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bundled_facts_load() {
        let facts = FestivalFacts::bundled().unwrap();
        let summary = facts.summary();
        assert!(!summary.name.is_empty());
        assert!(!summary.programs.is_empty());
        assert!(!summary.restaurants.is_empty());
        assert!(facts.raw().get("parking").is_some());
    }

    #[test]
    fn test_summary_reads_camel_case() {
        let facts = FestivalFacts::from_value(json!({
            "name": "Test Fest",
            "lostAndFound": "Info desk",
            "restaurants": [{"name": "Noodles", "type": "Korean", "address": "Zone A"}]
        }))
        .unwrap();
        assert_eq!(facts.summary().lost_and_found, "Info desk");
        assert_eq!(facts.summary().restaurants[0].kind, "Korean");
        assert!(facts.summary().programs.is_empty());
    }

    #[test]
    fn test_unexpected_shapes_keep_raw_document() {
        let facts = FestivalFacts::from_value(json!({"name": {"ko": "축제"}})).unwrap();
        assert!(facts.summary().name.is_empty());
        assert_eq!(facts.raw()["name"]["ko"], "축제");
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            FestivalFacts::from_json("[1,2,3]"),
            Err(FestivalError::NotAnObject)
        ));
        assert!(matches!(
            FestivalFacts::from_json("{not json"),
            Err(FestivalError::Parse(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let err = FestivalFacts::from_file("/nonexistent/festival.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/festival.json"));
    }
}
