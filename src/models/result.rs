//! Final response shape returned to the caller

use serde::{Deserialize, Serialize};

use super::is_false;
use super::query::ParsedQuery;
use super::weather::WeatherOutcome;

/// Terminal status of a query resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Ok,
    NeedsLocation,
    Error,
}

/// Structured response to the caller
///
/// Invariants: `requires_location = true` implies `weather_data` is absent
/// and `status` is `NeedsLocation`; `suggested_actions` is non-empty only
/// when `requires_location` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub response: String,
    pub status: QueryStatus,
    pub parsed_query: ParsedQuery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_data: Option<WeatherOutcome>,
    pub processing_method: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_location: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
}

impl QueryResult {
    /// Check the structural invariants documented on this type
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        if self.requires_location
            && (self.weather_data.is_some() || self.status != QueryStatus::NeedsLocation)
        {
            return false;
        }
        if !self.suggested_actions.is_empty() && !self.requires_location {
            return false;
        }
        (0.0..=1.0).contains(&self.parsed_query.confidence)
    }
}

/// Reachability of the downstream services, for operational monitoring
///
/// Not part of query resolution logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub model_backend: bool,
    pub geocoding_backend: bool,
    pub retrieval_backend: bool,
}

impl HealthReport {
    #[must_use]
    pub fn all_healthy(&self) -> bool {
        self.model_backend && self.geocoding_backend && self.retrieval_backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::{Intent, ProcessingMethod};

    fn parsed() -> ParsedQuery {
        ParsedQuery::new(
            "Weather in Paris",
            Intent::Weather,
            Some("Paris".to_string()),
            0.8,
            ProcessingMethod::RuleBased,
        )
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&QueryStatus::NeedsLocation).unwrap(),
            "\"needs_location\""
        );
        assert_eq!(serde_json::to_string(&QueryStatus::Ok).unwrap(), "\"ok\"");
    }

    #[test]
    fn test_empty_optionals_omitted_from_json() {
        let result = QueryResult {
            response: "Here's the weather".to_string(),
            status: QueryStatus::Ok,
            parsed_query: parsed(),
            weather_data: None,
            processing_method: "rule_based".to_string(),
            requires_location: false,
            suggested_actions: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("weather_data").is_none());
        assert!(json.get("requires_location").is_none());
        assert!(json.get("suggested_actions").is_none());
    }

    #[test]
    fn test_invariant_violation_detected() {
        let result = QueryResult {
            response: "bad".to_string(),
            status: QueryStatus::Ok,
            parsed_query: parsed(),
            weather_data: None,
            processing_method: "rule_based".to_string(),
            requires_location: true,
            suggested_actions: vec!["Share your location".to_string()],
        };
        // requires_location with status Ok breaks the invariant
        assert!(!result.invariants_hold());
    }
}
