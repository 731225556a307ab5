//! Parsed query model and the incoming request shape

use serde::{Deserialize, Serialize};

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Current conditions for some place
    Weather,
    /// "Best beaches in Spain", "where should I go hiking" and similar
    ActivityRecommendation,
    /// No reliable signal found
    Unknown,
}

/// Kind of place an activity question is about
///
/// Drives which suggested actions are offered when the user still needs to
/// share a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Beach,
    Mountain,
    City,
    General,
}

/// Which stage produced the final parse (last writer wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    RuleBased,
    ModelFallback,
}

impl ProcessingMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMethod::RuleBased => "rule_based",
            ProcessingMethod::ModelFallback => "model_fallback",
        }
    }
}

/// Structured interpretation of a free-text query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// The raw text as the caller sent it
    pub original_query: String,
    pub intent: Intent,
    /// Place reference extracted from the text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Always within [0, 1]
    pub confidence: f32,
    pub processing_method: ProcessingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
}

impl ParsedQuery {
    /// Create a parse result, clamping confidence into [0, 1]
    #[must_use]
    pub fn new(
        original_query: impl Into<String>,
        intent: Intent,
        location: Option<String>,
        confidence: f32,
        processing_method: ProcessingMethod,
    ) -> Self {
        Self {
            original_query: original_query.into(),
            intent,
            location,
            confidence: confidence.clamp(0.0, 1.0),
            processing_method,
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: ActivityCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// One turn of caller-supplied conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request body accepted by the orchestrator
///
/// Conversation state lives with the caller; it is passed in explicitly
/// rather than recovered from any process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<Vec<ChatMessage>>,
}

impl QueryRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            user_location: None,
            chat_history: None,
        }
    }

    #[must_use]
    pub fn with_user_location(mut self, location: impl Into<String>) -> Self {
        self.user_location = Some(location.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let parsed = ParsedQuery::new(
            "Weather in Paris",
            Intent::Weather,
            Some("Paris".to_string()),
            1.7,
            ProcessingMethod::RuleBased,
        );
        assert_eq!(parsed.confidence, 1.0);

        let parsed = ParsedQuery::new("??", Intent::Unknown, None, -0.5, ProcessingMethod::RuleBased);
        assert_eq!(parsed.confidence, 0.0);
    }

    #[test]
    fn test_intent_serialization() {
        let json = serde_json::to_string(&Intent::ActivityRecommendation).unwrap();
        assert_eq!(json, "\"activity_recommendation\"");
        let json = serde_json::to_string(&ProcessingMethod::ModelFallback).unwrap();
        assert_eq!(json, "\"model_fallback\"");
    }

    #[test]
    fn test_optional_fields_omitted() {
        let parsed = ParsedQuery::new("hello", Intent::Unknown, None, 0.2, ProcessingMethod::RuleBased);
        let json = serde_json::to_value(&parsed).unwrap();
        assert!(json.get("location").is_none());
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_request_deserializes_without_optionals() {
        let request: QueryRequest = serde_json::from_str(r#"{"query": "Weather in Paris"}"#).unwrap();
        assert_eq!(request.query, "Weather in Paris");
        assert!(request.user_location.is_none());
        assert!(request.chat_history.is_none());
    }
}
