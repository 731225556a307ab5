//! Generative model backend (Ollama-compatible API)
//!
//! Hosts the fallback interpreter invoked when the rule-based parse is below
//! the escalation threshold, and the recommendation source used for
//! "best X in Y" queries. Model output is validated against the
//! `ParsedQuery` schema; anything malformed is reported as a parse failure
//! so the orchestrator can keep the rule-based result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::AskWeatherError;
use crate::intent_parser::QueryParser;
use crate::models::{ActivityCategory, Intent, ParsedQuery, ProcessingMethod};
use crate::Result;

const INTERPRET_PROMPT: &str = r#"You are a weather query parser. Extract information from weather-related queries and return ONLY a valid JSON response.

EXAMPLES:
Query: "Temperature in Madrid" -> {"intent": "weather", "location": "Madrid", "confidence": 0.9}
Query: "Marseille" -> {"intent": "weather", "location": "Marseille", "confidence": 0.8}
Query: "Where should I go to the beach?" -> {"intent": "beach_recommendation", "location": null, "confidence": 0.9}
Query: "Best peaks in Switzerland" -> {"intent": "mountain_recommendation", "location": "Switzerland", "confidence": 0.9}

JSON STRUCTURE:
{
    "intent": "weather|beach_recommendation|city_recommendation|mountain_recommendation|place_recommendation|unknown",
    "location": "city or country, or null",
    "confidence": 0.0-1.0
}

RULES:
- Extract city names (including nicknames like "Big Apple" -> "New York")
- If the query is just a place name, use the "weather" intent
- Return ONLY the JSON, no explanations
- Use confidence 0.8-0.9 for clear queries, 0.6-0.7 for ambiguous ones"#;

const RECOMMEND_PROMPT: &str = r#"You are a travel recommendation assistant. Given a query about finding places, return a JSON list of specific locations.

EXAMPLES:
Query: "Best cities in Spain" -> {"locations": ["Madrid", "Barcelona", "Seville", "Valencia", "Bilbao"]}
Query: "Famous mountains in Switzerland" -> {"locations": ["Matterhorn", "Jungfrau", "Eiger", "Pilatus", "Rigi"]}

RULES:
- For mountains return mountain names, not nearby cities
- Return 3-5 specific locations, never countries
- Return ONLY valid JSON, no other text"#;

/// Client for an Ollama-compatible generate endpoint
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Raw shape expected back from the interpretation prompt
#[derive(Deserialize)]
struct RawInterpretation {
    intent: String,
    #[serde(default)]
    location: Option<String>,
    confidence: f32,
}

#[derive(Deserialize)]
struct RawRecommendations {
    #[serde(default)]
    locations: Vec<String>,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(config: &ModelConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("askweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions { temperature: 0.1 },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AskWeatherError::transient(format!("model backend unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AskWeatherError::transient(format!(
                "model backend returned {}",
                response.status()
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AskWeatherError::parse(format!("invalid generate response: {e}")))?;

        Ok(generated.response)
    }

}

#[async_trait]
impl QueryParser for OllamaClient {
    /// Ask the model for a structured interpretation of the query
    ///
    /// Malformed output is an `Err`; the orchestrator then keeps the
    /// rule-based parse instead of propagating the failure.
    async fn parse(&self, text: &str) -> Result<ParsedQuery> {
        let prompt = format!("{INTERPRET_PROMPT}\n\nQuery: {text}");
        let output = self.generate(prompt).await?;
        debug!(output = %output, "model interpretation");
        parse_interpretation(text, &output)
    }

    fn name(&self) -> &'static str {
        "model_fallback"
    }
}

/// Source of concrete place candidates for recommendation queries
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Return location candidates for a prompt like "Best beaches in Spain"
    async fn recommend(&self, query: &str) -> Result<Vec<String>>;

    /// Whether the backing model service is currently reachable
    async fn health_check(&self) -> bool;
}

#[async_trait]
impl RecommendationSource for OllamaClient {
    async fn recommend(&self, query: &str) -> Result<Vec<String>> {
        let prompt = format!("{RECOMMEND_PROMPT}\n\nQuery: {query}");
        let output = self.generate(prompt).await?;
        let json = extract_json(&output)
            .ok_or_else(|| AskWeatherError::parse("no JSON object in model output"))?;
        let raw: RawRecommendations = serde_json::from_str(json)
            .map_err(|e| AskWeatherError::parse(format!("invalid recommendations: {e}")))?;
        Ok(raw
            .locations
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// Whether the model backend answers its tags endpoint
    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("Model backend health check failed: {}", e);
                false
            }
        }
    }
}

/// Validate model output against the `ParsedQuery` schema
fn parse_interpretation(query: &str, output: &str) -> Result<ParsedQuery> {
    let json = extract_json(output)
        .ok_or_else(|| AskWeatherError::parse("no JSON object in model output"))?;

    let raw: RawInterpretation = serde_json::from_str(json)
        .map_err(|e| AskWeatherError::parse(format!("invalid interpretation: {e}")))?;

    let location = raw
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let (intent, category) = map_intent(&raw.intent);

    let mut parsed = ParsedQuery::new(
        query,
        intent,
        location,
        raw.confidence,
        ProcessingMethod::ModelFallback,
    );
    if let Some(category) = category {
        parsed = parsed.with_category(category);
    }
    Ok(parsed)
}

/// Map the model's free-form intent label onto the closed intent set
fn map_intent(label: &str) -> (Intent, Option<ActivityCategory>) {
    let label = label.to_lowercase();
    if label.contains("recommendation") {
        let category = if label.contains("beach") {
            ActivityCategory::Beach
        } else if label.contains("mountain") {
            ActivityCategory::Mountain
        } else if label.contains("city") {
            ActivityCategory::City
        } else {
            ActivityCategory::General
        };
        (Intent::ActivityRecommendation, Some(category))
    } else if label.contains("weather")
        || label.contains("temperature")
        || label.contains("forecast")
    {
        (Intent::Weather, None)
    } else {
        (Intent::Unknown, None)
    }
}

/// Pull the first JSON object out of possibly chatty model output
fn extract_json(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    (end > start).then(|| &output[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_interpretation() {
        let output = r#"{"intent": "weather", "location": "Madrid", "confidence": 0.9}"#;
        let parsed = parse_interpretation("Temperature in Madrid", output).unwrap();
        assert_eq!(parsed.intent, Intent::Weather);
        assert_eq!(parsed.location.as_deref(), Some("Madrid"));
        assert_eq!(parsed.confidence, 0.9);
        assert_eq!(parsed.processing_method, ProcessingMethod::ModelFallback);
    }

    #[test]
    fn test_parse_interpretation_with_surrounding_chatter() {
        let output = "Sure! Here is the JSON:\n```json\n{\"intent\": \"beach_recommendation\", \"location\": null, \"confidence\": 0.9}\n```";
        let parsed = parse_interpretation("Where should I go to the beach?", output).unwrap();
        assert_eq!(parsed.intent, Intent::ActivityRecommendation);
        assert_eq!(parsed.category, Some(ActivityCategory::Beach));
        assert!(parsed.location.is_none());
    }

    #[test]
    fn test_malformed_output_is_an_error() {
        assert!(parse_interpretation("hello", "I cannot help with that").is_err());
        assert!(parse_interpretation("hello", "{not json}").is_err());
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        let output = r#"{"intent": "weather", "location": "Oslo", "confidence": 7.5}"#;
        let parsed = parse_interpretation("Oslo", output).unwrap();
        assert_eq!(parsed.confidence, 1.0);
    }

    #[test]
    fn test_blank_location_becomes_none() {
        let output = r#"{"intent": "weather", "location": "  ", "confidence": 0.7}"#;
        let parsed = parse_interpretation("is it raining", output).unwrap();
        assert!(parsed.location.is_none());
    }

    #[test]
    fn test_unknown_label_maps_to_unknown_intent() {
        let (intent, category) = map_intent("smalltalk");
        assert_eq!(intent, Intent::Unknown);
        assert!(category.is_none());

        let (intent, category) = map_intent("mountain_recommendation");
        assert_eq!(intent, Intent::ActivityRecommendation);
        assert_eq!(category, Some(ActivityCategory::Mountain));
    }

    #[test]
    fn test_extract_json_bounds() {
        assert_eq!(extract_json("x { \"a\": 1 } y"), Some("{ \"a\": 1 }"));
        assert_eq!(extract_json("no braces"), None);
        assert_eq!(extract_json("}{"), None);
    }
}
