//! Rule-based intent parsing
//!
//! First stage of query resolution: deterministic lexical matching over the
//! raw text. It always produces a parse; when few cues agree the confidence
//! is low and the orchestrator escalates to the model fallback.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::Result;
use crate::models::{ActivityCategory, Intent, ParsedQuery, ProcessingMethod};

/// One parsing strategy behind the common `parse` capability
///
/// Two variants exist: the rule-based parser below and the model-backed
/// fallback interpreter. The orchestrator selects between them by
/// confidence, never by inspecting the concrete type.
#[async_trait]
pub trait QueryParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedQuery>;

    fn name(&self) -> &'static str;
}

static IN_PLACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap());

const WEATHER_KEYWORDS: &[&str] = &[
    "weather",
    "temperature",
    "forecast",
    "rain",
    "sunny",
    "snow",
    "wind",
    "humidity",
    "hot",
    "cold",
    "warm",
];

const RECOMMENDATION_KEYWORDS: &[&str] =
    &["best", "top", "recommend", "suggest", "favorite", "popular", "worst"];

const SITUATIONAL_PHRASES: &[&str] = &["where", "should go", "can go", "where to", "should i"];

const BEACH_KEYWORDS: &[&str] =
    &["beach", "beaches", "coast", "shore", "seaside", "ocean", "sea"];

const MOUNTAIN_KEYWORDS: &[&str] = &[
    "mountain",
    "mountains",
    "peak",
    "peaks",
    "summit",
    "summits",
    "alpine",
    "hiking",
    "climbing",
];

const CITY_KEYWORDS: &[&str] =
    &["city", "cities", "town", "urban", "downtown", "capital"];

/// Words that look like proper nouns in position but never name a place
const LOCATION_SKIP_WORDS: &[&str] = &[
    "weather",
    "temperature",
    "forecast",
    "today",
    "tomorrow",
    "yesterday",
    "best",
    "top",
    "what",
    "whats",
    "where",
    "please",
];

/// Deterministic lexical parser
///
/// Confidence is `0.2 + 0.2 × cues` (capped at 1.0) where the cues are
/// independent signals: an intent keyword matched, a location was extracted,
/// the `in <Place>` pattern matched, and an activity-category keyword
/// matched. Monotonic in cue count; identical input yields an identical
/// parse.
pub struct RuleBasedParser;

#[async_trait]
impl QueryParser for RuleBasedParser {
    async fn parse(&self, text: &str) -> Result<ParsedQuery> {
        Ok(self.parse_text(text))
    }

    fn name(&self) -> &'static str {
        "rule_based"
    }
}

impl RuleBasedParser {
    pub fn parse_text(&self, text: &str) -> ParsedQuery {
        let lower = text.to_lowercase();

        let pattern_match = IN_PLACE_PATTERN
            .captures(text)
            .map(|caps| caps[1].to_string());
        let location = pattern_match
            .clone()
            .or_else(|| extract_capitalized_token(text));

        let category = detect_category(&lower);
        let recommendation = contains_any(&lower, RECOMMENDATION_KEYWORDS)
            || SITUATIONAL_PHRASES.iter().any(|p| lower.contains(p));
        let weather = contains_any(&lower, WEATHER_KEYWORDS);

        let intent = if recommendation {
            Intent::ActivityRecommendation
        } else if weather || location.is_some() {
            Intent::Weather
        } else {
            Intent::Unknown
        };

        let mut cues = 0u8;
        if weather || recommendation {
            cues += 1;
        }
        if location.is_some() {
            cues += 1;
        }
        if pattern_match.is_some() {
            cues += 1;
        }
        if category.is_some() {
            cues += 1;
        }
        let confidence = 0.2 + 0.2 * f32::from(cues);

        debug!(
            intent = ?intent,
            location = ?location,
            cues,
            confidence,
            "rule-based parse"
        );

        let mut parsed = ParsedQuery::new(
            text,
            intent,
            location,
            confidence,
            ProcessingMethod::RuleBased,
        );
        if intent == Intent::ActivityRecommendation {
            parsed = parsed.with_category(category.unwrap_or(ActivityCategory::General));
        }
        parsed
    }
}

fn contains_any(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

fn detect_category(lower: &str) -> Option<ActivityCategory> {
    if contains_any(lower, BEACH_KEYWORDS) {
        Some(ActivityCategory::Beach)
    } else if contains_any(lower, MOUNTAIN_KEYWORDS) {
        Some(ActivityCategory::Mountain)
    } else if contains_any(lower, CITY_KEYWORDS) {
        Some(ActivityCategory::City)
    } else {
        None
    }
}

/// Pull out a capitalized word that plausibly names a place
///
/// The first word of a multi-word query is skipped since English
/// capitalizes it regardless; a single-word query like "Marseille" is taken
/// as-is.
fn extract_capitalized_token(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    let start = usize::from(tokens.len() > 1);
    tokens
        .iter()
        .skip(start)
        .find(|token| {
            token.len() > 2
                && token.chars().next().is_some_and(char::is_uppercase)
                && token.chars().all(char::is_alphabetic)
                && !LOCATION_SKIP_WORDS.contains(&token.to_lowercase().as_str())
        })
        .map(|token| (*token).to_string())
}
