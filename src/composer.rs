//! Response composition
//!
//! Pure functions turning (parsed query, resolution outcome, retrieval
//! outcome) into the final `QueryResult`. No I/O happens here; everything
//! the composer needs is passed in.
//!
//! Decision table:
//! - location required but not resolved  -> `needs_location` + suggestions
//! - resolved, retrieval succeeded       -> `ok`
//! - resolved, retrieval failed          -> `error`, text explains failure

use crate::models::{
    ActivityCategory, ParsedQuery, QueryResult, QueryStatus, ResolvedLocation, WeatherOutcome,
};

pub struct ResponseComposer;

impl ResponseComposer {
    /// Build the final result for the weather path
    ///
    /// `outcome = None` means retrieval was skipped because no location was
    /// available or resolvable.
    #[must_use]
    pub fn compose(
        parsed: ParsedQuery,
        resolved: Option<&ResolvedLocation>,
        outcome: Option<WeatherOutcome>,
    ) -> QueryResult {
        match outcome {
            Some(outcome) if outcome.success => {
                let response = format_conditions(&outcome);
                Self::result(parsed, response, QueryStatus::Ok, Some(outcome), false, vec![])
            }
            Some(outcome) => {
                let mut response =
                    format!("Sorry, I couldn't get weather data for {}.", outcome.location);
                if outcome.is_transient_failure() {
                    response.push_str(" Please try again in a moment.");
                }
                Self::result(parsed, response, QueryStatus::Error, Some(outcome), false, vec![])
            }
            None => Self::needs_location(parsed, resolved),
        }
    }

    /// Ask the user for a location, with actionable suggestions
    #[must_use]
    pub fn needs_location(parsed: ParsedQuery, resolved: Option<&ResolvedLocation>) -> QueryResult {
        let unresolved_place = resolved
            .filter(|r| !r.resolved && !r.raw_text.trim().is_empty())
            .map(|r| r.raw_text.clone());

        let response = match &unresolved_place {
            Some(place) => format!(
                "I couldn't find a place called '{place}'. Could you check the spelling or tell me a nearby city?"
            ),
            None => {
                "I need a location to answer that. Could you tell me your current city or the place you're asking about?"
                    .to_string()
            }
        };

        let suggestions = suggested_actions(parsed.category);

        Self::result(
            parsed,
            response,
            QueryStatus::NeedsLocation,
            None,
            true,
            suggestions,
        )
    }

    /// Summarize weather across recommended places ("Best beaches in Spain")
    #[must_use]
    pub fn recommendation_summary(
        parsed: ParsedQuery,
        place: &str,
        results: Vec<WeatherOutcome>,
    ) -> QueryResult {
        let label = category_label_plural(parsed.category);

        if results.is_empty() {
            let response = format!(
                "Sorry, I couldn't get weather data for the recommended {label} in {place}."
            );
            return Self::result(parsed, response, QueryStatus::Error, None, false, vec![]);
        }

        let mut parts = vec![format!("Best {label} in {place} today:")];
        for outcome in &results {
            parts.push(format!(
                "🏙️ {}: {}, {}",
                outcome.location,
                outcome.temperature.as_deref().unwrap_or("N/A"),
                outcome.condition.as_deref().unwrap_or("N/A"),
            ));
        }

        Self::result(parsed, parts.join(" "), QueryStatus::Ok, None, false, vec![])
    }

    fn result(
        parsed: ParsedQuery,
        response: String,
        status: QueryStatus,
        weather_data: Option<WeatherOutcome>,
        requires_location: bool,
        suggested_actions: Vec<String>,
    ) -> QueryResult {
        let processing_method = parsed.processing_method.as_str().to_string();
        let result = QueryResult {
            response,
            status,
            parsed_query: parsed,
            weather_data,
            processing_method,
            requires_location,
            suggested_actions,
        };
        debug_assert!(result.invariants_hold());
        result
    }
}

fn format_conditions(outcome: &WeatherOutcome) -> String {
    let mut parts = vec![format!("Here's the weather for {}:", outcome.location)];
    if let Some(temperature) = &outcome.temperature {
        parts.push(format!("🌡️ Temperature: {temperature}"));
    }
    if let Some(condition) = &outcome.condition {
        parts.push(format!("☁️ Condition: {condition}"));
    }
    parts.join(" ")
}

fn category_label_plural(category: Option<ActivityCategory>) -> &'static str {
    match category {
        Some(ActivityCategory::Beach) => "beaches",
        Some(ActivityCategory::Mountain) => "mountains",
        Some(ActivityCategory::City) => "cities",
        Some(ActivityCategory::General) | None => "places",
    }
}

fn suggested_actions(category: Option<ActivityCategory>) -> Vec<String> {
    let suggestions: &[&str] = match category {
        Some(ActivityCategory::Beach) => &[
            "Tell me your location to find nearby beaches",
            "Or ask about a specific beach (e.g., 'Weather at Miami Beach')",
            "Or ask about beaches in a country (e.g., 'Best beaches in Spain')",
        ],
        Some(ActivityCategory::Mountain) => &[
            "Tell me your location to find nearby mountains",
            "Or ask about a specific mountain (e.g., 'Weather at Mont Blanc')",
            "Or ask about mountains in a country (e.g., 'Top peaks in Switzerland')",
        ],
        Some(ActivityCategory::City) => &[
            "Tell me your location to find nearby cities",
            "Or ask about a specific city (e.g., 'Weather in Paris')",
            "Or ask about cities in a country (e.g., 'Best cities in Italy')",
        ],
        Some(ActivityCategory::General) | None => &[
            "Tell me your current location",
            "Or ask about a specific place (e.g., 'Weather in Paris')",
            "Or ask about places in a region (e.g., 'Best places in Europe')",
        ],
    };
    suggestions.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Intent, ProcessingMethod};

    fn parsed(intent: Intent, location: Option<&str>) -> ParsedQuery {
        ParsedQuery::new(
            "test query",
            intent,
            location.map(String::from),
            0.8,
            ProcessingMethod::RuleBased,
        )
    }

    #[test]
    fn test_successful_retrieval_is_ok() {
        let outcome = WeatherOutcome::success(
            "Paris, France",
            Some("18.4°C".to_string()),
            Some("Clear sky".to_string()),
            "open-meteo",
        );
        let resolved = ResolvedLocation::resolved("Paris", "Paris, France", 48.86, 2.35);
        let result = ResponseComposer::compose(
            parsed(Intent::Weather, Some("Paris")),
            Some(&resolved),
            Some(outcome),
        );

        assert_eq!(result.status, QueryStatus::Ok);
        assert!(!result.requires_location);
        assert!(result.suggested_actions.is_empty());
        assert!(result.response.contains("Paris, France"));
        assert!(result.response.contains("18.4°C"));
        assert!(result.invariants_hold());
    }

    #[test]
    fn test_failed_retrieval_is_error_with_explanation() {
        let outcome = WeatherOutcome::failure("Paris, France", "open-meteo", "request timed out");
        let resolved = ResolvedLocation::resolved("Paris", "Paris, France", 48.86, 2.35);
        let result = ResponseComposer::compose(
            parsed(Intent::Weather, Some("Paris")),
            Some(&resolved),
            Some(outcome),
        );

        assert_eq!(result.status, QueryStatus::Error);
        assert!(!result.requires_location);
        assert!(result.suggested_actions.is_empty());
        assert!(result.response.contains("couldn't get weather data"));
        // Transient failures invite a retry
        assert!(result.response.contains("try again"));
        assert!(result.weather_data.is_some());
        assert!(result.invariants_hold());
    }

    #[test]
    fn test_permanent_failure_has_no_retry_hint() {
        let outcome =
            WeatherOutcome::failure("Paris, France", "open-meteo", "no data published for location");
        let result =
            ResponseComposer::compose(parsed(Intent::Weather, Some("Paris")), None, Some(outcome));
        assert_eq!(result.status, QueryStatus::Error);
        assert!(!result.response.contains("try again"));
    }

    #[test]
    fn test_missing_location_asks_for_one() {
        let result = ResponseComposer::compose(parsed(Intent::Weather, None), None, None);

        assert_eq!(result.status, QueryStatus::NeedsLocation);
        assert!(result.requires_location);
        assert!(result.weather_data.is_none());
        assert!(!result.suggested_actions.is_empty());
        assert!(result.invariants_hold());
    }

    #[test]
    fn test_unresolved_place_named_in_response() {
        let resolved = ResolvedLocation::unresolved("Xyzzyplatz");
        let result = ResponseComposer::compose(
            parsed(Intent::Weather, Some("Xyzzyplatz")),
            Some(&resolved),
            None,
        );

        assert_eq!(result.status, QueryStatus::NeedsLocation);
        assert!(result.response.contains("Xyzzyplatz"));
        assert!(!result.suggested_actions.is_empty());
    }

    #[test]
    fn test_category_specific_suggestions() {
        let query = parsed(Intent::ActivityRecommendation, None)
            .with_category(ActivityCategory::Beach);
        let result = ResponseComposer::needs_location(query, None);
        assert!(result.suggested_actions.iter().any(|s| s.contains("beach")));
    }

    #[test]
    fn test_recommendation_summary_lists_places() {
        let query = parsed(Intent::ActivityRecommendation, Some("Spain"))
            .with_category(ActivityCategory::Beach);
        let results = vec![
            WeatherOutcome::success(
                "Sardinia",
                Some("24.0°C".to_string()),
                Some("Clear sky".to_string()),
                "open-meteo",
            ),
            WeatherOutcome::success(
                "Costa Brava",
                Some("22.5°C".to_string()),
                Some("Partly cloudy".to_string()),
                "open-meteo",
            ),
        ];
        let result = ResponseComposer::recommendation_summary(query, "Spain", results);

        assert_eq!(result.status, QueryStatus::Ok);
        assert!(result.response.starts_with("Best beaches in Spain today:"));
        assert!(result.response.contains("Sardinia"));
        assert!(result.response.contains("Costa Brava"));
        assert!(result.invariants_hold());
    }

    #[test]
    fn test_recommendation_summary_with_no_data_is_error() {
        let query = parsed(Intent::ActivityRecommendation, Some("Spain"))
            .with_category(ActivityCategory::City);
        let result = ResponseComposer::recommendation_summary(query, "Spain", vec![]);
        assert_eq!(result.status, QueryStatus::Error);
    }
}
