//! Query orchestration
//!
//! Top-level controller for a single request:
//! `PARSING -> (ESCALATING) -> RESOLVING_LOCATION -> RETRIEVING -> COMPOSING`,
//! with a direct shortcut to composing when a location is required but
//! missing. The orchestrator owns every escalation, timeout and
//! partial-failure decision and always terminates with a `QueryResult`;
//! downstream faults never propagate to the caller.
//!
//! No cross-request state is held: everything here is an immutable, shared
//! client, so concurrent requests need no coordination.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::composer::ResponseComposer;
use crate::config::AskWeatherConfig;
use crate::intent_parser::{QueryParser, RuleBasedParser};
use crate::location_resolver::{LocationResolver, OpenMeteoGeocoder};
use crate::models::{
    ActivityCategory, HealthReport, Intent, ParsedQuery, ProcessingMethod, QueryRequest,
    QueryResult, ResolvedLocation, WeatherOutcome,
};
use crate::ollama::{OllamaClient, RecommendationSource};
use crate::weather::{OpenMeteoWeatherClient, WeatherBackend};

/// Known mountain destinations used when the model backend has no answer
const MOUNTAIN_FALLBACK: &[(&str, &[&str])] = &[
    ("switzerland", &["Matterhorn", "Jungfrau", "Eiger", "Pilatus", "Rigi"]),
    ("france", &["Mont Blanc", "Mont Ventoux", "Pic du Midi", "Chamonix", "Annecy"]),
    ("italy", &["Matterhorn", "Monte Bianco", "Dolomites", "Gran Paradiso", "Monte Rosa"]),
    ("spain", &["Teide", "Mulhacén", "Aneto", "Picos de Europa", "Nevado"]),
    ("austria", &["Grossglockner", "Zugspitze", "Kitzbühel", "Innsbruck", "Salzburg"]),
    ("nepal", &["Mount Everest", "Makalu", "Cho Oyu", "Lhotse", "Annapurna"]),
];

/// Tuning values for the orchestration policy
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Rule-based parses below this confidence escalate to the model
    pub escalation_threshold: f32,
    /// Deadline for one fallback interpretation or recommendation call
    pub fallback_timeout: Duration,
    /// Deadline for one weather retrieval attempt
    pub retrieval_timeout: Duration,
    /// How many recommended places to fetch weather for
    pub recommendation_limit: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            escalation_threshold: 0.6,
            fallback_timeout: Duration::from_secs(30),
            retrieval_timeout: Duration::from_secs(15),
            recommendation_limit: 3,
        }
    }
}

impl OrchestratorSettings {
    #[must_use]
    pub fn from_config(config: &AskWeatherConfig) -> Self {
        Self {
            escalation_threshold: config.orchestrator.escalation_threshold,
            fallback_timeout: config.model.timeout(),
            retrieval_timeout: config.retrieval.timeout(),
            recommendation_limit: config.orchestrator.recommendation_limit,
        }
    }
}

/// The top-level query resolution controller
pub struct QueryOrchestrator {
    rule_parser: Arc<dyn QueryParser>,
    fallback: Arc<dyn QueryParser>,
    recommender: Arc<dyn RecommendationSource>,
    resolver: LocationResolver,
    weather: Arc<dyn WeatherBackend>,
    settings: OrchestratorSettings,
}

impl QueryOrchestrator {
    pub fn new(
        rule_parser: Arc<dyn QueryParser>,
        fallback: Arc<dyn QueryParser>,
        recommender: Arc<dyn RecommendationSource>,
        resolver: LocationResolver,
        weather: Arc<dyn WeatherBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            rule_parser,
            fallback,
            recommender,
            resolver,
            weather,
            settings,
        }
    }

    /// Wire up the production backends from configuration
    #[must_use]
    pub fn from_config(config: &AskWeatherConfig) -> Self {
        let ollama = Arc::new(OllamaClient::new(&config.model));
        Self::new(
            Arc::new(RuleBasedParser),
            ollama.clone(),
            ollama,
            LocationResolver::new(Arc::new(OpenMeteoGeocoder::new(&config.geocoding))),
            Arc::new(OpenMeteoWeatherClient::new(&config.retrieval)),
            OrchestratorSettings::from_config(config),
        )
    }

    /// Resolve one query end to end
    ///
    /// Always returns a result; internal failures become `error` or
    /// `needs_location` statuses with human-readable text.
    #[instrument(skip(self, request), fields(query = %request.query))]
    pub async fn handle(&self, request: QueryRequest) -> QueryResult {
        // PARSING: the rule-based stage never fails, but guard anyway so a
        // parser bug cannot take the request down with it.
        let rule_parse = match self.rule_parser.parse(&request.query).await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "rule-based parser failed");
                ParsedQuery::new(
                    &request.query,
                    Intent::Unknown,
                    None,
                    0.0,
                    ProcessingMethod::RuleBased,
                )
            }
        };

        // ESCALATING: confidence-gated, never unconditional
        let parsed = if rule_parse.confidence < self.settings.escalation_threshold {
            self.escalate(rule_parse).await
        } else {
            rule_parse
        };

        match parsed.intent {
            Intent::ActivityRecommendation => self.handle_recommendation(parsed, &request).await,
            Intent::Weather | Intent::Unknown => self.handle_weather(parsed, &request).await,
        }
    }

    /// Reachability of the downstream services
    pub async fn health(&self) -> HealthReport {
        let (model_backend, geocoding_backend, retrieval_backend) = futures::join!(
            self.recommender.health_check(),
            self.resolver.backend_health(),
            self.weather.health_check(),
        );
        HealthReport {
            model_backend,
            geocoding_backend,
            retrieval_backend,
        }
    }

    /// Run the model fallback with a hard deadline
    ///
    /// Timeouts and schema-invalid output both degrade to the rule-based
    /// parse; an escalation can only replace the working parse, never lose
    /// it.
    async fn escalate(&self, rule_parse: ParsedQuery) -> ParsedQuery {
        debug!(
            confidence = rule_parse.confidence,
            threshold = self.settings.escalation_threshold,
            "below threshold, escalating to {}",
            self.fallback.name()
        );

        let attempt = timeout(
            self.settings.fallback_timeout,
            self.fallback.parse(&rule_parse.original_query),
        )
        .await;

        match attempt {
            Ok(Ok(parsed)) => parsed,
            Ok(Err(e)) => {
                warn!(error = %e, "fallback interpretation failed, keeping rule-based parse");
                rule_parse
            }
            Err(_) => {
                warn!("fallback interpretation timed out, keeping rule-based parse");
                rule_parse
            }
        }
    }

    /// RESOLVING_LOCATION -> RETRIEVING -> COMPOSING for the weather path
    async fn handle_weather(&self, parsed: ParsedQuery, request: &QueryRequest) -> QueryResult {
        let place = parsed
            .location
            .clone()
            .or_else(|| request.user_location.clone());

        // Shortcut: location required but missing, skip retrieval entirely
        let Some(place) = place else {
            return ResponseComposer::compose(parsed, None, None);
        };

        let resolved = self.resolver.resolve(&place).await;
        if !resolved.resolved {
            return ResponseComposer::compose(parsed, Some(&resolved), None);
        }

        let outcome = self.fetch_once(&resolved).await;
        ResponseComposer::compose(parsed, Some(&resolved), Some(outcome))
    }

    /// Recommendation path: ask the model for concrete places, then fetch
    /// weather for the best few
    async fn handle_recommendation(
        &self,
        mut parsed: ParsedQuery,
        request: &QueryRequest,
    ) -> QueryResult {
        let Some(place) = parsed.location.clone() else {
            // A caller-supplied location turns "where should I go" into
            // weather at the user's location
            if request.user_location.is_some() {
                parsed.intent = Intent::Weather;
                return self.handle_weather(parsed, request).await;
            }
            return ResponseComposer::needs_location(parsed, None);
        };

        let candidates = self.recommend_places(&parsed, &place).await;
        if candidates.is_empty() {
            return ResponseComposer::recommendation_summary(parsed, &place, vec![]);
        }

        let mut results = Vec::new();
        for candidate in candidates.iter().take(self.settings.recommendation_limit) {
            let resolved = self.resolver.resolve(candidate).await;
            if !resolved.resolved {
                debug!(candidate = %candidate, "skipping unresolvable recommendation");
                continue;
            }
            let outcome = self.fetch_once(&resolved).await;
            if outcome.success {
                results.push(outcome);
            }
        }

        ResponseComposer::recommendation_summary(parsed, &place, results)
    }

    /// Candidate places for a recommendation query, model-first with a
    /// static fallback for mountains
    async fn recommend_places(&self, parsed: &ParsedQuery, place: &str) -> Vec<String> {
        let prompt = match parsed.category {
            Some(ActivityCategory::Mountain) => format!("Famous mountains in {place}"),
            Some(ActivityCategory::Beach) => format!("Best beaches in {place}"),
            Some(ActivityCategory::City) => format!("Best cities in {place}"),
            Some(ActivityCategory::General) | None => format!("Best places in {place}"),
        };

        let attempt = timeout(
            self.settings.fallback_timeout,
            self.recommender.recommend(&prompt),
        )
        .await;

        match attempt {
            Ok(Ok(candidates)) if !candidates.is_empty() => candidates,
            Ok(Ok(_)) => {
                debug!("model returned no recommendations");
                static_fallback(parsed.category, place)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "recommendation call failed");
                static_fallback(parsed.category, place)
            }
            Err(_) => {
                warn!("recommendation call timed out");
                static_fallback(parsed.category, place)
            }
        }
    }

    /// Exactly one retrieval attempt with a hard deadline; a failure is
    /// surfaced, never masked by a retry
    async fn fetch_once(&self, resolved: &ResolvedLocation) -> WeatherOutcome {
        match timeout(self.settings.retrieval_timeout, self.weather.fetch(resolved)).await {
            Ok(outcome) => outcome,
            Err(_) => WeatherOutcome::failure(
                resolved.display_name(),
                self.weather.source(),
                "request timed out",
            ),
        }
    }
}

fn static_fallback(category: Option<ActivityCategory>, place: &str) -> Vec<String> {
    if category != Some(ActivityCategory::Mountain) {
        return vec![];
    }
    MOUNTAIN_FALLBACK
        .iter()
        .find(|(country, _)| *country == place.to_lowercase())
        .map(|(_, mountains)| mountains.iter().map(|m| (*m).to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_documented_values() {
        let settings = OrchestratorSettings::default();
        assert_eq!(settings.escalation_threshold, 0.6);
        assert_eq!(settings.recommendation_limit, 3);
    }

    #[test]
    fn test_settings_from_config() {
        let config = AskWeatherConfig::default();
        let settings = OrchestratorSettings::from_config(&config);
        assert_eq!(settings.escalation_threshold, 0.6);
        assert_eq!(settings.fallback_timeout, Duration::from_secs(30));
        assert_eq!(settings.retrieval_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_mountain_fallback_by_country() {
        let mountains = static_fallback(Some(ActivityCategory::Mountain), "Switzerland");
        assert!(mountains.contains(&"Matterhorn".to_string()));

        assert!(static_fallback(Some(ActivityCategory::Mountain), "Atlantis").is_empty());
        assert!(static_fallback(Some(ActivityCategory::Beach), "Spain").is_empty());
    }
}
