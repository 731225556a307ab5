//! `askweather` - Natural-language weather and travel query resolution
//!
//! This library answers free-text questions like "Weather in Paris" or
//! "Best beach today" by combining a fast rule-based parser, a generative
//! model fallback for low-confidence parses, geocoding, and live weather
//! retrieval into a single structured response.

pub mod api;
pub mod composer;
pub mod config;
pub mod error;
pub mod intent_parser;
pub mod location_resolver;
pub mod models;
pub mod ollama;
pub mod orchestrator;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use composer::ResponseComposer;
pub use config::AskWeatherConfig;
pub use error::AskWeatherError;
pub use intent_parser::{QueryParser, RuleBasedParser};
pub use location_resolver::{GeocodingBackend, LocationResolver, OpenMeteoGeocoder};
pub use models::{
    ActivityCategory, HealthReport, Intent, ParsedQuery, ProcessingMethod, QueryRequest,
    QueryResult, QueryStatus, ResolvedLocation, WeatherOutcome,
};
pub use ollama::{OllamaClient, RecommendationSource};
pub use orchestrator::{OrchestratorSettings, QueryOrchestrator};
pub use weather::{OpenMeteoWeatherClient, WeatherBackend};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AskWeatherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
