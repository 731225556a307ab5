//! Location resolution
//!
//! Normalizes a free-text place reference (case, whitespace, common
//! abbreviations) and verifies it against the geocoding backend. "Not found"
//! is a normal outcome reported through `resolved = false`; the resolver
//! never errors for it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::models::ResolvedLocation;

/// Common abbreviations expanded before geocoding
const ALIASES: &[(&str, &str)] = &[
    ("nyc", "New York"),
    ("la", "Los Angeles"),
    ("sf", "San Francisco"),
    ("uk", "United Kingdom"),
    ("usa", "United States"),
    ("uae", "United Arab Emirates"),
];

/// Geocoding backend seam
#[async_trait]
pub trait GeocodingBackend: Send + Sync {
    /// Look up a place name; `Ok(None)` means the place is unknown
    async fn lookup(&self, name: &str) -> anyhow::Result<Option<GeocodedPlace>>;

    /// Whether the backend is currently reachable
    async fn health_check(&self) -> bool;
}

/// Best match returned by a geocoding backend
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeocodedPlace {
    /// Canonical display name, e.g. "Paris, France"
    #[must_use]
    pub fn canonical_name(&self) -> String {
        match &self.country {
            Some(country) => format!("{}, {}", self.name, country),
            None => self.name.clone(),
        }
    }
}

/// Service for resolving free-text place references
pub struct LocationResolver {
    backend: Arc<dyn GeocodingBackend>,
}

impl LocationResolver {
    pub fn new(backend: Arc<dyn GeocodingBackend>) -> Self {
        Self { backend }
    }

    /// Resolve a raw place reference into a canonical location
    ///
    /// Backend transport failures are logged and reported as unresolved; the
    /// orchestrator treats both identically.
    pub async fn resolve(&self, raw_text: &str) -> ResolvedLocation {
        let normalized = normalize(raw_text);
        if normalized.is_empty() {
            return ResolvedLocation::unresolved(raw_text);
        }

        debug!(raw = raw_text, normalized, "resolving location");

        match self.backend.lookup(&normalized).await {
            Ok(Some(place)) => ResolvedLocation::resolved(
                raw_text,
                place.canonical_name(),
                place.latitude,
                place.longitude,
            ),
            Ok(None) => {
                debug!(normalized, "no geocoding results");
                ResolvedLocation::unresolved(raw_text)
            }
            Err(e) => {
                warn!(normalized, error = %e, "geocoding backend failure");
                ResolvedLocation::unresolved(raw_text)
            }
        }
    }

    pub async fn backend_health(&self) -> bool {
        self.backend.health_check().await
    }
}

/// Collapse whitespace and expand known aliases
fn normalize(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = collapsed.to_lowercase();
    for (alias, expansion) in ALIASES {
        if lower == *alias {
            return (*expansion).to_string();
        }
    }
    collapsed
}

/// Open-Meteo geocoding API client (no API key required)
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

impl OpenMeteoGeocoder {
    /// Create a new client
    pub fn new(config: &GeocodingConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("askweather/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }
}

#[async_trait]
impl GeocodingBackend for OpenMeteoGeocoder {
    async fn lookup(&self, name: &str) -> anyhow::Result<Option<GeocodedPlace>> {
        let url = format!(
            "{}/search?name={}&count=1&language=en&format=json",
            self.base_url,
            urlencoding::encode(name)
        );

        let response = self.client.get(&url).send().await?;
        let geocoding: GeocodingResponse = response.json().await?;

        Ok(geocoding
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|result| GeocodedPlace {
                name: result.name,
                country: result.country,
                latitude: result.latitude,
                longitude: result.longitude,
            }))
    }

    async fn health_check(&self) -> bool {
        // A lookup for a known city doubles as the reachability probe; the
        // API has no dedicated health endpoint.
        matches!(self.lookup("Berlin").await, Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticBackend(Option<GeocodedPlace>);

    #[async_trait]
    impl GeocodingBackend for StaticBackend {
        async fn lookup(&self, _name: &str) -> anyhow::Result<Option<GeocodedPlace>> {
            Ok(self.0.clone())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl GeocodingBackend for FailingBackend {
        async fn lookup(&self, _name: &str) -> anyhow::Result<Option<GeocodedPlace>> {
            Err(anyhow::anyhow!("connection refused"))
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    fn paris() -> GeocodedPlace {
        GeocodedPlace {
            name: "Paris".to_string(),
            country: Some("France".to_string()),
            latitude: 48.8566,
            longitude: 2.3522,
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  New   York "), "New York");
    }

    #[test]
    fn test_normalize_expands_aliases() {
        assert_eq!(normalize("NYC"), "New York");
        assert_eq!(normalize("sf"), "San Francisco");
        // Aliases only replace the whole reference
        assert_eq!(normalize("La Paz"), "La Paz");
    }

    #[test]
    fn test_canonical_name_includes_country() {
        assert_eq!(paris().canonical_name(), "Paris, France");
        let no_country = GeocodedPlace {
            country: None,
            ..paris()
        };
        assert_eq!(no_country.canonical_name(), "Paris");
    }

    #[tokio::test]
    async fn test_resolve_known_place() {
        let resolver = LocationResolver::new(Arc::new(StaticBackend(Some(paris()))));
        let location = resolver.resolve("paris").await;
        assert!(location.resolved);
        assert_eq!(location.canonical_name.as_deref(), Some("Paris, France"));
        assert_eq!(location.raw_text, "paris");
    }

    #[tokio::test]
    async fn test_resolve_unknown_place_is_not_an_error() {
        let resolver = LocationResolver::new(Arc::new(StaticBackend(None)));
        let location = resolver.resolve("Xyzzyplatz").await;
        assert!(!location.resolved);
        assert!(location.canonical_name.is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_reported_as_unresolved() {
        let resolver = LocationResolver::new(Arc::new(FailingBackend));
        let location = resolver.resolve("Paris").await;
        assert!(!location.resolved);
    }

    #[tokio::test]
    async fn test_blank_input_is_unresolved() {
        let resolver = LocationResolver::new(Arc::new(StaticBackend(Some(paris()))));
        let location = resolver.resolve("   ").await;
        assert!(!location.resolved);
    }
}
