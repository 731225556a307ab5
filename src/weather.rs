//! Weather retrieval backend
//!
//! Performs a single retrieval attempt per call. Retry and fallback policy
//! belongs to the orchestrator, never to this client. Failures are folded
//! into the `WeatherOutcome` with an error string whose wording separates
//! transient conditions (timed out, unreachable) from permanent ones.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::models::{ResolvedLocation, WeatherOutcome};

const SOURCE: &str = "open-meteo";

/// Retrieval backend seam
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    /// Fetch current conditions for a resolved location, exactly once
    async fn fetch(&self, location: &ResolvedLocation) -> WeatherOutcome;

    /// Whether the backend is currently reachable
    async fn health_check(&self) -> bool;

    /// Source label stamped on outcomes from this backend
    fn source(&self) -> &'static str;
}

/// Open-Meteo current-conditions client
pub struct OpenMeteoWeatherClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentData>,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    #[serde(rename = "temperature_2m")]
    temperature: f32,
    #[serde(rename = "weather_code")]
    weather_code: u8,
}

impl OpenMeteoWeatherClient {
    /// Create a new client
    pub fn new(config: &RetrievalConfig) -> Self {
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
impl WeatherBackend for OpenMeteoWeatherClient {
    async fn fetch(&self, location: &ResolvedLocation) -> WeatherOutcome {
        let name = location.display_name().to_string();

        let (Some(latitude), Some(longitude)) = (location.latitude, location.longitude) else {
            return WeatherOutcome::failure(
                name,
                SOURCE,
                "no coordinates available for location",
            );
        };

        let url = format!(
            "{}/forecast?latitude={latitude}&longitude={longitude}&current=temperature_2m,weather_code",
            self.base_url
        );
        debug!(location = %name, "fetching current conditions");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return WeatherOutcome::failure(name, SOURCE, "request timed out");
            }
            Err(e) => {
                return WeatherOutcome::failure(
                    name,
                    SOURCE,
                    format!("weather backend unreachable: {e}"),
                );
            }
        };

        if !response.status().is_success() {
            return WeatherOutcome::failure(
                name,
                SOURCE,
                format!("weather backend returned {}", response.status()),
            );
        }

        let parsed: CurrentResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return WeatherOutcome::failure(
                    name,
                    SOURCE,
                    format!("invalid weather response: {e}"),
                );
            }
        };

        match parsed.current {
            Some(current) => WeatherOutcome::success(
                name,
                Some(format!("{:.1}°C", current.temperature)),
                Some(weather_code_to_description(current.weather_code).to_string()),
                SOURCE,
            ),
            // Valid location but nothing published for it
            None => WeatherOutcome::failure(name, SOURCE, "no data published for location"),
        }
    }

    async fn health_check(&self) -> bool {
        // The bare forecast endpoint answers 400 for missing parameters,
        // which still proves reachability.
        let url = format!("{}/forecast", self.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    fn source(&self) -> &'static str {
        SOURCE
    }
}

/// Convert an Open-Meteo weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}
