//! Configuration management for the `AskWeather` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use crate::AskWeatherError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `AskWeather` service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskWeatherConfig {
    /// Generative model backend (fallback interpreter + recommendations)
    pub model: ModelConfig,
    /// Geocoding backend
    pub geocoding: GeocodingConfig,
    /// Weather retrieval backend
    pub retrieval: RetrievalConfig,
    /// Orchestrator tuning
    pub orchestrator: OrchestratorConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Generative model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the Ollama-compatible API
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    /// Model name passed to the generate endpoint
    #[serde(default = "default_model_name")]
    pub model: String,
    /// Hard deadline for a single fallback interpretation
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u32,
}

/// Geocoding backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
}

/// Weather retrieval backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_base_url")]
    pub base_url: String,
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_seconds: u32,
}

/// Orchestrator tuning values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Rule-based parses below this confidence escalate to the model fallback
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: f32,
    /// How many recommended places to fetch weather for
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_model_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model_name() -> String {
    "llama3.2:latest".to_string()
}

fn default_model_timeout() -> u32 {
    30
}

fn default_geocoding_base_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_retrieval_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_retrieval_timeout() -> u32 {
    15
}

fn default_escalation_threshold() -> f32 {
    0.6
}

fn default_recommendation_limit() -> usize {
    3
}

fn default_server_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AskWeatherConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                base_url: default_model_base_url(),
                model: default_model_name(),
                timeout_seconds: default_model_timeout(),
            },
            geocoding: GeocodingConfig {
                base_url: default_geocoding_base_url(),
                timeout_seconds: default_geocoding_timeout(),
            },
            retrieval: RetrievalConfig {
                base_url: default_retrieval_base_url(),
                timeout_seconds: default_retrieval_timeout(),
            },
            orchestrator: OrchestratorConfig {
                escalation_threshold: default_escalation_threshold(),
                recommendation_limit: default_recommendation_limit(),
            },
            server: ServerConfig {
                port: default_server_port(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
        }
    }
}

impl ModelConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl RetrievalConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl AskWeatherConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with ASKWEATHER_ prefix
        builder = builder.add_source(
            Environment::with_prefix("ASKWEATHER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: AskWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("askweather").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.orchestrator.escalation_threshold) {
            return Err(
                AskWeatherError::config("Escalation threshold must be within [0, 1]").into(),
            );
        }

        if self.orchestrator.recommendation_limit == 0 || self.orchestrator.recommendation_limit > 10
        {
            return Err(
                AskWeatherError::config("Recommendation limit must be between 1 and 10").into(),
            );
        }

        for (name, seconds) in [
            ("Model", self.model.timeout_seconds),
            ("Geocoding", self.geocoding.timeout_seconds),
            ("Retrieval", self.retrieval.timeout_seconds),
        ] {
            if seconds == 0 || seconds > 300 {
                return Err(AskWeatherError::config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AskWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Model", &self.model.base_url),
            ("Geocoding", &self.geocoding.base_url),
            ("Retrieval", &self.retrieval.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AskWeatherError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AskWeatherConfig::default();
        assert_eq!(config.model.base_url, "http://localhost:11434");
        assert_eq!(config.orchestrator.escalation_threshold, 0.6);
        assert_eq!(config.orchestrator.recommendation_limit, 3);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_threshold() {
        let mut config = AskWeatherConfig::default();
        config.orchestrator.escalation_threshold = 1.5;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("threshold"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = AskWeatherConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_timeout_range() {
        let mut config = AskWeatherConfig::default();
        config.retrieval.timeout_seconds = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_base_url_scheme() {
        let mut config = AskWeatherConfig::default();
        config.geocoding.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = AskWeatherConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("askweather"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
