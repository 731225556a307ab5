//! Error types and handling for the `AskWeather` service

use thiserror::Error;

/// Main error type for the `AskWeather` service
///
/// Downstream failures are caught at their call site and converted into one
/// of these variants before they cross back into the orchestrator. The
/// orchestrator itself never surfaces an error to the caller; every variant
/// is ultimately translated into an `error` or `needs_location` result.
#[derive(Error, Debug)]
pub enum AskWeatherError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Query text could not be parsed with useful confidence
    #[error("Ambiguous query: {message}")]
    ParseAmbiguous { message: String },

    /// A place reference could not be resolved to a known location
    #[error("Unresolved location: {place}")]
    LocationUnresolved { place: String },

    /// Retrieval failed for reasons that may clear up on retry
    #[error("Transient retrieval failure: {message}")]
    RetrievalTransient { message: String },

    /// Retrieval failed and a retry would not help
    #[error("Permanent retrieval failure: {message}")]
    RetrievalPermanent { message: String },

    /// A downstream call exceeded its deadline
    #[error("Timeout in {stage} stage")]
    DownstreamTimeout { stage: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AskWeatherError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new ambiguous-parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::ParseAmbiguous {
            message: message.into(),
        }
    }

    /// Create a new unresolved-location error
    pub fn unresolved<S: Into<String>>(place: S) -> Self {
        Self::LocationUnresolved {
            place: place.into(),
        }
    }

    /// Create a new transient retrieval error
    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::RetrievalTransient {
            message: message.into(),
        }
    }

    /// Create a new permanent retrieval error
    pub fn permanent<S: Into<String>>(message: S) -> Self {
        Self::RetrievalPermanent {
            message: message.into(),
        }
    }

    /// Create a new downstream timeout error
    pub fn timeout<S: Into<String>>(stage: S) -> Self {
        Self::DownstreamTimeout {
            stage: stage.into(),
        }
    }

    /// Whether retrying the same request could plausibly succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AskWeatherError::RetrievalTransient { .. } | AskWeatherError::DownstreamTimeout { .. }
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AskWeatherError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            AskWeatherError::ParseAmbiguous { .. } => {
                "I couldn't work out what you're asking. Try rephrasing your question.".to_string()
            }
            AskWeatherError::LocationUnresolved { place } => {
                format!("I couldn't find a place called '{place}'.")
            }
            AskWeatherError::RetrievalTransient { .. }
            | AskWeatherError::DownstreamTimeout { .. } => {
                "Weather service is temporarily unavailable. Please try again in a moment."
                    .to_string()
            }
            AskWeatherError::RetrievalPermanent { .. } => {
                "No weather data is available for that location.".to_string()
            }
            AskWeatherError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
