//! Weather retrieval outcome model

use serde::{Deserialize, Serialize};

/// Result of a single attempt against the retrieval backend
///
/// `success = false` always carries a non-empty `error`. The orchestrator
/// does not parse the error text; it only distinguishes transient from
/// permanent failures when shaping the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherOutcome {
    pub location: String,
    /// Formatted temperature, e.g. "18.4°C"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    /// Human-readable condition, e.g. "Partly cloudy"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Which backend produced this outcome
    pub source: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherOutcome {
    /// A successful retrieval
    #[must_use]
    pub fn success(
        location: impl Into<String>,
        temperature: Option<String>,
        condition: Option<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            temperature,
            condition,
            source: source.into(),
            success: true,
            error: None,
        }
    }

    /// A failed retrieval; the error string must describe what went wrong
    #[must_use]
    pub fn failure(
        location: impl Into<String>,
        source: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        debug_assert!(!error.is_empty());
        Self {
            location: location.into(),
            temperature: None,
            condition: None,
            source: source.into(),
            success: false,
            error: Some(error),
        }
    }

    /// Whether the failure wording marks it as worth retrying
    ///
    /// Transient failures (timeouts, unreachable backend) suggest a retry to
    /// the user; permanent ones (no data published) do not.
    #[must_use]
    pub fn is_transient_failure(&self) -> bool {
        if self.success {
            return false;
        }
        self.error
            .as_deref()
            .is_some_and(|e| e.contains("timed out") || e.contains("unreachable"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_error() {
        let outcome = WeatherOutcome::failure("Paris", "open-meteo", "request timed out");
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("request timed out"));
        assert!(outcome.is_transient_failure());
    }

    #[test]
    fn test_permanent_failure_not_retried() {
        let outcome = WeatherOutcome::failure("Paris", "open-meteo", "no data published");
        assert!(!outcome.is_transient_failure());
    }

    #[test]
    fn test_success_omits_error_field() {
        let outcome = WeatherOutcome::success(
            "Paris, France",
            Some("18.4°C".to_string()),
            Some("Clear sky".to_string()),
            "open-meteo",
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["success"], true);
    }
}
