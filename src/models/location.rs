//! Resolved location model

use serde::{Deserialize, Serialize};

/// Outcome of resolving a free-text place reference
///
/// `resolved = false` is a normal, expected outcome ("not found"), not an
/// error. Coordinates are carried along when the geocoder provides them so
/// the retrieval backend does not have to geocode a second time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// The place reference as extracted from the query or supplied by the caller
    pub raw_text: String,
    /// Canonical name from the geocoding backend, e.g. "Paris, France"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl ResolvedLocation {
    /// A successfully resolved location
    #[must_use]
    pub fn resolved(
        raw_text: impl Into<String>,
        canonical_name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            canonical_name: Some(canonical_name.into()),
            resolved: true,
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// A place reference the geocoder could not resolve
    #[must_use]
    pub fn unresolved(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            canonical_name: None,
            resolved: false,
            latitude: None,
            longitude: None,
        }
    }

    /// Best available display name for this location
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.canonical_name.as_deref().unwrap_or(&self.raw_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_carries_coordinates() {
        let location = ResolvedLocation::resolved("paris", "Paris, France", 48.8566, 2.3522);
        assert!(location.resolved);
        assert_eq!(location.display_name(), "Paris, France");
        assert_eq!(location.latitude, Some(48.8566));
    }

    #[test]
    fn test_unresolved_falls_back_to_raw_text() {
        let location = ResolvedLocation::unresolved("Xyzzyplatz");
        assert!(!location.resolved);
        assert!(location.canonical_name.is_none());
        assert_eq!(location.display_name(), "Xyzzyplatz");
    }
}
