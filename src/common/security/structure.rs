/// Structural validation of raw provider payloads
/// Every typed field access goes through the decoded view returned here
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::threat_patterns::detect_in_str;

/// Declared source of a payload, which selects the minimal shape it must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// OpenWeather geocoding, list-style envelope
    #[serde(rename = "openweather")]
    ProviderA,
    /// OpenWeather single-station current conditions
    #[serde(rename = "openweather-current")]
    ProviderACurrent,
    /// WeatherAPI current conditions
    #[serde(rename = "weatherapi")]
    ProviderB,
    #[serde(rename = "mock")]
    Mock,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::ProviderA => "openweather",
            SourceId::ProviderACurrent => "openweather-current",
            SourceId::ProviderB => "weatherapi",
            SourceId::Mock => "mock",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required top-level shape is absent from a payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {source_id} response: {missing}")]
pub struct StructuralError {
    pub source_id: SourceId,
    pub missing: String,
}

impl StructuralError {
    pub fn new(source_id: SourceId, missing: impl Into<String>) -> Self {
        Self {
            source_id,
            missing: missing.into(),
        }
    }
}

/// Payload decoded against its source's minimal shape
#[derive(Debug, Clone, Copy)]
pub enum ValidatedPayload<'a> {
    /// Non-empty geocoding result list
    Locations(&'a [Value]),
    OpenWeatherCurrent {
        body: &'a Map<String, Value>,
        main: &'a Map<String, Value>,
        coord: &'a Map<String, Value>,
    },
    WeatherApiCurrent {
        location: &'a Map<String, Value>,
        current: &'a Map<String, Value>,
    },
    /// Unfiltered mock content: the `message` envelope when present, else the root
    Mock(&'a Value),
}

/// Validate that a payload has the minimal structure required for its source.
///
/// The mock source always passes so downstream defenses see its content
/// unfiltered. On success the whole payload is scanned once for threat
/// signatures, for diagnostics only.
pub fn validate_structure(payload: &Value, source: SourceId) -> Result<ValidatedPayload<'_>, StructuralError> {
    tracing::debug!(source = %source, "Validating provider response");

    let validated = match source {
        SourceId::Mock => {
            ValidatedPayload::Mock(payload.get("message").unwrap_or(payload))
        }
        SourceId::ProviderA => {
            let root = require_root_object(payload, source)?;
            let list = root
                .get("message")
                .and_then(Value::as_array)
                .ok_or_else(|| StructuralError::new(source, "missing 'message' list"))?;
            if list.is_empty() {
                return Err(StructuralError::new(source, "'message' list is empty"));
            }
            ValidatedPayload::Locations(list)
        }
        SourceId::ProviderACurrent => {
            let root = require_root_object(payload, source)?;
            let body = require_object(root, "message", source, "missing 'message' field")?;
            let main = require_object(body, "main", source, "missing weather measurements ('message.main')")?;
            let coord = require_object(body, "coord", source, "missing coordinates ('message.coord')")?;
            ValidatedPayload::OpenWeatherCurrent { body, main, coord }
        }
        SourceId::ProviderB => {
            let root = require_root_object(payload, source)?;
            let body = require_object(root, "message", source, "missing 'message' field")?;
            let location = require_object(body, "location", source, "missing 'message.location'")?;
            let current = require_object(body, "current", source, "missing 'message.current'")?;
            ValidatedPayload::WeatherApiCurrent { location, current }
        }
    };

    scan_payload(payload, source);
    tracing::debug!(source = %source, "Validation completed");

    Ok(validated)
}

fn require_root_object(payload: &Value, source: SourceId) -> Result<&Map<String, Value>, StructuralError> {
    payload
        .as_object()
        .ok_or_else(|| StructuralError::new(source, "response is not an object"))
}

fn require_object<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    source: SourceId,
    missing: &str,
) -> Result<&'a Map<String, Value>, StructuralError> {
    parent
        .get(key)
        .and_then(Value::as_object)
        .ok_or_else(|| StructuralError::new(source, missing))
}

/// Whole-payload threat scan; logs findings, never gates
fn scan_payload(payload: &Value, source: SourceId) {
    let serialized = payload.to_string();
    let report = detect_in_str(&serialized);
    if report.has_threat {
        tracing::warn!(
            source = %source,
            threats = ?report.descriptions(),
            "Threats detected in provider response"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_a_list() {
        let payload = json!({"message": [{"name": "Madrid", "lat": 40.4, "lon": -3.7}]});
        match validate_structure(&payload, SourceId::ProviderA) {
            Ok(ValidatedPayload::Locations(list)) => assert_eq!(list.len(), 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_provider_a_rejects_missing_and_empty_list() {
        let err = validate_structure(&json!({"data": []}), SourceId::ProviderA).unwrap_err();
        assert_eq!(err.source_id, SourceId::ProviderA);
        assert!(err.missing.contains("message"));

        let err = validate_structure(&json!({"message": []}), SourceId::ProviderA).unwrap_err();
        assert!(err.missing.contains("empty"));

        let err = validate_structure(&json!({"message": {"name": "x"}}), SourceId::ProviderA).unwrap_err();
        assert!(err.missing.contains("list"));
    }

    #[test]
    fn test_provider_a_current_requires_main_and_coord() {
        let ok = json!({"message": {"main": {"temp": 20}, "coord": {"lat": 1, "lon": 2}}});
        assert!(matches!(
            validate_structure(&ok, SourceId::ProviderACurrent),
            Ok(ValidatedPayload::OpenWeatherCurrent { .. })
        ));

        let no_coord = json!({"message": {"main": {"temp": 20}}});
        let err = validate_structure(&no_coord, SourceId::ProviderACurrent).unwrap_err();
        assert!(err.missing.contains("coord"));

        let no_main = json!({"message": {"coord": {}}});
        let err = validate_structure(&no_main, SourceId::ProviderACurrent).unwrap_err();
        assert!(err.missing.contains("main"));
    }

    #[test]
    fn test_provider_b_requires_location_and_current() {
        let ok = json!({"message": {"location": {"name": "Madrid"}, "current": {"temp_c": 20}}});
        assert!(matches!(
            validate_structure(&ok, SourceId::ProviderB),
            Ok(ValidatedPayload::WeatherApiCurrent { .. })
        ));

        let err = validate_structure(&json!({"message": {"location": {}}}), SourceId::ProviderB).unwrap_err();
        assert!(err.missing.contains("current"));
    }

    #[test]
    fn test_non_object_rejected() {
        for source in [SourceId::ProviderA, SourceId::ProviderACurrent, SourceId::ProviderB] {
            let err = validate_structure(&json!("nope"), source).unwrap_err();
            assert!(err.missing.contains("not an object"));
        }
    }

    #[test]
    fn test_mock_always_passes() {
        for payload in [json!(null), json!("text"), json!({}), json!({"message": {"city": 1}})] {
            assert!(validate_structure(&payload, SourceId::Mock).is_ok());
        }
        let payload = json!({"message": {"city": "<script>x</script>"}});
        match validate_structure(&payload, SourceId::Mock) {
            Ok(ValidatedPayload::Mock(inner)) => assert_eq!(inner["city"], "<script>x</script>"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_error_message_names_source() {
        let err = validate_structure(&json!({}), SourceId::ProviderB).unwrap_err();
        assert_eq!(err.to_string(), "invalid weatherapi response: missing 'message' field");
    }
}
