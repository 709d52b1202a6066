//! Field-level view of a validated current-conditions payload.
//!
//! [`RawObservation`] maps each provider's layout onto the same set of
//! untyped fields. [`RawObservation::audit`] turns those fields into threat
//! strings and [`RawObservation::build_record`] turns them into a
//! well-typed [`WeatherRecord`].

use serde_json::{Map, Value};

use crate::common::security::{
    classify_number, detect_threats, sanitize_f64, sanitize_number, sanitize_str, sanitize_text,
    validate_range, validate_type, NumericCheck, SourceId, StructuralError, ValidatedPayload,
    ValueKind,
};
use crate::weather::types::WeatherRecord;

/// Condition text used when a provider supplies none
pub const UNKNOWN_CONDITION: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindUnit {
    KilometersPerHour,
    MetersPerSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisibilityUnit {
    Meters,
    Kilometers,
}

/// Untyped fields of one current-conditions payload
#[derive(Debug, Clone)]
pub struct RawObservation<'a> {
    pub city: Option<&'a Value>,
    pub country: Option<&'a Value>,
    pub condition: Option<&'a Value>,
    pub temp: Option<&'a Value>,
    pub feels_like: Option<&'a Value>,
    pub temp_min: Option<&'a Value>,
    pub temp_max: Option<&'a Value>,
    pub humidity: Option<&'a Value>,
    pub pressure: Option<&'a Value>,
    pub wind: Option<&'a Value>,
    pub visibility: Option<&'a Value>,
    pub lat: Option<&'a Value>,
    pub lon: Option<&'a Value>,
    pub wind_direction: Option<&'a Value>,
    pub cloudiness: Option<&'a Value>,
    pub uv: Option<&'a Value>,
    pub icon: Option<&'a Value>,
    wind_unit: WindUnit,
    visibility_unit: VisibilityUnit,
}

/// Domain bounds for an audited numeric field
struct NumericRule {
    field: &'static str,
    min: f64,
    max: f64,
}

const TEMP_RULE: NumericRule = NumericRule { field: "temp", min: -100.0, max: 100.0 };
const HUMIDITY_RULE: NumericRule = NumericRule { field: "humidity", min: 0.0, max: 100.0 };
const WIND_RULE: NumericRule = NumericRule { field: "wind", min: 0.0, max: f64::INFINITY };
const PRESSURE_RULE: NumericRule = NumericRule { field: "pressure", min: 0.0, max: f64::INFINITY };

impl NumericRule {
    fn violation(&self, value: f64) -> String {
        match self.field {
            "temp" => format!(
                "temp: temperature out of range: {} °C (expected {} to {})",
                value, self.min, self.max
            ),
            "humidity" => format!(
                "humidity: humidity out of range: {}% (expected {} to {})",
                value, self.min, self.max
            ),
            "wind" => format!("wind: negative wind speed: {}", value),
            "pressure" => format!("pressure: negative pressure: {}", value),
            other => format!("{}: value out of range: {}", other, value),
        }
    }
}

impl<'a> RawObservation<'a> {
    fn empty(wind_unit: WindUnit, visibility_unit: VisibilityUnit) -> Self {
        Self {
            city: None,
            country: None,
            condition: None,
            temp: None,
            feels_like: None,
            temp_min: None,
            temp_max: None,
            humidity: None,
            pressure: None,
            wind: None,
            visibility: None,
            lat: None,
            lon: None,
            wind_direction: None,
            cloudiness: None,
            uv: None,
            icon: None,
            wind_unit,
            visibility_unit,
        }
    }

    /// Map a validated payload onto the common field set
    pub fn from_validated(payload: ValidatedPayload<'a>) -> Result<Self, StructuralError> {
        match payload {
            ValidatedPayload::Locations(_) => Err(StructuralError::new(
                SourceId::ProviderA,
                "expected current conditions, got a location list",
            )),
            ValidatedPayload::OpenWeatherCurrent { body, main, coord } => {
                let mut obs = Self::empty(WindUnit::MetersPerSecond, VisibilityUnit::Meters);
                obs.city = body.get("name");
                obs.country = lookup(body, &["sys", "country"]);
                obs.condition = lookup(body, &["weather", "0", "description"]);
                obs.icon = lookup(body, &["weather", "0", "icon"]);
                obs.temp = main.get("temp");
                obs.feels_like = main.get("feels_like");
                obs.temp_min = main.get("temp_min");
                obs.temp_max = main.get("temp_max");
                obs.humidity = main.get("humidity");
                obs.pressure = main.get("pressure");
                obs.wind = lookup(body, &["wind", "speed"]);
                obs.wind_direction = lookup(body, &["wind", "deg"]);
                obs.visibility = body.get("visibility");
                obs.cloudiness = lookup(body, &["clouds", "all"]);
                obs.lat = coord.get("lat");
                obs.lon = coord.get("lon");
                Ok(obs)
            }
            ValidatedPayload::WeatherApiCurrent { location, current } => {
                let mut obs = Self::empty(WindUnit::KilometersPerHour, VisibilityUnit::Kilometers);
                obs.city = location.get("name");
                obs.country = location.get("country");
                obs.lat = location.get("lat");
                obs.lon = location.get("lon");
                obs.condition = lookup(current, &["condition", "text"]);
                obs.icon = lookup(current, &["condition", "icon"]);
                obs.temp = current.get("temp_c");
                obs.feels_like = current.get("feelslike_c");
                // Current-only endpoint: the day's range collapses to the reading
                obs.temp_min = current.get("temp_c");
                obs.temp_max = current.get("temp_c");
                obs.humidity = current.get("humidity");
                obs.pressure = current.get("pressure_mb");
                obs.wind = current.get("wind_kph");
                obs.wind_direction = current.get("wind_dir");
                obs.visibility = current.get("vis_km");
                obs.cloudiness = current.get("cloud");
                obs.uv = current.get("uv");
                Ok(obs)
            }
            ValidatedPayload::Mock(content) => {
                let mut obs = Self::empty(WindUnit::KilometersPerHour, VisibilityUnit::Meters);
                if let Some(fields) = content.as_object() {
                    obs.city = fields.get("city");
                    obs.country = fields.get("country");
                    obs.condition = fields.get("condition");
                    obs.icon = fields.get("icon");
                    obs.temp = fields.get("temp");
                    obs.feels_like = fields.get("feelsLike");
                    obs.temp_min = fields.get("tempMin");
                    obs.temp_max = fields.get("tempMax");
                    obs.humidity = fields.get("humidity");
                    obs.pressure = fields.get("pressure");
                    obs.wind = fields.get("wind");
                    obs.wind_direction = fields.get("windDirection");
                    obs.visibility = fields.get("visibility");
                    obs.cloudiness = fields.get("cloudiness");
                    obs.uv = fields.get("uv");
                    obs.lat = fields.get("lat");
                    obs.lon = fields.get("lon");
                }
                Ok(obs)
            }
        }
    }

    /// Audit the semantically meaningful fields and collect threat descriptions.
    ///
    /// String fields get a type check plus the full signature scan. Numeric
    /// fields report at most one problem each: type confusion, else overflow,
    /// else a range violation.
    pub fn audit(&self) -> Vec<String> {
        let mut threats = Vec::new();

        audit_string_field("city", self.city, true, &mut threats);
        audit_string_field("condition", self.condition, true, &mut threats);
        audit_string_field("country", self.country, false, &mut threats);

        audit_numeric_field(&TEMP_RULE, self.temp, &mut threats);
        audit_numeric_field(&HUMIDITY_RULE, self.humidity, &mut threats);
        audit_numeric_field(&WIND_RULE, self.wind, &mut threats);
        audit_numeric_field(&PRESSURE_RULE, self.pressure, &mut threats);

        threats
    }

    /// Build the sanitized record delivered to the display layer
    pub fn build_record(&self, requested_city: &str) -> WeatherRecord {
        let wind = number_or_fallback(self.wind);
        let wind = match self.wind_unit {
            WindUnit::KilometersPerHour => wind,
            WindUnit::MetersPerSecond => sanitize_f64((wind * 3.6).round(), 0.0),
        };

        let visibility = number_or_fallback(self.visibility);
        let visibility = match self.visibility_unit {
            VisibilityUnit::Meters => visibility,
            VisibilityUnit::Kilometers => sanitize_f64(visibility * 1000.0, 0.0),
        };

        WeatherRecord {
            city: clean_string(self.city).unwrap_or_else(|| sanitize_str(requested_city)),
            country: clean_string(self.country),
            temp: number_or_fallback(self.temp),
            feels_like: number_or_fallback(self.feels_like),
            temp_min: number_or_fallback(self.temp_min),
            temp_max: number_or_fallback(self.temp_max),
            condition: clean_string(self.condition).unwrap_or_else(|| UNKNOWN_CONDITION.to_string()),
            humidity: number_or_fallback(self.humidity),
            pressure: number_or_fallback(self.pressure),
            wind,
            visibility,
            lat: optional_number(self.lat),
            lon: optional_number(self.lon),
            wind_direction: wind_direction(self.wind_direction),
            cloudiness: optional_number(self.cloudiness),
            uv: optional_number(self.uv),
            icon: clean_string(self.icon),
        }
    }
}

fn audit_string_field(field: &str, value: Option<&Value>, required: bool, threats: &mut Vec<String>) {
    if !required && matches!(value, None | Some(Value::Null)) {
        return;
    }

    if !validate_type(value, ValueKind::String, field) {
        threats.push(format!(
            "{}: type confusion: expected string, received {}",
            field,
            ValueKind::of(value)
        ));
    }

    let report = detect_threats(value);
    threats.extend(
        report
            .threat_kinds
            .iter()
            .map(|kind| format!("{}: {}", field, kind.description())),
    );
}

fn audit_numeric_field(rule: &NumericRule, value: Option<&Value>, threats: &mut Vec<String>) {
    if !validate_type(value, ValueKind::Number, rule.field) {
        threats.push(format!(
            "{}: type confusion: expected number, received {}",
            rule.field,
            ValueKind::of(value)
        ));
        return;
    }

    match classify_number(value) {
        NumericCheck::Valid(n) => {
            if !validate_range(n, rule.min, rule.max, rule.field) {
                threats.push(rule.violation(n));
            }
        }
        NumericCheck::Overflow(n) => {
            threats.push(format!("{}: numeric overflow: {}", rule.field, n));
        }
        NumericCheck::NotANumber => {
            threats.push(format!("{}: not a number", rule.field));
        }
    }
}

/// Walk object keys and array indices below `root`
fn lookup<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(root.get(*first)?, |value, segment| match value {
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        Value::Object(map) => map.get(*segment),
        _ => None,
    })
}

/// Numbers only; any other runtime kind becomes the fallback
fn number_or_fallback(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(_)) => sanitize_number(value, 0.0),
        _ => 0.0,
    }
}

fn optional_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(_)) => match classify_number(value) {
            NumericCheck::Valid(n) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

fn clean_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(_)) => Some(sanitize_text(value)).filter(|s| !s.is_empty()),
        _ => None,
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

fn wind_direction(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::Number(_)) => optional_number(value).map(|degrees| {
            let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % COMPASS_POINTS.len();
            COMPASS_POINTS[index].to_string()
        }),
        _ => clean_string(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::security::validate_structure;
    use serde_json::json;

    fn openweather_payload() -> Value {
        json!({
            "message": {
                "coord": {"lon": -3.7, "lat": 40.42},
                "weather": [{"id": 800, "main": "Clear", "description": "cielo claro", "icon": "01d"}],
                "main": {"temp": 24.3, "feels_like": 23.9, "temp_min": 22.1, "temp_max": 26.0, "pressure": 1016, "humidity": 35},
                "visibility": 10000,
                "wind": {"speed": 4.1, "deg": 250},
                "clouds": {"all": 0},
                "sys": {"country": "ES"},
                "name": "Madrid"
            }
        })
    }

    #[test]
    fn test_openweather_record() {
        let payload = openweather_payload();
        let validated = validate_structure(&payload, SourceId::ProviderACurrent).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        assert!(obs.audit().is_empty());

        let record = obs.build_record("madrid");
        assert_eq!(record.city, "Madrid");
        assert_eq!(record.country.as_deref(), Some("ES"));
        assert_eq!(record.condition, "cielo claro");
        assert_eq!(record.temp, 24.3);
        assert_eq!(record.wind, 15.0, "4.1 m/s is 14.76 km/h, rounded");
        assert_eq!(record.wind_direction.as_deref(), Some("WSW"));
        assert_eq!(record.visibility, 10000.0);
        assert_eq!(record.lat, Some(40.42));
        assert_eq!(record.icon.as_deref(), Some("01d"));
    }

    #[test]
    fn test_weatherapi_record() {
        let payload = json!({
            "message": {
                "location": {"name": "Madrid", "country": "Spain", "lat": 40.4, "lon": -3.68},
                "current": {
                    "temp_c": 21.0, "feelslike_c": 20.5,
                    "condition": {"text": "Sunny", "icon": "//cdn/sunny.png", "code": 1000},
                    "wind_kph": 11.2, "wind_dir": "NE", "humidity": 40, "cloud": 0,
                    "pressure_mb": 1018.0, "vis_km": 10.0, "uv": 5.0
                }
            }
        });
        let validated = validate_structure(&payload, SourceId::ProviderB).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        assert!(obs.audit().is_empty());

        let record = obs.build_record("Madrid");
        assert_eq!(record.temp_min, 21.0);
        assert_eq!(record.temp_max, 21.0);
        assert_eq!(record.wind, 11.2);
        assert_eq!(record.visibility, 10000.0);
        assert_eq!(record.wind_direction.as_deref(), Some("NE"));
        assert_eq!(record.uv, Some(5.0));
    }

    #[test]
    fn test_type_confusion_reports_one_threat_per_numeric_field() {
        let payload = json!({"message": {
            "city": ["Madrid", "Barcelona"],
            "temp": "veinte grados",
            "condition": 404,
            "humidity": "alta",
            "pressure": true,
            "wind": [10, 15, 20],
            "country": 123
        }});
        let validated = validate_structure(&payload, SourceId::Mock).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        let threats = obs.audit();

        assert_eq!(threats.iter().filter(|t| t.starts_with("humidity:")).count(), 1);
        assert!(threats.contains(&"temp: type confusion: expected number, received string".to_string()));
        assert!(threats.contains(&"pressure: type confusion: expected number, received boolean".to_string()));
        assert!(threats.contains(&"city: type confusion: expected string, received array".to_string()));

        let record = obs.build_record("Madrid");
        assert_eq!(record.city, "Madrid");
        assert_eq!(record.condition, UNKNOWN_CONDITION);
        assert_eq!(record.temp, 0.0);
        assert_eq!(record.pressure, 0.0);
        assert!(record.country.is_none());
    }

    #[test]
    fn test_overflow_and_range_threats() {
        let payload = json!({"message": {
            "city": "Madrid",
            "temp": 9999999999999999999_u64,
            "feelsLike": 9007199254740991_u64,
            "tempMin": null,
            "condition": "Soleado",
            "humidity": 9999999,
            "pressure": -5000,
            "wind": -3,
            "country": "ES"
        }});
        let validated = validate_structure(&payload, SourceId::Mock).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        let threats = obs.audit();

        assert_eq!(threats.len(), 4, "threats: {:?}", threats);
        assert!(threats[0].starts_with("temp: numeric overflow"));
        assert!(threats[1].starts_with("humidity: humidity out of range"));
        assert!(threats[2].starts_with("wind: negative wind speed"));
        assert!(threats[3].starts_with("pressure: negative pressure"));

        let record = obs.build_record("Madrid");
        assert_eq!(record.temp, 0.0);
        assert_eq!(record.feels_like, 9007199254740991.0);
        assert_eq!(record.humidity, 9999999.0, "range checks never alter values");
        assert_eq!(record.pressure, -5000.0);
    }

    #[test]
    fn test_string_threats_are_prefixed_and_sanitized() {
        let payload = json!({"message": {
            "city": "<script>alert(\"XSS Attack\")</script>Madrid",
            "condition": "<svg/onload=alert(\"XSS\")>Soleado",
            "country": {"$ne": null},
            "temp": 20, "humidity": 50, "pressure": 1000, "wind": 5
        }});
        let validated = validate_structure(&payload, SourceId::Mock).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        let threats = obs.audit();

        assert!(threats.contains(&"city: XSS: <script> tag detected".to_string()));
        assert!(threats.contains(&"condition: XSS: SVG with onload".to_string()));
        assert!(threats.contains(&"country: type confusion: expected string, received object".to_string()));
        assert!(threats.contains(&"country: NoSQL Injection operator detected".to_string()));

        let record = obs.build_record("Madrid");
        assert_eq!(record.city, "Madrid");
        assert_eq!(record.condition, "Soleado");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let payload = json!({"message": {"city": "Madrid", "feelsLike": 20, "humidity": 65, "wind": 15}});
        let validated = validate_structure(&payload, SourceId::Mock).unwrap();
        let obs = RawObservation::from_validated(validated).unwrap();
        let threats = obs.audit();

        assert!(threats.contains(&"condition: type confusion: expected string, received undefined".to_string()));
        assert!(threats.contains(&"temp: type confusion: expected number, received undefined".to_string()));
        assert!(threats.contains(&"pressure: type confusion: expected number, received undefined".to_string()));
        assert!(!threats.iter().any(|t| t.starts_with("country:")));
    }

    #[test]
    fn test_location_list_is_not_an_observation() {
        let payload = json!({"message": [{"name": "Madrid"}]});
        let validated = validate_structure(&payload, SourceId::ProviderA).unwrap();
        assert!(RawObservation::from_validated(validated).is_err());
    }

    #[test]
    fn test_lookup_paths() {
        let map = json!({"weather": [{"icon": "01d"}], "sys": {"country": "ES"}});
        let map = map.as_object().unwrap();
        assert_eq!(lookup(map, &["weather", "0", "icon"]), Some(&json!("01d")));
        assert_eq!(lookup(map, &["sys", "country"]), Some(&json!("ES")));
        assert_eq!(lookup(map, &["weather", "1", "icon"]), None);
        assert_eq!(lookup(map, &["sys", "country", "code"]), None);
    }
}
