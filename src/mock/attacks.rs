//! Hostile payload catalogue served by the mock provider.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const XSS_SCRIPT: &str = "<script>alert(\"XSS Attack\")</script>";
pub const XSS_IMG: &str = "<img src=x onerror=alert(\"XSS\")>";
pub const XSS_SVG: &str = "<svg/onload=alert(\"XSS\")>";
pub const XSS_IFRAME: &str = "<iframe src=\"javascript:alert('XSS')\">";
pub const SQL_INJECTION: &str = "'; DROP TABLE weather;--";
pub const HTML_INJECTION: &str = "<h1 style=\"color:red\">HACKED</h1>";
pub const JS_PROTOCOL: &str = "javascript:alert(\"XSS\")";
pub const DATA_URI: &str = "data:text/html,<script>alert(\"XSS\")</script>";

/// Simulated provider failures, one is picked per `error` attack
pub const ERROR_RESPONSES: [(u16, &str); 4] = [
    (500, "Internal Server Error - Simulated Crash"),
    (403, "Forbidden - Access Denied"),
    (401, "Unauthorized - Invalid Credentials"),
    (503, "Service Unavailable - Server Down"),
];

/// Attack scenario requested from the mock endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AttackVector {
    /// Script, event handler and protocol payloads in string fields
    Xss,
    /// Unsafe integers, negative pressure and impossible humidity
    Overflow,
    /// Wrong runtime kinds in every field
    TypeConfusion,
    /// Required fields left out
    Incomplete,
    /// Well-formed payload after a long pause
    Delay,
    /// Non-2xx response with a JSON error body
    Error,
    /// Several vectors in one payload
    Mixed,
    /// One of the above, excluding `delay`
    #[default]
    Random,
}

impl AttackVector {
    pub const ALL: [AttackVector; 8] = [
        AttackVector::Xss,
        AttackVector::Overflow,
        AttackVector::TypeConfusion,
        AttackVector::Incomplete,
        AttackVector::Delay,
        AttackVector::Error,
        AttackVector::Mixed,
        AttackVector::Random,
    ];

    /// Scenarios `random` chooses from
    pub const RANDOM_POOL: [AttackVector; 6] = [
        AttackVector::Xss,
        AttackVector::Overflow,
        AttackVector::TypeConfusion,
        AttackVector::Incomplete,
        AttackVector::Error,
        AttackVector::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackVector::Xss => "xss",
            AttackVector::Overflow => "overflow",
            AttackVector::TypeConfusion => "type-confusion",
            AttackVector::Incomplete => "incomplete",
            AttackVector::Delay => "delay",
            AttackVector::Error => "error",
            AttackVector::Mixed => "mixed",
            AttackVector::Random => "random",
        }
    }

    /// Lenient parse used for query strings: unknown names mean `random`
    pub fn from_query(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(AttackVector::Random)
    }
}

impl std::fmt::Display for AttackVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttackVector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttackVector::ALL
            .into_iter()
            .find(|attack| attack.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown attack vector: '{}'", s))
    }
}

pub fn xss_payload() -> Value {
    json!({
        "message": {
            "city": format!("{}Madrid", XSS_SCRIPT),
            "temp": XSS_IMG,
            "feelsLike": 20,
            "tempMin": 18,
            "tempMax": 25,
            "condition": format!("{}Soleado", XSS_SVG),
            "humidity": 65,
            "pressure": 1013,
            "wind": 15,
            "visibility": 10000,
            "country": HTML_INJECTION,
            "icon": JS_PROTOCOL,
        }
    })
}

/// Infinite values have no JSON form and go out as `null`
pub fn overflow_payload() -> Value {
    json!({
        "message": {
            "city": "Madrid",
            "temp": 9_999_999_999_999_999_999_u64,
            "feelsLike": 9_007_199_254_740_991_u64,
            "tempMin": null,
            "tempMax": null,
            "condition": "Soleado",
            "humidity": 9_999_999,
            "pressure": -5000,
            "wind": 999_999,
            "visibility": null,
            "country": "ES",
        }
    })
}

pub fn type_confusion_payload() -> Value {
    json!({
        "message": {
            "city": ["Madrid", "Barcelona"],
            "temp": "veinte grados",
            "feelsLike": null,
            "tempMax": {"value": 25, "unit": "celsius"},
            "condition": 404,
            "humidity": "alta",
            "pressure": true,
            "wind": [10, 15, 20],
            "visibility": "10km",
            "country": 123,
        }
    })
}

pub fn incomplete_payload() -> Value {
    json!({
        "message": {
            "city": "Madrid",
            "feelsLike": 20,
            "humidity": 65,
            "wind": 15,
        }
    })
}

pub fn delayed_payload() -> Value {
    json!({
        "message": {
            "city": "Madrid",
            "temp": 22,
            "feelsLike": 20,
            "tempMin": 18,
            "tempMax": 25,
            "condition": "Delayed Response Attack",
            "humidity": 65,
            "pressure": 1013,
            "wind": 15,
            "visibility": 10000,
        }
    })
}

pub fn mixed_payload() -> Value {
    json!({
        "message": {
            "city": format!("{}Madrid", XSS_SCRIPT),
            "temp": format!("99999{}", XSS_IMG),
            "feelsLike": null,
            "tempMax": HTML_INJECTION,
            "condition": SQL_INJECTION,
            "humidity": -999,
            "pressure": format!("high{}", XSS_SVG),
            "wind": [XSS_IFRAME],
            "visibility": {"evil": DATA_URI},
            "country": {"$ne": null},
            "maliciousField": "<iframe src=\"evil.com\"></iframe>",
            "_id": {"$gt": ""},
            "exploit": "../../etc/passwd",
        }
    })
}

/// Error body in the shape the backend uses for failures
pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}
