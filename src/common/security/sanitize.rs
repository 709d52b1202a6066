//! Defensive normalization of untrusted payload values.
//!
//! Text is reduced to plain content with an empty tag allowlist and an empty
//! attribute allowlist, so sanitized output never carries element or attribute
//! syntax. Numbers are coerced and checked for type and overflow safety only;
//! domain ranges are reported by [`validate_range`] and never corrected here.

use scraper::{Html, Node};
use serde_json::Value;

use super::threat_patterns::text_projection;

/// Largest integer magnitude an f64 represents exactly (2^53 - 1)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Elements dropped together with their content
const DISCARDED_CONTENT: &[&str] = &[
    "script", "style", "template", "iframe", "noscript", "noembed", "noframes", "xmp", "object",
];

/// Strip all markup from a string, keeping only its text content.
///
/// The input is parsed as an HTML fragment, so quoted attribute values and
/// unterminated elements are handled the way a browser would. The result never
/// contains `<` or `>` and is trimmed, which makes the function idempotent.
pub fn sanitize_str(input: &str) -> String {
    // Character references stay literal so escaped markup cannot resurface as tags
    let fragment = Html::parse_fragment(&input.replace('&', "&amp;"));

    let mut text: String = fragment
        .tree
        .root()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| DISCARDED_CONTENT.contains(&el.name()))
            })
        })
        .filter_map(|node| match node.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect();

    // Brackets that reached text content as literals
    text.retain(|c| c != '<' && c != '>');

    text.trim().to_string()
}

/// Sanitize a value of any shape by stripping its canonical textual projection
pub fn sanitize_text(value: Option<&Value>) -> String {
    sanitize_str(&text_projection(value))
}

/// Outcome of coercing a value to a number
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCheck {
    Valid(f64),
    NotANumber,
    /// Infinite or beyond the safe integer range
    Overflow(f64),
}

/// Coerce a value to a number and classify the result
pub fn classify_number(value: Option<&Value>) -> NumericCheck {
    classify_f64(coerce_number(value))
}

/// Classify an already numeric value
pub fn classify_f64(num: f64) -> NumericCheck {
    if num.is_nan() {
        NumericCheck::NotANumber
    } else if num.is_infinite() || !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&num) {
        NumericCheck::Overflow(num)
    } else {
        NumericCheck::Valid(num)
    }
}

/// Coerce a value to a number, substituting `fallback` when the result is not a
/// number, is infinite, or leaves the safe integer range.
pub fn sanitize_number(value: Option<&Value>, fallback: f64) -> f64 {
    sanitize_f64(coerce_number(value), fallback)
}

/// [`sanitize_number`] for values that are already `f64`
pub fn sanitize_f64(num: f64, fallback: f64) -> f64 {
    match classify_f64(num) {
        NumericCheck::Valid(n) => n,
        NumericCheck::NotANumber => fallback,
        NumericCheck::Overflow(n) => {
            if n.is_infinite() {
                tracing::warn!(value = %n, "Overflow detected: infinite value");
            } else {
                tracing::warn!(value = %n, "Overflow detected: outside safe integer range");
            }
            fallback
        }
    }
}

/// Loose numeric coercion of an arbitrary payload value.
///
/// - numbers are taken as-is
/// - strings are parsed (surrounding whitespace ignored, empty string is 0,
///   `Infinity` and `0x`/`0o`/`0b` literals accepted)
/// - `true`/`false` become 1/0 and `null` becomes 0
/// - an empty array is 0, a one-element array coerces its element's text
/// - anything else is NaN
pub fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_str(s),
        Some(Value::Array(items)) => match items.as_slice() {
            [] => 0.0,
            [Value::Null] => 0.0,
            [Value::Array(_) | Value::Object(_)] => f64::NAN,
            [single] => parse_numeric_str(&text_projection(Some(single))),
            _ => f64::NAN,
        },
        Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_str(input: &str) -> f64 {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefixes, radix) in [(["0x", "0X"], 16), (["0o", "0O"], 8), (["0b", "0B"], 2)] {
        if let Some(digits) = prefixes.iter().find_map(|p| trimmed.strip_prefix(p)) {
            return parse_radix(digits, radix);
        }
    }

    // Only plain decimal literals; rejects Rust-only spellings such as "inf" or "NaN"
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN)
}

/// Advisory domain range check.
///
/// Logs a warning when `value` falls outside `[min, max]` and reports whether it
/// was in range. The value itself is never altered.
pub fn validate_range(value: f64, min: f64, max: f64, field_name: &str) -> bool {
    if value < min || value > max {
        tracing::warn!(
            field = %field_name,
            value = %value,
            min = %min,
            max = %max,
            "Value out of range"
        );
        return false;
    }
    true
}

/// Runtime kind of a payload value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    Undefined,
}

impl ValueKind {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => ValueKind::Undefined,
            Some(Value::Null) => ValueKind::Null,
            Some(Value::String(_)) => ValueKind::String,
            Some(Value::Number(_)) => ValueKind::Number,
            Some(Value::Bool(_)) => ValueKind::Boolean,
            Some(Value::Array(_)) => ValueKind::Array,
            Some(Value::Object(_)) => ValueKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Null => "null",
            ValueKind::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the runtime kind of a value, logging a warning on mismatch
pub fn validate_type(value: Option<&Value>, expected: ValueKind, field_name: &str) -> bool {
    let actual = ValueKind::of(value);
    if actual != expected {
        tracing::warn!(
            field = %field_name,
            expected = %expected,
            actual = %actual,
            "Unexpected value type"
        );
        return false;
    }
    true
}
