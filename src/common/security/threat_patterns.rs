use once_cell::sync::Lazy;
/// Threat signature matching for untrusted provider payloads
/// Detects XSS, SQL/NoSQL injection, path traversal and HTML injection attempts
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::sanitize::sanitize_str;

/// Inline event handlers tracked as separate XSS signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventHandler {
    OnError,
    OnLoad,
}

/// Closed set of threat signatures the matcher knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "handler")]
pub enum ThreatKind {
    XssScriptTag,
    XssIframeTag,
    XssEventHandler(EventHandler),
    XssJsProtocol,
    XssSvgOnload,
    SqlInjection,
    NoSqlInjectionOperator,
    PathTraversal,
    HtmlInjection,
}

impl ThreatKind {
    /// Fixed human-readable description used in audit threat strings
    pub fn description(&self) -> &'static str {
        match self {
            ThreatKind::XssScriptTag => "XSS: <script> tag detected",
            ThreatKind::XssIframeTag => "XSS: <iframe> tag detected",
            ThreatKind::XssEventHandler(EventHandler::OnError) => "XSS: onerror event handler",
            ThreatKind::XssEventHandler(EventHandler::OnLoad) => "XSS: onload event handler",
            ThreatKind::XssJsProtocol => "XSS: javascript: protocol",
            ThreatKind::XssSvgOnload => "XSS: SVG with onload",
            ThreatKind::SqlInjection => "SQL Injection pattern detected",
            ThreatKind::NoSqlInjectionOperator => "NoSQL Injection operator detected",
            ThreatKind::PathTraversal => "Path Traversal attempt",
            ThreatKind::HtmlInjection => "HTML Injection detected",
        }
    }
}

impl std::fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Result of scanning a single value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatReport {
    pub has_threat: bool,
    pub threat_kinds: Vec<ThreatKind>,
    pub original_value: String,
    pub sanitized_value: String,
}

impl ThreatReport {
    /// Descriptions of every matched signature, in detection order
    pub fn descriptions(&self) -> Vec<&'static str> {
        self.threat_kinds.iter().map(ThreatKind::description).collect()
    }
}

/// Regex patterns for threat detection
static SCRIPT_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());

static IFRAME_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<iframe[^>]*>").unwrap());

static ONERROR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)onerror\s*=").unwrap());

static ONLOAD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)onload\s*=").unwrap());

static JS_PROTOCOL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)javascript:").unwrap());

static SVG_ONLOAD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<svg[^>]*onload").unwrap());

static SQL_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        // Quoted boolean tautology: ' OR '1'='1
        Regex::new(r"(?i)'\s*(OR|AND)\s*'.*'=").unwrap(),
        Regex::new(r"(?i)DROP\s+TABLE").unwrap(),
    ]
});

static PATH_TRAVERSAL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.[/\\]").unwrap());

static HTML_INJECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<[^>]+style\s*=|<h1|<img|<a\s+href").unwrap());

/// Reserved query operators that indicate NoSQL injection when used as object keys
static NOSQL_OPERATORS: &[&str] = &[
    "$ne", "$eq", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$regex", "$where", "$exists",
];

/// Canonical textual projection of an arbitrary payload value.
///
/// Every scan and every text sanitization starts from this form:
/// - strings are taken verbatim
/// - numbers and booleans use their literal form
/// - `null` becomes `"null"`, a missing value becomes `"undefined"`
/// - arrays and objects become compact JSON text
pub fn text_projection(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Scan a value for every known threat signature.
///
/// Detection is non-destructive: the report carries both the original text and
/// its sanitized form, and callers decide which one to use. All signatures are
/// tested independently, so a single value may report several kinds.
pub fn detect_threats(value: Option<&Value>) -> ThreatReport {
    let text = text_projection(value);
    let mut kinds = scan_text(&text);

    // Object shape check, runs against the original value rather than its text.
    // Inserted in its fixed position: after SQL, before path traversal.
    if has_nosql_operator(value) {
        let position = kinds
            .iter()
            .position(|k| matches!(k, ThreatKind::PathTraversal | ThreatKind::HtmlInjection))
            .unwrap_or(kinds.len());
        kinds.insert(position, ThreatKind::NoSqlInjectionOperator);
    }

    ThreatReport {
        has_threat: !kinds.is_empty(),
        threat_kinds: kinds,
        sanitized_value: sanitize_str(&text),
        original_value: text,
    }
}

/// Scan text that is already in its projected form
pub fn detect_in_str(text: &str) -> ThreatReport {
    let kinds = scan_text(text);
    ThreatReport {
        has_threat: !kinds.is_empty(),
        threat_kinds: kinds,
        original_value: text.to_string(),
        sanitized_value: sanitize_str(text),
    }
}

fn scan_text(text: &str) -> Vec<ThreatKind> {
    let mut kinds = Vec::new();

    // XSS
    if SCRIPT_TAG_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssScriptTag);
    }
    if IFRAME_TAG_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssIframeTag);
    }
    if ONERROR_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssEventHandler(EventHandler::OnError));
    }
    if ONLOAD_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssEventHandler(EventHandler::OnLoad));
    }
    if JS_PROTOCOL_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssJsProtocol);
    }
    if SVG_ONLOAD_PATTERN.is_match(text) {
        kinds.push(ThreatKind::XssSvgOnload);
    }

    // SQL injection
    if SQL_PATTERNS.iter().any(|p| p.is_match(text)) {
        kinds.push(ThreatKind::SqlInjection);
    }

    // Path traversal
    if PATH_TRAVERSAL_PATTERN.is_match(text) {
        kinds.push(ThreatKind::PathTraversal);
    }

    // HTML injection
    if HTML_INJECTION_PATTERN.is_match(text) {
        kinds.push(ThreatKind::HtmlInjection);
    }

    kinds
}

fn has_nosql_operator(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Object(map)) => NOSQL_OPERATORS.iter().any(|op| map.contains_key(*op)),
        _ => false,
    }
}
