//! Defensive layer between untrusted provider payloads and the dashboard.
//!
//! Every provider response is treated as hostile until it has passed through
//! this module.
//!
//! # Modules
//!
//! - [`structure`] - Minimal shape validation per declared source
//! - [`threat_patterns`] - Signature matching (XSS, SQL/NoSQL injection, path traversal, HTML)
//! - [`sanitize`] - Markup stripping, numeric coercion, type and range checks
//! - [`audit`] - Append-only audit trail of fetch outcomes
//! - [`helpers`] - Timeouts and latency measurement for provider calls
//!
//! # Pipeline
//!
//! ```text
//! raw JSON ── validate_structure ──> ValidatedPayload
//!                 │ (fails: StructuralError, audited as error)
//!                 v
//!        per-field detect_threats / validate_type / validate_range
//!                 │
//!                 v
//!        sanitize_text / sanitize_number ──> WeatherRecord
//! ```
//!
//! Detection never gates delivery. Content anomalies are reported as threat
//! strings on the audit entry and the sanitized record is still delivered;
//! only structural failures stop a fetch.
//!
//! # Examples
//!
//! ```
//! use weather_audit::common::security::{detect_threats, sanitize_str};
//! use serde_json::json;
//!
//! let city = json!("<script>alert(1)</script>Madrid");
//! let report = detect_threats(Some(&city));
//! assert!(report.has_threat);
//! assert_eq!(sanitize_str(&report.original_value), "Madrid");
//! ```

pub mod audit;
pub mod helpers;
pub mod sanitize;
pub mod structure;
pub mod threat_patterns;

pub use audit::{
    AuditEntry, AuditEntryDraft, AuditRecorder, AuditStats, AuditStatus, DEFAULT_AUDIT_CAPACITY,
    RECENT_ENTRIES,
};
pub use helpers::{timed, with_timeout};
pub use sanitize::{
    classify_number, coerce_number, sanitize_f64, sanitize_number, sanitize_str, sanitize_text,
    validate_range, validate_type, NumericCheck, ValueKind, MAX_SAFE_INTEGER,
};
pub use structure::{validate_structure, SourceId, StructuralError, ValidatedPayload};
pub use threat_patterns::{
    detect_in_str, detect_threats, text_projection, EventHandler, ThreatKind, ThreatReport,
};
