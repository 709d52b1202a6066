/// Audit trail for provider fetches
/// Append-only, session-owned log of fetch outcomes with live notifications
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::weather::ApiSource;

/// Default number of entries retained before the oldest are dropped
pub const DEFAULT_AUDIT_CAPACITY: usize = 500;

/// Number of entries the dashboard panel shows
pub const RECENT_ENTRIES: usize = 5;

const NOTIFY_BUFFER: usize = 64;

/// Outcome classification of a fetch attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    /// Data delivered, but content anomalies were found
    Warning,
    /// Network or structural failure, no data delivered
    Error,
    Threat,
}

/// Audit entry before id and timestamp are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntryDraft {
    pub message: String,
    pub status: AuditStatus,
    pub latency_ms: u64,
    pub api_source: ApiSource,
    pub threats: Option<Vec<String>>,
}

impl AuditEntryDraft {
    pub fn success(api_source: ApiSource, message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            message: message.into(),
            status: AuditStatus::Success,
            latency_ms,
            api_source,
            threats: None,
        }
    }

    pub fn warning(
        api_source: ApiSource,
        message: impl Into<String>,
        latency_ms: u64,
        threats: Vec<String>,
    ) -> Self {
        Self {
            message: message.into(),
            status: AuditStatus::Warning,
            latency_ms,
            api_source,
            threats: Some(threats),
        }
    }

    pub fn error(api_source: ApiSource, message: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            message: message.into(),
            status: AuditStatus::Error,
            latency_ms,
            api_source,
            threats: None,
        }
    }
}

/// One immutable record of a fetch-and-audit attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub status: AuditStatus,
    pub latency_ms: u64,
    pub api_source: ApiSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threats: Option<Vec<String>>,
}

/// Aggregate counts shown in the dashboard summary tiles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: usize,
    pub success_count: usize,
    pub warning_count: usize,
    pub error_count: usize,
    pub threat_count: usize,
    pub avg_latency_ms: u64,
}

impl AuditStats {
    /// Pure reduction over a sequence of entries
    pub fn from_entries(entries: &[AuditEntry]) -> Self {
        let count = |status: AuditStatus| entries.iter().filter(|e| e.status == status).count();

        let avg_latency_ms = if entries.is_empty() {
            0
        } else {
            let sum: u128 = entries.iter().map(|e| e.latency_ms as u128).sum();
            (sum as f64 / entries.len() as f64).round() as u64
        };

        Self {
            total: entries.len(),
            success_count: count(AuditStatus::Success),
            warning_count: count(AuditStatus::Warning),
            error_count: count(AuditStatus::Error),
            threat_count: count(AuditStatus::Threat),
            avg_latency_ms,
        }
    }
}

struct AuditLog {
    entries: VecDeque<AuditEntry>,
    next_id: u64,
    capacity: usize,
}

/// Append-only audit recorder.
///
/// Appends are serialized behind a single mutex, so ids, log order and
/// notification order all follow the same total order. When `capacity` is
/// non-zero only the most recent `capacity` entries are retained.
pub struct AuditRecorder {
    log: Mutex<AuditLog>,
    notifier: broadcast::Sender<AuditEntry>,
}

impl AuditRecorder {
    /// Create a recorder retaining at most `capacity` entries (0 = unlimited)
    pub fn new(capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(NOTIFY_BUFFER);
        Self {
            log: Mutex::new(AuditLog {
                entries: VecDeque::new(),
                next_id: 1,
                capacity,
            }),
            notifier,
        }
    }

    /// Finalize a draft, append it to the log and notify subscribers
    pub fn append(&self, draft: AuditEntryDraft) -> AuditEntry {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = AuditEntry {
            id: log.next_id,
            timestamp: Utc::now(),
            message: draft.message,
            status: draft.status,
            latency_ms: draft.latency_ms,
            api_source: draft.api_source,
            threats: draft.threats,
        };
        log.next_id += 1;

        log.entries.push_back(entry.clone());
        if log.capacity > 0 {
            while log.entries.len() > log.capacity {
                log.entries.pop_front();
            }
        }

        Self::trace(&entry);
        // No subscribers is fine
        let _ = self.notifier.send(entry.clone());

        entry
    }

    /// Receive every entry appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEntry> {
        self.notifier.subscribe()
    }

    /// Most recent `k` entries, newest first
    pub fn recent(&self, k: usize) -> Vec<AuditEntry> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.entries.iter().rev().take(k).cloned().collect()
    }

    /// All retained entries in append order
    pub fn entries(&self) -> Vec<AuditEntry> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.entries.iter().cloned().collect()
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats::from_entries(&self.entries())
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn trace(entry: &AuditEntry) {
        let event_json = serde_json::to_string(entry)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize entry: {}\"}}", e));

        match entry.status {
            AuditStatus::Success => {
                info!(
                    audit_status = "success",
                    api_source = %entry.api_source,
                    event = %event_json,
                    "Fetch audit event"
                );
            }
            AuditStatus::Warning => {
                warn!(
                    audit_status = "warning",
                    api_source = %entry.api_source,
                    event = %event_json,
                    "Fetch audit warning"
                );
            }
            AuditStatus::Error => {
                error!(
                    audit_status = "error",
                    api_source = %entry.api_source,
                    event = %event_json,
                    "Fetch audit error"
                );
            }
            AuditStatus::Threat => {
                error!(
                    audit_status = "threat",
                    api_source = %entry.api_source,
                    event = %event_json,
                    "THREAT fetch audit event"
                );
            }
        }
    }
}

impl Default for AuditRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
