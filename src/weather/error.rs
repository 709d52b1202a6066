use crate::common::security::StructuralError;

/// Fetch-level failures. Each one aborts a single fetch attempt and is
/// surfaced to the user; none of them is ever classified as a threat.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Non-2xx status from the provider or backend
    #[error("HTTP error {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid JSON body: {0}")]
    Decode(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

impl FetchError {
    /// Whether this failure happened before a payload could be inspected
    pub fn is_network(&self) -> bool {
        !matches!(self, FetchError::Structural(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Http { status: 429, .. })
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(0)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            }
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
