//! JSON client for the weather backend.
//!
//! The backend wraps every upstream response in a `message` envelope and
//! reports failures as `{"error": "..."}` with a non-2xx status.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::weather::FetchError;

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}/{path}` and decode the JSON body.
    ///
    /// Non-2xx statuses become [`FetchError::Http`], using the body's `error`
    /// field as the reason when there is one.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(url = %url, "Backend request");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_transport(e))?;

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: error_reason(status, &text),
            });
        }

        serde_json::from_str(&text).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn map_transport(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else {
            FetchError::from(err)
        }
    }
}

/// Reason text for a failed response
pub(crate) fn error_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string())
}
