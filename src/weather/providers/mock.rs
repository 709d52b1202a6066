use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::WeatherProvider;
use crate::common::security::SourceId;
use crate::mock::{AttackVector, MockService};
use crate::weather::{ApiSource, FetchError, ForecastDay, ProviderPayload};

/// In-process adversarial provider
pub struct MockProvider {
    service: Arc<MockService>,
    attack: AttackVector,
}

impl MockProvider {
    pub fn new(service: Arc<MockService>, attack: AttackVector) -> Self {
        Self { service, attack }
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    fn api_source(&self) -> ApiSource {
        ApiSource::Mock
    }

    fn name(&self) -> &'static str {
        "MockProvider"
    }

    async fn fetch_current(&self, _city: &str) -> Result<ProviderPayload, FetchError> {
        let response = self.service.respond(self.attack).await;

        if !response.is_success() {
            let reason = response
                .body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("Mock API error")
                .to_string();
            let err = FetchError::Http {
                status: response.status,
                reason,
            };
            self.log_fetch_error("fetch_current", &err);
            return Err(err);
        }

        self.log_fetch_success("fetch_current", Some(self.attack.as_str()));
        Ok(ProviderPayload::new(SourceId::Mock, response.body))
    }

    /// Synthesized; does not count against the mock rate limit
    async fn fetch_forecast(&self, _city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        Ok(self.service.forecast(Utc::now().date_naive()))
    }
}
