//! Weather provider clients.
//!
//! Every provider implements [`WeatherProvider`]. Current conditions come back
//! raw, tagged with the shape they must be validated against; forecasts are
//! normalized here since the chart only needs dates and extremes.
//!
//! ```text
//! WeatherProvider
//!   ├── OpenWeatherProvider  (backend: geocode -> current, forecast)
//!   ├── WeatherApiProvider   (backend: current, forecast)
//!   └── MockProvider         (in-process MockService)
//! ```

pub mod backend;
pub mod mock;
pub mod openweather;
pub mod weatherapi;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::weather::{ApiSource, FetchError, ForecastDay, ProviderPayload};

pub use backend::BackendClient;
pub use mock::MockProvider;
pub use openweather::OpenWeatherProvider;
pub use weatherapi::WeatherApiProvider;

/// A source of current conditions and a daily forecast.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Which dashboard source this provider serves
    fn api_source(&self) -> ApiSource;

    /// Returns the name of this provider, used in log lines
    fn name(&self) -> &'static str;

    /// Fetch the raw current-conditions payload for `city`
    async fn fetch_current(&self, city: &str) -> Result<ProviderPayload, FetchError>;

    /// Fetch up to seven forecast days for `city`
    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError>;

    fn log_fetch_success(&self, operation: &str, detail: Option<&str>) {
        let message = match detail {
            Some(d) => format!("{}::{} completed: {}", self.name(), operation, d),
            None => format!("{}::{} completed successfully", self.name(), operation),
        };
        tracing::debug!("{}", message);
    }

    fn log_fetch_error(&self, operation: &str, error: &FetchError) {
        tracing::error!("{}::{} failed: {}", self.name(), operation, error);
    }
}

/// Short chart label for a forecast day, e.g. `Mon 04`
pub fn forecast_day_label(date: NaiveDate) -> String {
    date.format("%a %d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::security::SourceId;
    use serde_json::json;

    struct StaticProvider;

    #[async_trait]
    impl WeatherProvider for StaticProvider {
        fn api_source(&self) -> ApiSource {
            ApiSource::Mock
        }

        fn name(&self) -> &'static str {
            "StaticProvider"
        }

        async fn fetch_current(&self, city: &str) -> Result<ProviderPayload, FetchError> {
            Ok(ProviderPayload::new(SourceId::Mock, json!({"message": {"city": city}})))
        }

        async fn fetch_forecast(&self, _city: &str) -> Result<Vec<ForecastDay>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let provider: Box<dyn WeatherProvider> = Box::new(StaticProvider);
        let payload = provider.fetch_current("Madrid").await.unwrap();
        assert_eq!(payload.body["message"]["city"], "Madrid");
        assert_eq!(provider.api_source(), ApiSource::Mock);

        // Logging helpers must not panic
        provider.log_fetch_success("fetch_current", Some("Madrid"));
        provider.log_fetch_success("fetch_current", None);
        provider.log_fetch_error("fetch_current", &FetchError::Timeout(10));
    }

    #[test]
    fn test_forecast_day_label() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(forecast_day_label(date), "Wed 25");
    }
}
