use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use super::{forecast_day_label, BackendClient, WeatherProvider};
use crate::common::security::{sanitize_number, sanitize_str, SourceId};
use crate::weather::{ApiSource, FetchError, ForecastDay, ProviderPayload, FORECAST_DAYS};

/// WeatherAPI through the backend
pub struct WeatherApiProvider {
    backend: BackendClient,
}

impl WeatherApiProvider {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn api_source(&self) -> ApiSource {
        ApiSource::WeatherApi
    }

    fn name(&self) -> &'static str {
        "WeatherApiProvider"
    }

    async fn fetch_current(&self, city: &str) -> Result<ProviderPayload, FetchError> {
        let body = self
            .backend
            .get_json("weatherapi/current", &[("q", city.to_string())])
            .await
            .inspect_err(|e| self.log_fetch_error("fetch_current", e))?;

        self.log_fetch_success("fetch_current", Some(city));
        Ok(ProviderPayload::new(SourceId::ProviderB, body))
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        let body = self
            .backend
            .get_json(
                "weatherapi/forecast",
                &[("q", city.to_string()), ("days", FORECAST_DAYS.to_string())],
            )
            .await
            .inspect_err(|e| self.log_fetch_error("fetch_forecast", e))?;

        let days = parse_forecast(&body);
        self.log_fetch_success("fetch_forecast", Some(&format!("{} days", days.len())));
        Ok(days)
    }
}

/// Read the daily extremes WeatherAPI already computes
pub fn parse_forecast(body: &Value) -> Vec<ForecastDay> {
    let Some(forecast_days) = body
        .pointer("/message/forecast/forecastday")
        .and_then(Value::as_array)
    else {
        tracing::warn!("Forecast response without 'message.forecast.forecastday'");
        return Vec::new();
    };

    forecast_days
        .iter()
        .take(FORECAST_DAYS)
        .map(|day| {
            let raw_date = day.get("date").and_then(Value::as_str).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map(forecast_day_label)
                .unwrap_or_else(|_| sanitize_str(raw_date));

            ForecastDay {
                date,
                temp_max: sanitize_number(day.pointer("/day/maxtemp_c"), 0.0),
                temp_min: sanitize_number(day.pointer("/day/mintemp_c"), 0.0),
            }
        })
        .collect()
}
