use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

use super::{forecast_day_label, BackendClient, WeatherProvider};
use crate::common::security::{
    sanitize_number, sanitize_str, validate_structure, SourceId, StructuralError, ValidatedPayload,
};
use crate::weather::{ApiSource, FetchError, ForecastDay, ProviderPayload, FORECAST_DAYS};

/// OpenWeather through the backend.
///
/// Current conditions take two calls: the geocoder resolves the city to
/// coordinates, then the station endpoint is queried by coordinates.
pub struct OpenWeatherProvider {
    backend: BackendClient,
}

impl OpenWeatherProvider {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    async fn geocode(&self, city: &str) -> Result<(f64, f64), FetchError> {
        let body = self
            .backend
            .get_json("openweather/geocode", &[("q", city.to_string())])
            .await?;

        let ValidatedPayload::Locations(list) = validate_structure(&body, SourceId::ProviderA)? else {
            return Err(StructuralError::new(SourceId::ProviderA, "missing 'message' list").into());
        };

        first_coordinates(list).ok_or_else(|| {
            StructuralError::new(SourceId::ProviderA, "location without coordinates").into()
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn api_source(&self) -> ApiSource {
        ApiSource::OpenWeather
    }

    fn name(&self) -> &'static str {
        "OpenWeatherProvider"
    }

    async fn fetch_current(&self, city: &str) -> Result<ProviderPayload, FetchError> {
        let result = async {
            let (lat, lon) = self.geocode(city).await?;
            let body = self
                .backend
                .get_json(
                    "openweather/current",
                    &[("lat", lat.to_string()), ("lon", lon.to_string())],
                )
                .await?;
            Ok(ProviderPayload::new(SourceId::ProviderACurrent, body))
        }
        .await;

        match &result {
            Ok(_) => self.log_fetch_success("fetch_current", Some(city)),
            Err(e) => self.log_fetch_error("fetch_current", e),
        }
        result
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        let body = self
            .backend
            .get_json("openweather/forecast", &[("q", city.to_string())])
            .await
            .inspect_err(|e| self.log_fetch_error("fetch_forecast", e))?;

        let days = group_forecast(&body);
        self.log_fetch_success("fetch_forecast", Some(&format!("{} days", days.len())));
        Ok(days)
    }
}

fn first_coordinates(list: &[Value]) -> Option<(f64, f64)> {
    let first = list.first()?;
    let lat = first.get("lat")?.as_f64()?;
    let lon = first.get("lon")?.as_f64()?;
    Some((lat, lon))
}

/// Collapse 3-hourly readings into per-day extremes.
///
/// Days keep the order in which they first appear; at most
/// [`FORECAST_DAYS`] are returned. Readings without a timestamp are skipped.
pub fn group_forecast(body: &Value) -> Vec<ForecastDay> {
    let Some(list) = body.pointer("/message/list").and_then(Value::as_array) else {
        tracing::warn!("Forecast response without 'message.list'");
        return Vec::new();
    };

    let mut days: Vec<(String, Vec<f64>)> = Vec::new();
    for item in list {
        let Some(dt) = item.get("dt").and_then(Value::as_i64) else {
            continue;
        };
        let Some(timestamp) = DateTime::from_timestamp(dt, 0) else {
            continue;
        };
        let label = forecast_day_label(timestamp.date_naive());
        let temp = sanitize_number(item.pointer("/main/temp"), 0.0);

        match days.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, temps)) => temps.push(temp),
            None => days.push((label, vec![temp])),
        }
    }

    days.into_iter()
        .take(FORECAST_DAYS)
        .map(|(label, temps)| ForecastDay {
            date: sanitize_str(&label),
            temp_max: temps.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            temp_min: temps.iter().copied().fold(f64::INFINITY, f64::min),
        })
        .collect()
}
