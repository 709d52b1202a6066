//! Domain types shared by the provider clients and the ingestion pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::security::SourceId;

/// Weather data source selectable from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSource {
    /// OpenWeather, reached through the backend
    OpenWeather,
    /// WeatherAPI, reached through the backend
    WeatherApi,
    /// Adversarial provider that serves hostile payloads
    Mock,
}

impl ApiSource {
    pub const ALL: [ApiSource; 3] = [ApiSource::OpenWeather, ApiSource::WeatherApi, ApiSource::Mock];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSource::OpenWeather => "openweather",
            ApiSource::WeatherApi => "weatherapi",
            ApiSource::Mock => "mock",
        }
    }
}

impl std::fmt::Display for ApiSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiSource::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weather source: '{}'", s))
    }
}

/// Normalized current conditions after sanitization.
///
/// Temperatures in °C, wind in km/h, pressure in hPa, visibility in meters.
/// Every numeric field is finite and inside the safe integer range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
    pub humidity: f64,
    pub pressure: f64,
    pub wind: f64,
    pub visibility: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloudiness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uv: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// One day of the forecast chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: String,
    pub temp_max: f64,
    pub temp_min: f64,
}

/// Maximum number of forecast days delivered to the chart
pub const FORECAST_DAYS: usize = 7;

/// Raw current-conditions response together with the shape it declares
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayload {
    pub source: SourceId,
    pub body: Value,
}

impl ProviderPayload {
    pub fn new(source: SourceId, body: Value) -> Self {
        Self { source, body }
    }
}
