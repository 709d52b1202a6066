//! HTTP handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{AppError, AppResult};
use super::AppState;
use crate::common::security::{AuditEntry, AuditStats, RECENT_ENTRIES};
use crate::mock::AttackVector;
use crate::weather::{ApiSource, DisplayState, FetchOutcome, ForecastDay, ProviderComparison, WeatherRecord};

/// Longest accepted city query
pub const MAX_CITY_LEN: usize = 100;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub api: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    pub sequence: u64,
    pub superseded: bool,
    pub record: Option<WeatherRecord>,
    pub forecast: Vec<ForecastDay>,
    pub audit_entry: AuditEntry,
    pub error: Option<String>,
}

impl From<FetchOutcome> for WeatherResponse {
    fn from(outcome: FetchOutcome) -> Self {
        Self {
            sequence: outcome.sequence,
            superseded: outcome.superseded,
            record: outcome.record,
            forecast: outcome.forecast,
            audit_entry: outcome.audit_entry,
            error: outcome.error.map(|e| e.to_string()),
        }
    }
}

/// Search. Fetch failures are part of the outcome, not an HTTP error
pub async fn weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> AppResult<Json<WeatherResponse>> {
    let Query(query) = query?;
    let city = validate_city(query.city.as_deref())?;
    let api = match query.api.as_deref() {
        None | Some("") => ApiSource::OpenWeather,
        Some(raw) => raw.parse::<ApiSource>().map_err(AppError::ValidationError)?,
    };

    let outcome = state.ingestion.fetch_weather(&city, api).await;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct CompareQuery {
    pub city: Option<String>,
}

pub async fn compare(
    State(state): State<AppState>,
    query: Result<Query<CompareQuery>, QueryRejection>,
) -> AppResult<Json<ProviderComparison>> {
    let Query(query) = query?;
    let city = validate_city(query.city.as_deref())?;
    Ok(Json(state.ingestion.compare_providers(&city).await))
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

/// Latest audit entries, newest first
pub async fn audit_log(
    State(state): State<AppState>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(RECENT_ENTRIES);
    Ok(Json(state.ingestion.audit().recent(limit)))
}

pub async fn audit_stats(State(state): State<AppState>) -> Json<AuditStats> {
    Json(state.ingestion.audit().stats())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub state: DisplayState,
    pub recent_entries: Vec<AuditEntry>,
    pub stats: AuditStats,
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let audit = state.ingestion.audit();
    Json(DashboardResponse {
        state: state.ingestion.display_state(),
        recent_entries: audit.recent(RECENT_ENTRIES),
        stats: audit.stats(),
    })
}

#[derive(Debug, Deserialize)]
pub struct MockQuery {
    pub attack: Option<String>,
}

/// Adversarial endpoint; unknown attack names serve a random one
pub async fn mock_malicious(
    State(state): State<AppState>,
    query: Result<Query<MockQuery>, QueryRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Query(query) = query?;
    let attack = AttackVector::from_query(query.attack.as_deref());
    let response = state.mock.respond(attack).await;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(response.body)))
}

/// JSON 404 for unknown routes
pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

fn validate_city(raw: Option<&str>) -> AppResult<String> {
    let city = raw.map(str::trim).unwrap_or_default();
    if city.is_empty() {
        return Err(AppError::ValidationError("city is required".to_string()));
    }
    if city.chars().count() > MAX_CITY_LEN {
        return Err(AppError::ValidationError(format!(
            "city exceeds maximum length of {} characters",
            MAX_CITY_LEN
        )));
    }
    if city.chars().any(char::is_control) {
        return Err(AppError::ValidationError("city contains control characters".to_string()));
    }
    Ok(city.to_string())
}
