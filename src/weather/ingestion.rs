//! Fetch, validate, audit and publish weather for one dashboard session.
//!
//! ```text
//! fetch_weather(city, api)
//!   ├── sequence = next()
//!   ├── try_join!(fetch_current, fetch_forecast)   under timeout, timed
//!   ├── validate_structure ── fail ──> error entry
//!   ├── RawObservation::audit ──> success | warning entry
//!   ├── AuditRecorder::append  (exactly once)
//!   └── apply to DisplayState if no later fetch has started
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::common::provider_registry::ProviderRegistry;
use crate::common::security::{
    timed, validate_structure, with_timeout, AuditEntry, AuditEntryDraft, AuditRecorder,
    StructuralError,
};
use crate::weather::observation::RawObservation;
use crate::weather::{ApiSource, FetchError, ForecastDay, ProviderPayload, WeatherRecord};

/// Per-call timeout applied when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// What the dashboard currently shows.
///
/// On failure the previous record stays visible next to the error banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayState {
    pub city: Option<String>,
    pub api_source: Option<ApiSource>,
    pub record: Option<WeatherRecord>,
    pub forecast: Vec<ForecastDay>,
    pub loading: bool,
    pub error: Option<String>,
    /// Sequence number of the fetch whose outcome is shown, 0 before the first
    pub sequence: u64,
}

/// Result of one `fetch_weather` call
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub sequence: u64,
    /// A later fetch started before this one finished; not applied to the display
    pub superseded: bool,
    pub record: Option<WeatherRecord>,
    pub forecast: Vec<ForecastDay>,
    pub audit_entry: AuditEntry,
    pub error: Option<FetchError>,
}

/// Current conditions from every provider; `None` means unavailable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderComparison {
    pub openweather: Option<WeatherRecord>,
    pub weatherapi: Option<WeatherRecord>,
    pub mock: Option<WeatherRecord>,
}

impl ProviderComparison {
    pub fn available(&self) -> usize {
        [&self.openweather, &self.weatherapi, &self.mock]
            .iter()
            .filter(|r| r.is_some())
            .count()
    }
}

pub struct WeatherIngestion {
    registry: ProviderRegistry,
    audit: Arc<AuditRecorder>,
    fetch_timeout: Duration,
    latest_sequence: AtomicU64,
    display: watch::Sender<DisplayState>,
}

impl WeatherIngestion {
    pub fn new(registry: ProviderRegistry, audit: Arc<AuditRecorder>, fetch_timeout: Duration) -> Self {
        let (display, _) = watch::channel(DisplayState::default());
        Self {
            registry,
            audit,
            fetch_timeout,
            latest_sequence: AtomicU64::new(0),
            display,
        }
    }

    pub fn audit(&self) -> &Arc<AuditRecorder> {
        &self.audit
    }

    /// Receive every display state change
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.display.subscribe()
    }

    pub fn display_state(&self) -> DisplayState {
        self.display.borrow().clone()
    }

    /// Fetch current conditions and forecast for `city` from `api`.
    ///
    /// Appends exactly one audit entry, whatever the outcome.
    pub async fn fetch_weather(&self, city: &str, api: ApiSource) -> FetchOutcome {
        let sequence = self.latest_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.display.send_modify(|state| {
            state.loading = true;
        });

        tracing::info!(city = %city, api = %api, sequence, "Fetching weather");

        let provider = self.registry.get(api);
        let timeout = self.fetch_timeout;
        let (fetched, latency_ms) = timed(|| async {
            tokio::try_join!(
                with_timeout("fetch_current", timeout, || provider.fetch_current(city)),
                with_timeout("fetch_forecast", timeout, || provider.fetch_forecast(city)),
            )
        })
        .await;

        let (draft, record, forecast, error) = match fetched {
            Ok((payload, forecast)) => match inspect_payload(&payload, city) {
                Ok((record, threats)) if threats.is_empty() => (
                    AuditEntryDraft::success(api, format!("Data loaded successfully from {}", api), latency_ms),
                    Some(record),
                    forecast,
                    None,
                ),
                Ok((record, threats)) => (
                    AuditEntryDraft::warning(
                        api,
                        format!("Data loaded from {} with {} threat(s) detected", api, threats.len()),
                        latency_ms,
                        threats,
                    ),
                    Some(record),
                    forecast,
                    None,
                ),
                Err(structural) => {
                    let err = FetchError::from(structural);
                    (
                        AuditEntryDraft::error(api, failure_message(api, &err), latency_ms),
                        None,
                        Vec::new(),
                        Some(err),
                    )
                }
            },
            Err(err) => (
                AuditEntryDraft::error(api, failure_message(api, &err), latency_ms),
                None,
                Vec::new(),
                Some(err),
            ),
        };

        let audit_entry = self.audit.append(draft);
        let applied = self.apply(sequence, city, api, record.as_ref(), &forecast, error.as_ref());

        if !applied {
            tracing::debug!(sequence, city = %city, "Superseded fetch not applied to display");
        }

        FetchOutcome {
            sequence,
            superseded: !applied,
            record,
            forecast,
            audit_entry,
            error,
        }
    }

    /// Publish an outcome unless a later fetch has started since.
    ///
    /// The check runs under the watch channel's lock, so outcomes are
    /// applied in sequence order.
    fn apply(
        &self,
        sequence: u64,
        city: &str,
        api: ApiSource,
        record: Option<&WeatherRecord>,
        forecast: &[ForecastDay],
        error: Option<&FetchError>,
    ) -> bool {
        self.display.send_if_modified(|state| {
            if self.latest_sequence.load(Ordering::SeqCst) != sequence || state.sequence >= sequence {
                return false;
            }

            state.sequence = sequence;
            state.loading = false;
            state.city = Some(city.to_string());
            state.api_source = Some(api);
            match (record, error) {
                (Some(record), _) => {
                    state.record = Some(record.clone());
                    state.forecast = forecast.to_vec();
                    state.error = None;
                }
                (None, Some(err)) => state.error = Some(err.to_string()),
                (None, None) => {}
            }
            true
        })
    }

    /// Current conditions from all providers at once.
    ///
    /// Failures are isolated per provider. Comparison fetches are logged but
    /// never written to the audit trail.
    pub async fn compare_providers(&self, city: &str) -> ProviderComparison {
        let (openweather, weatherapi, mock) = tokio::join!(
            self.current_record(ApiSource::OpenWeather, city),
            self.current_record(ApiSource::WeatherApi, city),
            self.current_record(ApiSource::Mock, city),
        );

        let comparison = ProviderComparison {
            openweather,
            weatherapi,
            mock,
        };
        tracing::info!(city = %city, available = comparison.available(), "Provider comparison finished");
        comparison
    }

    async fn current_record(&self, api: ApiSource, city: &str) -> Option<WeatherRecord> {
        let provider = self.registry.get(api);
        let result = with_timeout("compare_current", self.fetch_timeout, || provider.fetch_current(city))
            .await
            .and_then(|payload| inspect_payload(&payload, city).map_err(FetchError::from));

        match result {
            Ok((record, threats)) => {
                if !threats.is_empty() {
                    tracing::warn!(api = %api, threats = ?threats, "Threats in comparison response");
                }
                Some(record)
            }
            Err(err) => {
                tracing::warn!(api = %api, error = %err, "Provider unavailable for comparison");
                None
            }
        }
    }
}

/// Validate a payload against its declared source, then audit and build the record
fn inspect_payload(payload: &ProviderPayload, city: &str) -> Result<(WeatherRecord, Vec<String>), StructuralError> {
    let validated = validate_structure(&payload.body, payload.source)?;
    let observation = RawObservation::from_validated(validated)?;
    let threats = observation.audit();
    Ok((observation.build_record(city), threats))
}

/// Audit message for a failed fetch; structural and network failures read differently
fn failure_message(api: ApiSource, err: &FetchError) -> String {
    match err {
        FetchError::Structural(structural) => {
            format!("Structural validation failed ({}): {}", api, structural.missing)
        }
        other => format!("Network error ({}): {}", api, other),
    }
}
