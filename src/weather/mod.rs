//! Weather domain: provider clients, record building and the ingestion pipeline.
//!
//! # Modules
//!
//! - [`types`] - Records, forecast days and provider identifiers
//! - [`error`] - Fetch failure taxonomy
//! - [`observation`] - Per-provider field mapping, field audit and record building
//! - [`providers`] - OpenWeather, WeatherAPI and mock clients
//! - [`ingestion`] - Fetch orchestration, audit append and display state

pub mod error;
pub mod ingestion;
pub mod observation;
pub mod providers;
pub mod types;

pub use error::FetchError;
pub use ingestion::{DisplayState, FetchOutcome, ProviderComparison, WeatherIngestion};
pub use observation::RawObservation;
pub use providers::WeatherProvider;
pub use types::{ApiSource, ForecastDay, ProviderPayload, WeatherRecord, FORECAST_DAYS};
