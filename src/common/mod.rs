//! Common infrastructure shared by the dashboard and the ingestion pipeline.
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`provider_registry`] - Central registry of weather provider instances
//! - [`security`] - Structural validation, threat detection, sanitization and audit trail
//!
//! # Architecture
//!
//! ```text
//! AppState
//!   ├── WeatherIngestion
//!   │   ├── ProviderRegistry (openweather, weatherapi, mock)
//!   │   └── Arc<AuditRecorder>
//!   └── Arc<MockService> (shared with the mock provider)
//! ```

pub mod config;
pub mod provider_registry;
pub mod security;
