use std::sync::Arc;

use crate::common::config::Config;
use crate::mock::MockService;
use crate::weather::providers::{
    BackendClient, MockProvider, OpenWeatherProvider, WeatherApiProvider, WeatherProvider,
};
use crate::weather::{ApiSource, FetchError};

/// Central registry of the weather providers a session can select.
///
/// Providers are shared; cloning the registry only clones the handles.
#[derive(Clone)]
pub struct ProviderRegistry {
    pub openweather: Arc<dyn WeatherProvider>,
    pub weatherapi: Arc<dyn WeatherProvider>,
    pub mock: Arc<dyn WeatherProvider>,
}

impl ProviderRegistry {
    /// Creates a ProviderRegistry with all providers initialized.
    ///
    /// # Arguments
    /// * `config` - Backend URL, timeout and mock attack selection
    /// * `mock_service` - Mock backend shared with the mock HTTP route
    pub fn new(config: &Config, mock_service: Arc<MockService>) -> Result<Self, FetchError> {
        let backend = BackendClient::new(config.backend_url.clone(), config.fetch_timeout)?;

        Ok(Self {
            // Real providers share one connection pool
            openweather: Arc::new(OpenWeatherProvider::new(backend.clone())),
            weatherapi: Arc::new(WeatherApiProvider::new(backend)),

            mock: Arc::new(MockProvider::new(mock_service, config.mock_attack)),
        })
    }

    /// Assemble a registry from existing providers
    pub fn from_providers(
        openweather: Arc<dyn WeatherProvider>,
        weatherapi: Arc<dyn WeatherProvider>,
        mock: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            openweather,
            weatherapi,
            mock,
        }
    }

    pub fn get(&self, api: ApiSource) -> &Arc<dyn WeatherProvider> {
        match api {
            ApiSource::OpenWeather => &self.openweather,
            ApiSource::WeatherApi => &self.weatherapi,
            ApiSource::Mock => &self.mock,
        }
    }
}
