/// HTTP tests for the dashboard API
/// Each test serves the router on an ephemeral port and talks to it with reqwest
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use weather_audit::common::provider_registry::ProviderRegistry;
use weather_audit::common::security::{AuditRecorder, SourceId};
use weather_audit::dashboard::{self, AppState};
use weather_audit::mock::{AttackVector, MockService};
use weather_audit::weather::providers::MockProvider;
use weather_audit::weather::{
    ApiSource, FetchError, ForecastDay, ProviderPayload, WeatherIngestion, WeatherProvider,
};

// ========== Test Server ==========

struct FixedProvider {
    api: ApiSource,
    current: Result<ProviderPayload, FetchError>,
}

#[async_trait]
impl WeatherProvider for FixedProvider {
    fn api_source(&self) -> ApiSource {
        self.api
    }

    fn name(&self) -> &'static str {
        "FixedProvider"
    }

    async fn fetch_current(&self, _city: &str) -> Result<ProviderPayload, FetchError> {
        self.current.clone()
    }

    async fn fetch_forecast(&self, _city: &str) -> Result<Vec<ForecastDay>, FetchError> {
        Ok(Vec::new())
    }
}

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    shutdown: CancellationToken,
}

impl TestServer {
    async fn start(mock_rate_limit: u32) -> Self {
        let openweather = FixedProvider {
            api: ApiSource::OpenWeather,
            current: Ok(ProviderPayload::new(
                SourceId::ProviderACurrent,
                json!({"message": {
                    "name": "Madrid",
                    "coord": {"lat": 40.42, "lon": -3.7},
                    "weather": [{"description": "cielo claro"}],
                    "main": {"temp": 24.0, "feels_like": 23.0, "temp_min": 20.0, "temp_max": 26.0, "humidity": 35, "pressure": 1016},
                    "wind": {"speed": 2.5}
                }}),
            )),
        };
        let weatherapi = FixedProvider {
            api: ApiSource::WeatherApi,
            current: Err(FetchError::Http {
                status: 502,
                reason: "Bad Gateway".into(),
            }),
        };

        let mock_service = Arc::new(MockService::seeded(mock_rate_limit, Duration::from_secs(60), 5));
        let mock: Arc<dyn WeatherProvider> = Arc::new(MockProvider::new(mock_service.clone(), AttackVector::Xss));

        let registry = ProviderRegistry::from_providers(Arc::new(openweather), Arc::new(weatherapi), mock);
        let ingestion = Arc::new(WeatherIngestion::new(
            registry,
            Arc::new(AuditRecorder::new(0)),
            Duration::from_secs(5),
        ));
        let state = AppState::new(ingestion, mock_service);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = CancellationToken::new();
        tokio::spawn(dashboard::serve(listener, state, shutdown.clone()));

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            shutdown,
        }
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

// ========== Health Tests ==========

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
}

// ========== Weather Search Tests ==========

#[tokio::test]
async fn test_weather_search_success() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/weather?city=Madrid&api=openweather").await;

    assert_eq!(status, 200);
    assert_eq!(body["record"]["city"], "Madrid");
    assert_eq!(body["record"]["wind"], 9.0);
    assert_eq!(body["auditEntry"]["status"], "success");
    assert_eq!(body["auditEntry"]["apiSource"], "openweather");
    assert!(body["error"].is_null());
}

#[tokio::test]
async fn test_weather_search_defaults_to_openweather() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/weather?city=Madrid").await;
    assert_eq!(status, 200);
    assert_eq!(body["auditEntry"]["apiSource"], "openweather");
}

#[tokio::test]
async fn test_weather_search_provider_failure_is_reported_in_body() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/weather?city=Madrid&api=weatherapi").await;

    assert_eq!(status, 200);
    assert!(body["record"].is_null());
    assert_eq!(body["error"], "HTTP error 502: Bad Gateway");
    assert_eq!(body["auditEntry"]["status"], "error");
    assert_eq!(body["auditEntry"]["message"], "Network error (weatherapi): HTTP error 502: Bad Gateway");
}

#[tokio::test]
async fn test_weather_search_rejects_bad_input() {
    let server = TestServer::start(10).await;

    let (status, body) = server.get("/api/weather").await;
    assert_eq!(status, 400);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "city is required");

    let (status, body) = server.get("/api/weather?city=Madrid&api=accuweather").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("accuweather"));

    let long_city = "a".repeat(101);
    let (status, _) = server.get(&format!("/api/weather?city={}", long_city)).await;
    assert_eq!(status, 400);

    let (_, audit) = server.get("/api/audit").await;
    assert_eq!(audit.as_array().unwrap().len(), 0, "rejected requests are not audited");
}

#[tokio::test]
async fn test_malformed_query_returns_json_error() {
    let server = TestServer::start(10).await;

    let response = server
        .client
        .get(format!("{}/api/audit?limit=abc", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/json"), "got {}", content_type);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("invalid digit"));
}

#[tokio::test]
async fn test_unknown_route_returns_json_not_found() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/forecast").await;
    assert_eq!(status, 404);
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "no route for /api/forecast");
}

#[tokio::test]
async fn test_mock_search_reports_threats() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/weather?city=Madrid&api=mock").await;

    assert_eq!(status, 200);
    assert_eq!(body["auditEntry"]["status"], "warning");
    assert!(body["auditEntry"]["threats"].as_array().unwrap().len() >= 3);
    assert_eq!(body["record"]["city"], "Madrid");
}

// ========== Audit Tests ==========

#[tokio::test]
async fn test_audit_log_newest_first_and_stats() {
    let server = TestServer::start(10).await;

    server.get("/api/weather?city=Madrid&api=openweather").await;
    server.get("/api/weather?city=Madrid&api=weatherapi").await;
    server.get("/api/weather?city=Madrid&api=mock").await;

    let (status, entries) = server.get("/api/audit").await;
    assert_eq!(status, 200);
    let entries = entries.as_array().unwrap().clone();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["apiSource"], "mock");
    assert_eq!(entries[2]["apiSource"], "openweather");

    let (_, limited) = server.get("/api/audit?limit=1").await;
    assert_eq!(limited.as_array().unwrap().len(), 1);

    let (status, stats) = server.get("/api/audit/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["successCount"], 1);
    assert_eq!(stats["warningCount"], 1);
    assert_eq!(stats["errorCount"], 1);
    assert_eq!(stats["threatCount"], 0);
}

#[tokio::test]
async fn test_dashboard_snapshot() {
    let server = TestServer::start(10).await;

    let (_, empty) = server.get("/api/dashboard").await;
    assert!(empty["state"]["record"].is_null());
    assert_eq!(empty["stats"]["total"], 0);
    assert_eq!(empty["stats"]["avgLatencyMs"], 0);

    server.get("/api/weather?city=Madrid&api=openweather").await;
    let (status, body) = server.get("/api/dashboard").await;
    assert_eq!(status, 200);
    assert_eq!(body["state"]["record"]["city"], "Madrid");
    assert_eq!(body["state"]["apiSource"], "openweather");
    assert_eq!(body["recentEntries"].as_array().unwrap().len(), 1);
}

// ========== Comparison Tests ==========

#[tokio::test]
async fn test_compare_providers() {
    let server = TestServer::start(10).await;
    let (status, body) = server.get("/api/compare?city=Madrid").await;

    assert_eq!(status, 200);
    assert_eq!(body["openweather"]["city"], "Madrid");
    assert!(body["weatherapi"].is_null());
    assert_eq!(body["mock"]["city"], "Madrid");

    let (_, audit) = server.get("/api/audit").await;
    assert!(audit.as_array().unwrap().is_empty());
}

// ========== Mock Endpoint Tests ==========

#[tokio::test]
async fn test_mock_endpoint_serves_attacks() {
    let server = TestServer::start(10).await;

    let (status, body) = server.get("/api/mock/malicious?attack=type-confusion").await;
    assert_eq!(status, 200);
    assert!(body["message"]["city"].is_array());

    let (status, body) = server.get("/api/mock/malicious?attack=mixed").await;
    assert_eq!(status, 200);
    assert_eq!(body["message"]["exploit"], "../../etc/passwd");
}

#[tokio::test]
async fn test_mock_endpoint_rate_limit_shared_with_provider() {
    let server = TestServer::start(3).await;

    server.get("/api/weather?city=Madrid&api=mock").await;
    server.get("/api/mock/malicious?attack=xss").await;
    let (status, _) = server.get("/api/mock/malicious?attack=xss").await;
    assert_eq!(status, 200);

    let (status, body) = server.get("/api/mock/malicious?attack=xss").await;
    assert_eq!(status, 429);
    assert_eq!(body["error"], "Too Many Requests - Rate limit exceeded");

    let (_, body) = server.get("/api/weather?city=Madrid&api=mock").await;
    assert_eq!(body["auditEntry"]["status"], "error");
}
