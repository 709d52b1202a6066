//! Configuration module

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::common::security::DEFAULT_AUDIT_CAPACITY;
use crate::mock::rate_window::{DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW};
use crate::mock::AttackVector;
use crate::weather::ingestion::DEFAULT_FETCH_TIMEOUT;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the backend proxying both weather providers
    pub backend_url: String,

    /// Dashboard listen address
    pub bind_addr: SocketAddr,

    /// Timeout for each provider call
    pub fetch_timeout: Duration,

    /// Audit entries retained in memory (0 = unlimited)
    pub audit_capacity: usize,

    /// Attack served when the mock provider is selected
    pub mock_attack: AttackVector,

    /// Mock requests allowed per window
    pub mock_rate_limit: u32,

    pub mock_rate_window: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            backend_url: lookup("WEATHER_BACKEND_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.backend_url),

            bind_addr: parse_or(&lookup, "WEATHER_BIND_ADDR", defaults.bind_addr),

            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "WEATHER_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),

            audit_capacity: parse_or(&lookup, "WEATHER_AUDIT_CAPACITY", defaults.audit_capacity),

            mock_attack: parse_or(&lookup, "MOCK_ATTACK", defaults.mock_attack),

            mock_rate_limit: parse_or(&lookup, "MOCK_RATE_LIMIT", defaults.mock_rate_limit),

            mock_rate_window: Duration::from_secs(parse_or(
                &lookup,
                "MOCK_RATE_WINDOW_SECS",
                defaults.mock_rate_window.as_secs(),
            )),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key = %key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            mock_attack: AttackVector::Random,
            mock_rate_limit: DEFAULT_RATE_LIMIT,
            mock_rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}
