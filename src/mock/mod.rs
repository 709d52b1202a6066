//! Adversarial weather provider.
//!
//! Serves the hostile payloads from [`attacks`] behind the rolling limiter
//! from [`rate_window`]. One [`MockService`] is shared by the in-process mock
//! provider and the `/api/mock/malicious` route so both draw from the same
//! request budget.

pub mod attacks;
pub mod rate_window;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::weather::providers::forecast_day_label;
use crate::weather::{ForecastDay, FORECAST_DAYS};

pub use attacks::AttackVector;
pub use rate_window::{advance_window, Admission, RateWindow, WindowState};

/// Body returned once the request budget is spent
pub const RATE_LIMIT_MESSAGE: &str = "Too Many Requests - Rate limit exceeded";

/// Pause applied by the `delay` attack
pub const DELAY_ATTACK_DURATION: Duration = Duration::from_secs(5);

/// Status and JSON body of one mock response
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: u16,
    pub body: Value,
}

impl MockResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct MockService {
    limiter: Mutex<RateWindow>,
    rng: Mutex<StdRng>,
    delay: Duration,
}

impl MockService {
    pub fn new(rate_limit: u32, rate_window: Duration) -> Self {
        Self::with_rng(rate_limit, rate_window, StdRng::from_entropy())
    }

    /// Deterministic variant for tests
    pub fn seeded(rate_limit: u32, rate_window: Duration, seed: u64) -> Self {
        Self::with_rng(rate_limit, rate_window, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rate_limit: u32, rate_window: Duration, rng: StdRng) -> Self {
        Self {
            limiter: Mutex::new(RateWindow::new(rate_limit, rate_window)),
            rng: Mutex::new(rng),
            delay: DELAY_ATTACK_DURATION,
        }
    }

    /// Override the pause used by the `delay` attack
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Serve one request for `attack`, counting it against the window first
    pub async fn respond(&self, attack: AttackVector) -> MockResponse {
        let admission = self
            .limiter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .admit(Instant::now());

        if let Admission::Limited { .. } = admission {
            return MockResponse {
                status: 429,
                body: attacks::error_body(RATE_LIMIT_MESSAGE),
            };
        }

        let attack = match attack {
            AttackVector::Random => self.pick(&AttackVector::RANDOM_POOL),
            other => other,
        };
        tracing::debug!(attack = %attack, "Serving mock attack");

        match attack {
            AttackVector::Xss => MockResponse::ok(attacks::xss_payload()),
            AttackVector::Overflow => MockResponse::ok(attacks::overflow_payload()),
            AttackVector::TypeConfusion => MockResponse::ok(attacks::type_confusion_payload()),
            AttackVector::Incomplete => MockResponse::ok(attacks::incomplete_payload()),
            AttackVector::Mixed => MockResponse::ok(attacks::mixed_payload()),
            AttackVector::Delay => {
                tokio::time::sleep(self.delay).await;
                MockResponse::ok(attacks::delayed_payload())
            }
            AttackVector::Error | AttackVector::Random => {
                let (status, message) = self.pick(&attacks::ERROR_RESPONSES);
                MockResponse {
                    status,
                    body: attacks::error_body(message),
                }
            }
        }
    }

    /// Synthesized forecast starting at `today`
    pub fn forecast(&self, today: NaiveDate) -> Vec<ForecastDay> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        (0..FORECAST_DAYS as u64)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .map(|date| ForecastDay {
                date: forecast_day_label(date),
                temp_max: rng.gen_range(20.0..30.0),
                temp_min: rng.gen_range(10.0..15.0),
            })
            .collect()
    }

    fn pick<T: Copy>(&self, options: &[T]) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        // Callers only pass the non-empty constant tables
        *options.choose(&mut *rng).unwrap_or(&options[0])
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new(rate_window::DEFAULT_RATE_LIMIT, rate_window::DEFAULT_RATE_WINDOW)
    }
}
