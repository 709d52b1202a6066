//! Rolling request window for the mock endpoint.

use std::time::Duration;
use tokio::time::Instant;

/// Requests allowed per window unless configured otherwise
pub const DEFAULT_RATE_LIMIT: u32 = 10;

/// Default window length
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Counter state of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub window_start: Instant,
    pub count: u32,
}

/// Advance the window by one request.
///
/// When more than `window` has passed since `window_start` the counter
/// restarts at `now`. The request is always counted, including requests
/// that end up rejected.
pub fn advance_window(now: Instant, state: WindowState, window: Duration) -> WindowState {
    if now.saturating_duration_since(state.window_start) > window {
        WindowState {
            window_start: now,
            count: 1,
        }
    } else {
        WindowState {
            window_start: state.window_start,
            count: state.count.saturating_add(1),
        }
    }
}

/// Outcome of admitting a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { count: u32 },
    Limited { count: u32 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Stateful limiter built on [`advance_window`]
#[derive(Debug, Clone)]
pub struct RateWindow {
    state: WindowState,
    limit: u32,
    window: Duration,
}

impl RateWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            state: WindowState {
                window_start: Instant::now(),
                count: 0,
            },
            limit,
            window,
        }
    }

    /// Count a request arriving at `now` and decide whether it is served
    pub fn admit(&mut self, now: Instant) -> Admission {
        self.state = advance_window(now, self.state, self.window);
        let count = self.state.count;
        if count > self.limit {
            tracing::warn!(count, limit = self.limit, "Mock rate limit exceeded");
            Admission::Limited { count }
        } else {
            Admission::Allowed { count }
        }
    }

    pub fn state(&self) -> WindowState {
        self.state
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_within_window() {
        let start = Instant::now();
        let state = WindowState { window_start: start, count: 3 };
        let next = advance_window(start + Duration::from_secs(59), state, DEFAULT_RATE_WINDOW);
        assert_eq!(next.window_start, start);
        assert_eq!(next.count, 4);
    }

    #[test]
    fn test_advance_resets_after_window() {
        let start = Instant::now();
        let state = WindowState { window_start: start, count: 25 };
        let later = start + Duration::from_secs(61);
        let next = advance_window(later, state, DEFAULT_RATE_WINDOW);
        assert_eq!(next, WindowState { window_start: later, count: 1 });
    }

    #[test]
    fn test_exact_window_boundary_does_not_reset() {
        let start = Instant::now();
        let state = WindowState { window_start: start, count: 10 };
        let next = advance_window(start + DEFAULT_RATE_WINDOW, state, DEFAULT_RATE_WINDOW);
        assert_eq!(next.count, 11);
    }

    #[test]
    fn test_eleventh_request_is_limited() {
        let mut limiter = RateWindow::default();
        let now = Instant::now();
        for expected in 1..=10 {
            assert_eq!(limiter.admit(now), Admission::Allowed { count: expected });
        }
        assert_eq!(limiter.admit(now), Admission::Limited { count: 11 });
        // Rejected requests keep counting
        assert_eq!(limiter.admit(now), Admission::Limited { count: 12 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_recovers_after_expiry() {
        let mut limiter = RateWindow::new(2, Duration::from_secs(60));
        assert!(limiter.admit(Instant::now()).is_allowed());
        assert!(limiter.admit(Instant::now()).is_allowed());
        assert!(!limiter.admit(Instant::now()).is_allowed());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.admit(Instant::now()), Admission::Allowed { count: 1 });
    }
}
