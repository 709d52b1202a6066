/// Helpers for bounding and timing provider calls
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::weather::FetchError;

/// Run `f` and measure its wall-clock duration in milliseconds
pub async fn timed<F, Fut, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let start = Instant::now();
    let result = f().await;
    let latency_ms = start.elapsed().as_millis() as u64;
    (result, latency_ms)
}

/// Execute with timeout
pub async fn with_timeout<F, Fut, T>(
    operation_name: &str,
    timeout: Duration,
    f: F,
) -> Result<T, FetchError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(timeout, f()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation = %operation_name,
                timeout_secs = timeout.as_secs(),
                "Operation timed out"
            );
            Err(FetchError::Timeout(timeout.as_secs()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result: Result<(), FetchError> = with_timeout("slow", Duration::from_secs(10), || async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(FetchError::Timeout(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_passes_through() {
        let result = with_timeout("fast", Duration::from_secs(10), || async {
            Err::<(), _>(FetchError::Transport("refused".into()))
        })
        .await;
        assert_eq!(result, Err(FetchError::Transport("refused".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_measures_latency() {
        let (value, latency_ms) = timed(|| async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            7
        })
        .await;
        assert_eq!(value, 7);
        assert!(latency_ms >= 250);
    }
}
