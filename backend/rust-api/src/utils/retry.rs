use std::time::Duration;

/// Backoff schedule for outbound calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::single_attempt()
    }
}

impl RetryConfig {
    pub fn single_attempt() -> Self {
        Self::with_attempts(1)
    }

    pub fn with_attempts(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            jitter_max: Some(Duration::from_millis(50)),
        }
    }
}

/// Run `f` until it succeeds or `max_attempts` is used up, returning the last error.
pub async fn retry_async_with_config<F, Fut, T, E>(config: RetryConfig, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempts_left = config.max_attempts.max(1);
    let mut backoff = config.base_backoff;

    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                attempts_left = attempts_left.saturating_sub(1);
                if attempts_left == 0 {
                    return Err(e);
                }

                let wait = backoff + jitter(config.jitter_max);
                tracing::debug!(
                    "Attempt failed ({}), retrying in {:?}, {} attempt(s) left",
                    e,
                    wait,
                    attempts_left
                );
                tokio::time::sleep(wait).await;

                backoff = std::cmp::min(backoff * 2, config.max_backoff);
            }
        }
    }
}

fn jitter(jitter_max: Option<Duration>) -> Duration {
    match jitter_max {
        Some(max) if !max.is_zero() => {
            let max_ms = max.as_millis() as u64;
            Duration::from_millis(rand::random::<u64>() % (max_ms + 1))
        }
        _ => Duration::ZERO,
    }
}
