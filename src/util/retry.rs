//! Retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::SleuthError;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Zero behaves as one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays; values below 1 are treated as 1.
    pub multiplier: f64,
    /// Scale each delay by a random factor in [0.5, 1.0).
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff: Duration::from_millis(1500),
            max_backoff: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Nominal delay before retry number `retry` (0-based), capped.
    pub fn nominal_delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let secs = (self.initial_backoff.as_secs_f64() * factor).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Nominal delays between every attempt the policy allows.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts.saturating_sub(1)).map(|retry| self.nominal_delay(retry))
    }

    /// Delay actually slept before retry number `retry` after `error`.
    ///
    /// A rate-limit hint from the server raises the delay but never past the cap.
    pub fn delay_for(&self, retry: u32, error: &SleuthError) -> Duration {
        let mut delay = self.nominal_delay(retry);
        if self.jitter {
            delay = Duration::from_secs_f64(delay.as_secs_f64() * (0.5 + rand_factor() * 0.5));
        }
        if let SleuthError::RateLimited {
            retry_after_ms: Some(ms),
        } = error
        {
            delay = delay.max(Duration::from_millis(*ms));
        }
        delay.min(self.max_backoff)
    }

    /// Execute an async operation with retry.
    ///
    /// Only errors for which [`SleuthError::is_retryable`] holds are retried;
    /// anything else is returned immediately. Successive sleeps never shrink
    /// and never exceed `max_backoff`.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, SleuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SleuthError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        let mut previous = Duration::ZERO;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    // Never wait less than last time, even after a long hint or jitter.
                    let delay = self
                        .delay_for(attempt - 1, &e)
                        .max(previous)
                        .min(self.max_backoff);
                    previous = delay;
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pseudo-random factor in [0, 1) from the clock and thread id.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    (hasher.finish() % 10_000) as f64 / 10_000.0
}
