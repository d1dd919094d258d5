//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::SleuthError;

/// Wrap a future with a timeout, surfacing expiry as [`SleuthError::Timeout`].
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, SleuthError>>,
) -> Result<T, SleuthError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(SleuthError::Timeout(duration.as_millis() as u64)),
    }
}
