//! Reliability layers composed around a raw model transport.
//!
//! The stack is always `CachedClient<RetryingClient<T>>`: a cache hit never
//! reaches the retry loop, and every cache miss is retried as one unit.

pub mod cached;
pub mod retrying;

pub use cached::CachedClient;
pub use retrying::RetryingClient;

use std::sync::Arc;
use std::time::Duration;

use crate::provider::ModelClient;
use crate::util::cache::ResponseCache;
use crate::util::retry::RetryPolicy;

/// Compose a transport with retry and, when a cache is given, caching.
pub fn compose<T>(
    transport: T,
    policy: RetryPolicy,
    attempt_timeout: Option<Duration>,
    cache: Option<ResponseCache>,
) -> Arc<dyn ModelClient>
where
    T: ModelClient + 'static,
{
    let retrying = RetryingClient::new(transport, policy).with_attempt_timeout(attempt_timeout);
    match cache {
        Some(cache) => Arc::new(CachedClient::new(retrying, cache)),
        None => Arc::new(retrying),
    }
}
