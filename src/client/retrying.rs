//! Retry layer over a model transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SleuthError;
use crate::provider::{ModelClient, ModelRequest, ModelResponse};
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

/// Retries transient failures of the wrapped client with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
    attempt_timeout: Option<Duration>,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            attempt_timeout: None,
        }
    }

    /// Bound each attempt; an expired attempt counts as a transient timeout.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RetryingClient<C> {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        self.policy
            .execute(move || async move {
                match self.attempt_timeout {
                    Some(limit) => with_timeout(limit, self.inner.send(request)).await,
                    None => self.inner.send(request).await,
                }
            })
            .await
    }
}
