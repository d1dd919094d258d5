//! Cache layer over a model client.

use async_trait::async_trait;

use crate::error::SleuthError;
use crate::provider::{ModelClient, ModelRequest, ModelResponse};
use crate::util::cache::ResponseCache;

/// Serves repeated requests from a [`ResponseCache`].
///
/// A hit skips the wrapped client entirely. Only successful responses are
/// stored; a failed call leaves any previous entry untouched.
#[derive(Debug, Clone)]
pub struct CachedClient<C> {
    inner: C,
    cache: ResponseCache,
}

impl<C> CachedClient<C> {
    pub fn new(inner: C, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for CachedClient<C> {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        let key = request.cache_key()?;

        if let Some(raw) = self.cache.get(&key) {
            match serde_json::from_str::<ModelResponse>(&raw) {
                Ok(response) => {
                    tracing::debug!(key = %key, model = %request.model, "Response cache hit");
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Discarding unreadable cache entry");
                }
            }
        }

        let response = self.inner.send(request).await?;
        self.cache.insert(key, serde_json::to_string(&response)?);
        Ok(response)
    }
}
