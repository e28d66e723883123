//! Client-side request quota

use crate::{CompletionRequest, CompletionResponse, ModelError, ModelProvider, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

/// Wraps a provider with a requests-per-minute quota
///
/// The quota is checked, never awaited: once it is exhausted calls fail
/// immediately with [`ModelError::RateLimited`] so the caller can degrade.
pub struct RateLimitedProvider {
    inner: Arc<dyn ModelProvider>,
    limiter: DefaultDirectRateLimiter,
    requests_per_minute: NonZeroU32,
}

impl RateLimitedProvider {
    pub fn per_minute(inner: Arc<dyn ModelProvider>, requests_per_minute: u32) -> Result<Self> {
        let requests_per_minute = NonZeroU32::new(requests_per_minute).ok_or_else(|| {
            ModelError::ConfigurationError("requests_per_minute must be greater than 0".to_string())
        })?;
        Ok(Self {
            inner,
            limiter: RateLimiter::direct(Quota::per_minute(requests_per_minute)),
            requests_per_minute,
        })
    }
}

#[async_trait]
impl ModelProvider for RateLimitedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if self.limiter.check().is_err() {
            warn!(
                provider = self.inner.name(),
                purpose = request.purpose(),
                "Local model quota exhausted"
            );
            return Err(ModelError::RateLimited(format!(
                "more than {} requests per minute",
                self.requests_per_minute
            )));
        }
        self.inner.complete(request).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedProvider;

    #[tokio::test]
    async fn test_quota_exhaustion_is_rate_limited() {
        let inner = Arc::new(ScriptedProvider::new().otherwise_text("ok"));
        let provider = RateLimitedProvider::per_minute(inner, 1).unwrap();

        let request = CompletionRequest::builder("m").build();
        assert!(provider.complete(request.clone()).await.is_ok());

        let err = provider.complete(request).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let inner = Arc::new(ScriptedProvider::new());
        assert!(RateLimitedProvider::per_minute(inner, 0).is_err());
    }
}
