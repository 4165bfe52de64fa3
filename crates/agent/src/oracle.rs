//! The reasoning oracle as the loop sees it: prompt in, text out.

use ironloop_core::error::ProviderError;
use ironloop_core::provider::{Provider, ProviderRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Wraps a [`Provider`] with the model, sampling settings and the per-call
/// timeout used by every oracle call in a run.
pub struct Oracle {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
    request_delay: Duration,
}

impl Oracle {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(10),
            request_delay: Duration::ZERO,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the timeout applied to each call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause before each call, for rate-limited endpoints.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask for one completion. The reply is trimmed.
    ///
    /// A call that outlives the timeout fails with [`ProviderError::Timeout`].
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let request = ProviderRequest::prompt(&self.model, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            prompt_len = prompt.len(),
            "Calling oracle"
        );

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Ok(response.message.content.trim().to_string()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProviderError::Timeout(format!(
                "no reply within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
