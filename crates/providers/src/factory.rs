//! Provider construction from configuration.

use crate::openai_compat::OpenAiCompatProvider;
use ironloop_config::AppConfig;
use ironloop_core::error::ProviderError;
use ironloop_core::provider::Provider;
use std::sync::Arc;

/// The oracle selected by configuration, plus the model to ask it for.
pub struct ConfiguredProvider {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

/// Build the default provider from configuration.
///
/// Per-provider settings in `[providers.<name>]` take precedence over the
/// top-level `api_key` and `default_model`.
pub fn build_from_config(config: &AppConfig) -> Result<ConfiguredProvider, ProviderError> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone());

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .or_else(|| default_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}' has no api_url configured"
            ))
        })?;

    let api_key = match (name, api_key) {
        (_, Some(key)) => key,
        ("ollama", None) => "ollama".to_string(),
        (_, None) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for '{name}' (set IRONLOOP_API_KEY or providers.{name}.api_key)"
            )));
        }
    };

    let model = provider_config
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    tracing::debug!(provider = name, %base_url, %model, "Configured oracle provider");

    Ok(ConfiguredProvider {
        provider: Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
        model,
    })
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "gemini" => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        _ => None,
    }
}
