//! Model provider implementations for HubPilot.
//!
//! All providers implement the `hubpilot_core::Provider` trait.
//! [`build_from_config`] selects and constructs the configured one.

pub mod anthropic;

use std::sync::Arc;
use std::time::Duration;

use hubpilot_config::AppConfig;
use hubpilot_core::Provider;
use hubpilot_core::error::ProviderError;
use tracing::info;

pub use anthropic::AnthropicProvider;

/// Construct the provider named in `[model]`.
///
/// Fails with [`ProviderError::NotConfigured`] when the credential is
/// missing or the provider name is unknown.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let model = &config.model;
    match model.provider.as_str() {
        "anthropic" => {
            let api_key = model.api_key.as_deref().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "No API key configured. Set HUBPILOT_API_KEY or ANTHROPIC_API_KEY, or add api_key to [model] in config.toml".into(),
                )
            })?;

            let mut provider = AnthropicProvider::new(api_key)?
                .with_timeout(Duration::from_secs(model.request_timeout_secs))?;
            if let Some(base_url) = &model.base_url {
                provider = provider.with_base_url(base_url);
            }

            info!(provider = "anthropic", model = %model.model, "Provider configured");
            Ok(Arc::new(provider))
        }
        other => Err(ProviderError::NotConfigured(format!(
            "Unknown provider '{other}'"
        ))),
    }
}
