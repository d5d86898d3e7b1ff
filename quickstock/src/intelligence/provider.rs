//! AI provider abstraction
//!
//! Provider selection is a pure function of [`IntelligenceConfig`]; the query
//! never influences which backend answers. Each [`ProviderKind`] has exactly
//! one [`AiBackend`] implementation under [`super::providers`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::providers::{BedrockBackend, GeminiBackend, MockBackend};
use crate::config::IntelligenceConfig;
use crate::error::{IntelligenceError, IntelligenceResult};

/// Supported AI backends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// AWS Bedrock (production)
    #[serde(rename = "AWS Bedrock")]
    Bedrock,
    /// Google Gemini (development fallback)
    #[serde(rename = "Google Gemini")]
    Gemini,
    /// No credentials configured
    #[serde(rename = "Mock")]
    Mock,
}

impl ProviderKind {
    /// Name reported to clients as `provider_used`
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "AWS Bedrock",
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::Mock => "Mock",
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "bedrock",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Pick the backend for this configuration. First match wins:
/// AWS credential pair, then Gemini key, then mock.
pub fn select_provider(config: &IntelligenceConfig) -> ProviderKind {
    if config.aws_credentials().is_some() {
        ProviderKind::Bedrock
    } else if config.gemini_api_key.is_some() {
        ProviderKind::Gemini
    } else {
        ProviderKind::Mock
    }
}

/// Text produced by a backend, tagged with who produced it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiResponse {
    pub text: String,
    pub provider: ProviderKind,
}

/// One implementation per [`ProviderKind`]
#[async_trait]
pub trait AiBackend: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Single completion attempt. No retries.
    async fn complete(&self, system_prompt: &str, user_message: &str) -> IntelligenceResult<String>;
}

/// Call `backend` once and tag the result with its provider
pub async fn invoke(
    backend: &dyn AiBackend,
    system_prompt: &str,
    user_message: &str,
) -> IntelligenceResult<AiResponse> {
    let provider = backend.kind();
    tracing::info!(provider = provider.tag(), "Using AI provider");

    let text = backend
        .complete(system_prompt, user_message)
        .await
        .map_err(|e| {
            tracing::error!(provider = provider.tag(), error = %e, "AI provider call failed");
            e
        })?;

    Ok(AiResponse { text, provider })
}

/// Build the backend selected by [`select_provider`]
pub fn build_backend(config: &IntelligenceConfig) -> IntelligenceResult<Arc<dyn AiBackend>> {
    match select_provider(config) {
        ProviderKind::Bedrock => Ok(Arc::new(BedrockBackend::from_config(config)?)),
        ProviderKind::Gemini => Ok(Arc::new(GeminiBackend::from_config(config)?)),
        ProviderKind::Mock => {
            tracing::warn!(
                "No AI credentials configured; set AWS_ACCESS_KEY_ID + AWS_SECRET_ACCESS_KEY or GEMINI_API_KEY for real responses"
            );
            Ok(Arc::new(MockBackend))
        }
    }
}

/// HTTP client shared by the remote backends
pub(crate) fn http_client(config: &IntelligenceConfig) -> IntelligenceResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_seconds {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| IntelligenceError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bedrock_wins_when_both_configured() {
        let config = IntelligenceConfig::default()
            .with_aws_credentials("AKID", "secret")
            .with_gemini_key("g-key");
        assert_eq!(select_provider(&config), ProviderKind::Bedrock);
    }

    #[test]
    fn test_half_aws_pair_falls_through() {
        let mut config = IntelligenceConfig::default().with_gemini_key("g-key");
        config.aws_access_key_id = Some("AKID".to_string());
        assert_eq!(select_provider(&config), ProviderKind::Gemini);

        config.gemini_api_key = None;
        assert_eq!(select_provider(&config), ProviderKind::Mock);
    }

    #[test]
    fn test_selection_ignores_unrelated_settings() {
        let mut config = IntelligenceConfig::default();
        config.bedrock_model_id = Some("anthropic.claude-3-haiku-20240307-v1:0".to_string());
        config.gemini_model = Some("gemini-pro".to_string());
        assert_eq!(select_provider(&config), ProviderKind::Mock);
    }

    #[test]
    fn test_provider_kind_serializes_display_name() {
        assert_eq!(
            serde_json::to_value(ProviderKind::Bedrock).unwrap(),
            serde_json::json!("AWS Bedrock")
        );
        assert_eq!(
            serde_json::to_value(ProviderKind::Gemini).unwrap(),
            serde_json::json!("Google Gemini")
        );
        assert_eq!(ProviderKind::Mock.to_string(), "Mock");
    }

    #[tokio::test]
    async fn test_factory_builds_selected_backend() {
        let config = IntelligenceConfig::default();
        assert_eq!(build_backend(&config).unwrap().kind(), ProviderKind::Mock);

        let config = config.with_gemini_key("g-key");
        assert_eq!(build_backend(&config).unwrap().kind(), ProviderKind::Gemini);

        let config = config.with_aws_credentials("AKID", "secret");
        assert_eq!(build_backend(&config).unwrap().kind(), ProviderKind::Bedrock);
    }

    #[tokio::test]
    async fn test_invoke_mock_never_fails() {
        for query in ["", "forecast tomatoes", "ünïcödé ✓"] {
            let response = invoke(&MockBackend, "system", query).await.unwrap();
            assert_eq!(response.provider, ProviderKind::Mock);
            assert!(response.text.contains(query));
        }
    }
}
