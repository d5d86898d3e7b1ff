//! Google Gemini backend (Generative Language `generateContent`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::IntelligenceConfig;
use crate::error::{IntelligenceError, IntelligenceResult};
use crate::intelligence::provider::{http_client, AiBackend, ProviderKind};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_TEMPERATURE: f32 = 0.2;
pub const GEMINI_MAX_OUTPUT_TOKENS: u32 = 512;

pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiBackend {
    pub fn from_config(config: &IntelligenceConfig) -> IntelligenceResult<Self> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            IntelligenceError::Config("GEMINI_API_KEY is required for Gemini".to_string())
        })?;

        Ok(Self {
            client: http_client(config)?,
            api_key,
            model: config.gemini_model_name().to_string(),
            base_url: config
                .gemini_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    system_instruction: GeminiContent<'a>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate
fn parse_completion(raw_body: &str) -> IntelligenceResult<String> {
    let body: GeminiResponse = serde_json::from_str(raw_body).map_err(|e| {
        IntelligenceError::provider("gemini", format!("Failed to parse response: {}", e))
    })?;
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(IntelligenceError::provider(
            "gemini",
            "Response contained no candidate text",
        ));
    }
    Ok(text)
}

#[async_trait]
impl AiBackend for GeminiBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, system_prompt: &str, user_message: &str) -> IntelligenceResult<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: user_message }],
            }],
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_prompt,
                }],
            },
            generation_config: GeminiGenerationConfig {
                temperature: GEMINI_TEMPERATURE,
                max_output_tokens: GEMINI_MAX_OUTPUT_TOKENS,
            },
        };

        tracing::debug!(model = %self.model, "Calling Gemini generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| IntelligenceError::provider("gemini", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| IntelligenceError::provider("gemini", format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %raw_body, "Gemini API error");
            return Err(IntelligenceError::provider(
                "gemini",
                format!("API request failed ({}): {}", status, raw_body),
            ));
        }

        parse_completion(&raw_body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config_for(base_url: &str) -> IntelligenceConfig {
        let mut config = IntelligenceConfig::default().with_gemini_key("g-key");
        config.gemini_base_url = Some(base_url.to_string());
        config
    }

    #[test]
    fn test_parse_completion_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"a"},{"text":"b"}]}}]}"#;
        assert_eq!(parse_completion(raw).unwrap(), "ab");
    }

    #[test]
    fn test_parse_completion_rejects_empty() {
        assert!(parse_completion(r#"{"candidates":[]}"#).is_err());
        assert!(parse_completion(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err());
        assert!(parse_completion("<html>").is_err());
    }

    #[test]
    fn test_endpoint_uses_model() {
        let backend = GeminiBackend::from_config(&config_for("https://example.test/v1beta/")).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
    }

    #[tokio::test]
    async fn test_complete_sends_structured_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-2.5-flash-lite:generateContent")
                    .header("x-goog-api-key", "g-key")
                    .json_body(json!({
                        "contents": [{"role": "user", "parts": [{"text": "what is low?"}]}],
                        "systemInstruction": {"parts": [{"text": "grounding"}]},
                        "generationConfig": {"temperature": 0.2, "maxOutputTokens": 512}
                    }));
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": "500016 is low"}]}}]
                }));
            })
            .await;

        let backend = GeminiBackend::from_config(&config_for(&server.base_url())).unwrap();
        let text = backend.complete("grounding", "what is low?").await.unwrap();
        assert_eq!(text, "500016 is low");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400)
                    .json_body(json!({"error": {"code": 400, "message": "API key not valid"}}));
            })
            .await;

        let backend = GeminiBackend::from_config(&config_for(&server.base_url())).unwrap();
        let err = backend.complete("grounding", "hi").await.unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }
}
