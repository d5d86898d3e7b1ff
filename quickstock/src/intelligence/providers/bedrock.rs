//! AWS Bedrock runtime backend (Anthropic messages payload, SigV4-signed).

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{AwsCredentials, IntelligenceConfig};
use crate::error::{IntelligenceError, IntelligenceResult};
use crate::intelligence::provider::{http_client, AiBackend, ProviderKind};
use crate::intelligence::sigv4::{encode_segment, sign_json_post};

pub const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";
pub const BEDROCK_MAX_TOKENS: u32 = 1000;
const SIGNING_SERVICE: &str = "bedrock";

pub struct BedrockBackend {
    client: reqwest::Client,
    credentials: AwsCredentials,
    region: String,
    model_id: String,
    base_url: reqwest::Url,
}

impl BedrockBackend {
    pub fn from_config(config: &IntelligenceConfig) -> IntelligenceResult<Self> {
        let credentials = config.aws_credentials().ok_or_else(|| {
            IntelligenceError::Config(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY are required for Bedrock".to_string(),
            )
        })?;
        let base_url = reqwest::Url::parse(&config.bedrock_base_url()).map_err(|e| {
            IntelligenceError::Config(format!("Invalid Bedrock endpoint: {}", e))
        })?;

        Ok(Self {
            client: http_client(config)?,
            credentials,
            region: config.region().to_string(),
            model_id: config.bedrock_model().to_string(),
            base_url,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn host(&self) -> IntelligenceResult<String> {
        let host = self.base_url.host_str().ok_or_else(|| {
            IntelligenceError::Config("Bedrock endpoint has no host".to_string())
        })?;
        Ok(match self.base_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    fn request_path(&self) -> String {
        format!(
            "{}/model/{}/invoke",
            self.base_url.path().trim_end_matches('/'),
            encode_segment(&self.model_id)
        )
    }
}

#[derive(Serialize)]
struct BedrockRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<BedrockMessage<'a>>,
}

#[derive(Serialize)]
struct BedrockMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct BedrockResponse {
    #[serde(default)]
    content: Vec<BedrockContent>,
}

#[derive(Deserialize)]
struct BedrockContent {
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first content block of an Anthropic messages response
fn parse_completion(raw_body: &str) -> IntelligenceResult<String> {
    let body: BedrockResponse = serde_json::from_str(raw_body).map_err(|e| {
        IntelligenceError::provider("bedrock", format!("Failed to parse response: {}", e))
    })?;
    body.content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| IntelligenceError::provider("bedrock", "Response missing text content"))
}

#[async_trait]
impl AiBackend for BedrockBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bedrock
    }

    async fn complete(&self, system_prompt: &str, user_message: &str) -> IntelligenceResult<String> {
        let payload = BedrockRequest {
            anthropic_version: ANTHROPIC_BEDROCK_VERSION,
            max_tokens: BEDROCK_MAX_TOKENS,
            system: system_prompt,
            messages: vec![BedrockMessage {
                role: "user",
                content: user_message,
            }],
        };
        let body = serde_json::to_vec(&payload)?;

        let path = self.request_path();
        let signed = sign_json_post(
            &self.credentials,
            &self.region,
            SIGNING_SERVICE,
            &self.host()?,
            &path,
            &body,
            Utc::now(),
        )?;
        let url = format!("{}{}", self.base_url.origin().ascii_serialization(), path);

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.session_token {
            request = request.header("x-amz-security-token", token);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| IntelligenceError::provider("bedrock", format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|e| IntelligenceError::provider("bedrock", format!("Failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(IntelligenceError::provider(
                "bedrock",
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
        let mut config = IntelligenceConfig::default().with_aws_credentials("AKIDEXAMPLE", "secret");
        config.bedrock_endpoint = Some(base_url.to_string());
        config
    }

    #[test]
    fn test_parse_completion_first_block() {
        let text = parse_completion(r#"{"content":[{"type":"text","text":"first"},{"type":"text","text":"second"}]}"#)
            .unwrap();
        assert_eq!(text, "first");
    }

    #[test]
    fn test_parse_completion_rejects_malformed() {
        assert!(parse_completion("not json").is_err());
        assert!(parse_completion(r#"{"content":[]}"#).is_err());
        assert!(parse_completion(r#"{}"#).is_err());
    }

    #[test]
    fn test_request_path_encodes_model_id() {
        let backend = BedrockBackend::from_config(&config_for("https://bedrock-runtime.ap-south-1.amazonaws.com")).unwrap();
        assert_eq!(
            backend.request_path(),
            "/model/anthropic.claude-3-sonnet-20240229-v1%3A0/invoke"
        );
        assert_eq!(backend.host().unwrap(), "bedrock-runtime.ap-south-1.amazonaws.com");
    }

    #[test]
    fn test_requires_credentials() {
        let config = IntelligenceConfig::default();
        assert!(matches!(
            BedrockBackend::from_config(&config),
            Err(IntelligenceError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_sends_signed_messages_payload() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path_includes("/model/anthropic.claude-3-sonnet-20240229-v1")
                    .path_includes("/invoke")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "anthropic_version": "bedrock-2023-05-31",
                        "max_tokens": 1000,
                        "system": "grounding",
                        "messages": [{"role": "user", "content": "restock?"}]
                    }));
                then.status(200)
                    .json_body(json!({"content": [{"type": "text", "text": "- Restock 500016"}]}));
            })
            .await;

        let backend = BedrockBackend::from_config(&config_for(&server.base_url())).unwrap();
        let text = backend.complete("grounding", "restock?").await.unwrap();
        assert_eq!(text, "- Restock 500016");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_surfaces_auth_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(403)
                    .json_body(json!({"message": "The security token included in the request is invalid."}));
            })
            .await;

        let backend = BedrockBackend::from_config(&config_for(&server.base_url())).unwrap();
        let err = backend.complete("grounding", "restock?").await.unwrap_err();
        assert!(matches!(err, IntelligenceError::Provider { .. }));
        assert!(err.to_string().contains("403"));
    }
}
