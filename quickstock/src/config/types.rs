use serde::{Deserialize, Serialize};

pub const DEFAULT_AWS_REGION: &str = "ap-south-1";
pub const DEFAULT_BEDROCK_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Environment variable names read by [`IntelligenceConfig::from_env`]
pub mod env_keys {
    pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const BEDROCK_MODEL_ID: &str = "BEDROCK_MODEL_ID";
    pub const BEDROCK_ENDPOINT_URL: &str = "BEDROCK_ENDPOINT_URL";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const GEMINI_MODEL: &str = "GEMINI_MODEL";
    pub const GEMINI_BASE_URL: &str = "GEMINI_BASE_URL";
    pub const AI_TIMEOUT_SECS: &str = "QUICKSTOCK_AI_TIMEOUT_SECS";
}

/// AWS credential pair plus optional session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Immutable runtime configuration for the AI backends
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntelligenceConfig {
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    /// Region for Bedrock (defaults to Mumbai)
    pub aws_region: Option<String>,
    pub bedrock_model_id: Option<String>,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`
    pub bedrock_endpoint: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    /// Overrides the public Generative Language API base URL
    pub gemini_base_url: Option<String>,
    /// HTTP timeout for AI calls; the client default applies when unset
    pub request_timeout_seconds: Option<u64>,
}

impl IntelligenceConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty or whitespace-only values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            aws_access_key_id: get(env_keys::AWS_ACCESS_KEY_ID),
            aws_secret_access_key: get(env_keys::AWS_SECRET_ACCESS_KEY),
            aws_session_token: get(env_keys::AWS_SESSION_TOKEN),
            aws_region: get(env_keys::AWS_REGION),
            bedrock_model_id: get(env_keys::BEDROCK_MODEL_ID),
            bedrock_endpoint: get(env_keys::BEDROCK_ENDPOINT_URL),
            gemini_api_key: get(env_keys::GEMINI_API_KEY),
            gemini_model: get(env_keys::GEMINI_MODEL),
            gemini_base_url: get(env_keys::GEMINI_BASE_URL),
            request_timeout_seconds: get(env_keys::AI_TIMEOUT_SECS)
                .and_then(|v| v.parse::<u64>().ok()),
        }
    }

    /// Both halves of the AWS credential pair, if configured
    pub fn aws_credentials(&self) -> Option<AwsCredentials> {
        match (&self.aws_access_key_id, &self.aws_secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.aws_session_token.clone(),
            }),
            _ => None,
        }
    }

    pub fn region(&self) -> &str {
        self.aws_region.as_deref().unwrap_or(DEFAULT_AWS_REGION)
    }

    pub fn bedrock_model(&self) -> &str {
        self.bedrock_model_id
            .as_deref()
            .unwrap_or(DEFAULT_BEDROCK_MODEL_ID)
    }

    pub fn bedrock_base_url(&self) -> String {
        self.bedrock_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region()))
    }

    pub fn gemini_model_name(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL)
    }

    pub fn with_gemini_key(mut self, api_key: impl Into<String>) -> Self {
        self.gemini_api_key = Some(api_key.into());
        self
    }

    pub fn with_aws_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.aws_access_key_id = Some(access_key_id.into());
        self.aws_secret_access_key = Some(secret_access_key.into());
        self
    }
}
