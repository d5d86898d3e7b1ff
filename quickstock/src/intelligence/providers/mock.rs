use async_trait::async_trait;

use crate::error::IntelligenceResult;
use crate::intelligence::provider::{AiBackend, ProviderKind};

/// Used when no AI credentials are configured. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBackend;

impl MockBackend {
    pub fn response_for(user_message: &str) -> String {
        format!(
            "** Mock Response ** (No AI credentials configured) \n\nYour query: \"{}\"\n\nTo enable real AI responses, add to your `.env`:\n- `AWS_ACCESS_KEY_ID` + `AWS_SECRET_ACCESS_KEY` → uses AWS Bedrock\n- Or `GEMINI_API_KEY` → uses Google Gemini",
            user_message
        )
    }
}

#[async_trait]
impl AiBackend for MockBackend {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    async fn complete(&self, _system_prompt: &str, user_message: &str) -> IntelligenceResult<String> {
        Ok(Self::response_for(user_message))
    }
}
