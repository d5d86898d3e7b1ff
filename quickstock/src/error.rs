//! Error types shared by the intelligence pipeline and the gateway.

use thiserror::Error;

pub type IntelligenceResult<T> = Result<T, IntelligenceError>;

/// Errors that can occur while answering an intelligence request
#[derive(Debug, Error)]
pub enum IntelligenceError {
    /// The upstream AI service failed (network, auth or malformed response)
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// A required request field is missing or empty
    #[error("Validation error: {0}")]
    Validation(String),

    /// The live context snapshot could not be produced
    #[error("Context error: {0}")]
    Context(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntelligenceError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        IntelligenceError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, IntelligenceError::Validation(_))
    }
}
