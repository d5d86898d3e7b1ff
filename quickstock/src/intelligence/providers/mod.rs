//! Concrete [`AiBackend`](super::provider::AiBackend) implementations.

pub mod bedrock;
pub mod gemini;
pub mod mock;

pub use bedrock::BedrockBackend;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
