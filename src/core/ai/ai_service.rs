// Port for a chat-completion backend, used by the AI severity classifier.

use super::models::{AiConfig, AiMessage, AiProviderResponse};
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request to the AI provider.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>>;
}
