use crate::core::ai::{AiConfig, AiMessage, AiProvider, AiProviderResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::error::Error;
use std::time::Duration;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key })
    }

    /// Pull the answer and any reasoning out of a chat completion payload.
    fn extract_response(
        response_json: &serde_json::Value,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let message = &response_json["choices"][0]["message"];

        let content = message["content"]
            .as_str()
            .ok_or("Failed to parse response content")?
            .to_string();
        let thinking = message["reasoning"].as_str().map(|s| s.to_string());

        Ok(AiProviderResponse { content, thinking })
    }
}

#[async_trait]
impl AiProvider for OpenRouterClient {
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<AiProviderResponse, Box<dyn Error + Send + Sync>> {
        let payload = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(OPENROUTER_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            return Err(format!("OpenRouter API error: {} - {}", status, text).into());
        }

        let response_json: serde_json::Value = response.json().await?;
        Self::extract_response(&response_json)
    }
}
