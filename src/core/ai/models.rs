use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat-v3.1:free".to_string(),
            // Classification wants the same answer for the same input.
            temperature: 0.0,
            max_tokens: Some(200),
        }
    }
}

/// Response from an AI provider.
///
/// Some models return their reasoning separately from the answer; the
/// classifier only ever reads `content`.
#[derive(Debug, Clone, Default)]
pub struct AiProviderResponse {
    /// The main response content from the model.
    pub content: String,

    /// Optional thinking/reasoning process from the model.
    pub thinking: Option<String>,
}
