// LLM-backed severity classifier.
//
// Builds a prompt from the report, asks the provider for a JSON verdict and
// pulls the `severity` label out of whatever comes back.

use super::ai_service::AiProvider;
use super::models::{AiConfig, AiMessage};
use crate::core::moderation::{ClassifierError, Severity, SeverityClassifier, SeverityRequest};
use async_trait::async_trait;
use serde::Deserialize;

const SYSTEM_PROMPT: &str = "You are a content safety classifier for an online community. \
Given a user report, judge how severe the reported content is. \
Respond with JSON only, in the form {\"severity\": \"low|medium|high|urgent\", \"reasoning\": \"...\"}. \
Use \"urgent\" only for threats to someone's safety, self-harm, or exposure of a minor to harm.";

#[derive(Debug, Deserialize)]
struct SeverityVerdict {
    severity: String,
    #[serde(default)]
    #[allow(dead_code)]
    reasoning: Option<String>,
}

pub struct AiSeverityClassifier<P: AiProvider> {
    provider: P,
    config: AiConfig,
}

impl<P: AiProvider> AiSeverityClassifier<P> {
    pub fn new(provider: P, config: AiConfig) -> Self {
        Self { provider, config }
    }

    fn build_prompt(request: &SeverityRequest) -> String {
        format!(
            "Report type: {}\nContent id: {}\nReporter description:\n{}",
            request.report_type, request.content_id, request.description
        )
    }

    /// Extract the severity from a model response. Models like to wrap JSON
    /// in code fences or prose, so only the outermost `{...}` is parsed.
    pub fn parse_severity(content: &str) -> Result<Severity, ClassifierError> {
        let start = content.find('{');
        let end = content.rfind('}');
        let json = match (start, end) {
            (Some(start), Some(end)) if end > start => &content[start..=end],
            _ => {
                return Err(ClassifierError::MalformedResponse(
                    "no JSON object in response".to_string(),
                ))
            }
        };

        let verdict: SeverityVerdict = serde_json::from_str(json)
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;

        Severity::parse(&verdict.severity).ok_or_else(|| {
            ClassifierError::MalformedResponse(format!(
                "unknown severity label: {}",
                verdict.severity
            ))
        })
    }
}

#[async_trait]
impl<P: AiProvider> SeverityClassifier for AiSeverityClassifier<P> {
    async fn classify(&self, request: &SeverityRequest) -> Result<Severity, ClassifierError> {
        let messages = [
            AiMessage::system(SYSTEM_PROMPT),
            AiMessage::user(Self::build_prompt(request)),
        ];

        let response = self
            .provider
            .chat_complete(&messages, &self.config)
            .await
            .map_err(|e| ClassifierError::Provider(e.to_string()))?;

        if let Some(thinking) = &response.thinking {
            tracing::trace!(content_id = %request.content_id, thinking = %thinking, "Classifier reasoning");
        }
        let severity = Self::parse_severity(&response.content)?;
        tracing::debug!(
            content_id = %request.content_id,
            severity = %severity,
            "AI severity classification"
        );
        Ok(severity)
    }
}
