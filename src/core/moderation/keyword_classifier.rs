// Rule-based severity classifier. Used when no AI provider is configured,
// and as a deterministic stand-in for one in tests.
//
// Terms match at the start of a word, so "harass" catches "harassment" and
// "dox" catches "doxxed", but "kill" never fires on "skill".

use super::collaborators::{ClassifierError, SeverityClassifier, SeverityRequest};
use super::moderation_models::{ReportType, Severity};
use async_trait::async_trait;

const URGENT_TERMS: &[&str] = &[
    "suicide",
    "self-harm",
    "kill",
    "threat",
    "dox",
    "home address",
    "grooming",
    "child abuse",
    "weapon",
    "bomb",
];

const HIGH_TERMS: &[&str] = &[
    "hate",
    "slur",
    "harass",
    "bully",
    "stalk",
    "nude",
    "explicit",
    "violence",
    "violent",
    "phone number",
    "personal information",
    "racist",
];

pub struct KeywordSeverityClassifier;

impl KeywordSeverityClassifier {
    pub fn new() -> Self {
        Self
    }

    fn baseline(report_type: ReportType) -> Severity {
        match report_type {
            ReportType::Harassment
            | ReportType::InappropriateContent
            | ReportType::PrivacyViolation
            | ReportType::Misinformation => Severity::Medium,
            ReportType::Spam | ReportType::Copyright | ReportType::Other => Severity::Low,
        }
    }

    pub fn classify_text(report_type: ReportType, description: &str) -> Severity {
        let text = words(description);

        if URGENT_TERMS.iter().any(|t| mentions(&text, t)) {
            return Severity::Urgent;
        }
        if HIGH_TERMS.iter().any(|t| mentions(&text, t)) {
            return Severity::High.max(Self::baseline(report_type));
        }
        Self::baseline(report_type)
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the words of `term` appear in a row in `text`, each one as the
/// start of a word.
fn mentions(text: &[String], term: &str) -> bool {
    let term = words(term);
    if term.is_empty() || term.len() > text.len() {
        return false;
    }
    text.windows(term.len()).any(|window| {
        window
            .iter()
            .zip(&term)
            .all(|(word, stem)| word.starts_with(stem.as_str()))
    })
}

impl Default for KeywordSeverityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeverityClassifier for KeywordSeverityClassifier {
    async fn classify(&self, request: &SeverityRequest) -> Result<Severity, ClassifierError> {
        Ok(Self::classify_text(
            request.report_type,
            &request.description,
        ))
    }
}
