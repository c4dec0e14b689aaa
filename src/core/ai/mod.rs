pub mod ai_service;
pub mod models;
pub mod severity_classifier;

pub use ai_service::AiProvider;
pub use models::{AiConfig, AiMessage, AiProviderResponse};
pub use severity_classifier::AiSeverityClassifier;
