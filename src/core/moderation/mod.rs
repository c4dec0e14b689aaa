// Core moderation module - the community report engine.
// Models, scoring rules, ports (store, classifier, collaborators) and the service.

pub mod collaborators;
pub mod keyword_classifier;
pub mod metrics;
pub mod moderation_models;
pub mod moderation_service;
pub mod report_store;
pub mod scoring;

pub use collaborators::*;
pub use keyword_classifier::KeywordSeverityClassifier;
pub use metrics::ModerationMetrics;
pub use moderation_models::*;
pub use moderation_service::*;
pub use report_store::{ModerationError, ReportStore};
