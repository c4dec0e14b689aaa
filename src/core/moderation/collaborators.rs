// Ports for the engine's outside collaborators: the severity classifier,
// the moderator performance store, notifications and enforcement.

use super::moderation_models::{
    ModeratorAction, ModeratorDecision, Report, ReportResolution, ReportType, Severity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// SEVERITY CLASSIFIER
// ============================================================================

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier provider error: {0}")]
    Provider(String),

    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    #[error("Classifier timed out")]
    Timeout,
}

/// What the classifier gets to look at.
#[derive(Debug, Clone)]
pub struct SeverityRequest {
    pub report_type: ReportType,
    pub description: String,
    pub content_id: String,
}

#[async_trait]
pub trait SeverityClassifier: Send + Sync {
    async fn classify(&self, request: &SeverityRequest) -> Result<Severity, ClassifierError>;
}

// ============================================================================
// MODERATOR PERFORMANCE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeratorStats {
    pub moderator_id: String,
    pub actions_taken: u32,
    pub total_review_minutes: u64,
    pub decisions: HashMap<ModeratorDecision, u32>,
    pub last_action_at: Option<DateTime<Utc>>,
}

impl ModeratorStats {
    pub fn average_review_minutes(&self) -> f64 {
        if self.actions_taken == 0 {
            0.0
        } else {
            self.total_review_minutes as f64 / self.actions_taken as f64
        }
    }
}

#[async_trait]
pub trait ModeratorStatsStore: Send + Sync {
    async fn record_action(&self, moderator_id: &str, action: &ModeratorAction)
        -> anyhow::Result<()>;

    async fn stats(&self, moderator_id: &str) -> anyhow::Result<ModeratorStats>;
}

// ============================================================================
// NOTIFICATIONS AND ENFORCEMENT
// ============================================================================

#[async_trait]
pub trait ModerationNotifier: Send + Sync {
    /// A report landed in the priority queue.
    async fn notify_moderators(&self, report: &Report) -> anyhow::Result<()>;

    async fn notify_resolution(
        &self,
        report: &Report,
        resolution: &ReportResolution,
    ) -> anyhow::Result<()>;
}

/// Applies a moderator's decision to the reported content or its author.
#[async_trait]
pub trait EnforcementHandler: Send + Sync {
    async fn enforce(&self, report: &Report, action: &ModeratorAction) -> anyhow::Result<()>;
}

/// Notifier used when nothing else is wired in.
pub struct NullNotifier;

#[async_trait]
impl ModerationNotifier for NullNotifier {
    async fn notify_moderators(&self, _report: &Report) -> anyhow::Result<()> {
        Ok(())
    }

    async fn notify_resolution(
        &self,
        _report: &Report,
        _resolution: &ReportResolution,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Enforcer used when nothing else is wired in.
pub struct NullEnforcer;

#[async_trait]
impl EnforcementHandler for NullEnforcer {
    async fn enforce(&self, _report: &Report, _action: &ModeratorAction) -> anyhow::Result<()> {
        Ok(())
    }
}
