// Storage port for the report engine.
//
// The core defines WHAT it needs persisted; `infra::moderation` provides
// in-memory and SQLite implementations.

use super::moderation_models::{MemberProfile, ModeratorProfile, QueueType, Report};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Voter {voter_id} has already voted on report {report_id}")]
    DuplicateVote { report_id: String, voter_id: String },

    #[error("Report {0} is closed and no longer accepts votes")]
    ReportClosed(String),

    #[error("Report {0} has already been resolved")]
    AlreadyResolved(String),

    #[error("Report {report_id} cannot move from {from} to {to}")]
    InvalidTransition {
        report_id: String,
        from: String,
        to: String,
    },

    #[error("Appeal not allowed: {0}")]
    AppealNotAllowed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ModerationError {
    pub fn report_not_found(report_id: &str) -> Self {
        ModerationError::NotFound {
            entity: "Report",
            id: report_id.to_string(),
        }
    }

    pub fn moderator_not_found(moderator_id: &str) -> Self {
        ModerationError::NotFound {
            entity: "Moderator",
            id: moderator_id.to_string(),
        }
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Repository for reports, queues and the profiles the engine consults.
///
/// Reports are never deleted. Callers serialize writes to one report; the
/// store only has to make each individual call atomic.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report and append it to `queue`.
    async fn insert_report(&self, report: &Report, queue: QueueType)
        -> Result<(), ModerationError>;

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, ModerationError>;

    /// Overwrite an existing report.
    async fn save_report(&self, report: &Report) -> Result<(), ModerationError>;

    /// Append a report to a queue. Appending a report that is already in the
    /// queue is a no-op.
    async fn add_to_queue(&self, queue: QueueType, report_id: &str)
        -> Result<(), ModerationError>;

    /// Report ids in a queue, in insertion order.
    async fn queue_report_ids(&self, queue: QueueType) -> Result<Vec<String>, ModerationError>;

    /// All reports submitted at or after `since`.
    async fn reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>, ModerationError>;

    /// Return the cached weight for a voter, storing `initial` if there is none.
    async fn voter_weight_or_insert(
        &self,
        voter_id: &str,
        initial: f64,
    ) -> Result<f64, ModerationError>;

    async fn get_moderator(
        &self,
        moderator_id: &str,
    ) -> Result<Option<ModeratorProfile>, ModerationError>;

    async fn save_moderator(&self, profile: &ModeratorProfile) -> Result<(), ModerationError>;

    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>, ModerationError>;

    async fn save_member(&self, profile: &MemberProfile) -> Result<(), ModerationError>;
}

// Blanket implementation for Box<dyn ReportStore>
// This lets the composition root pick a backend at runtime (SQLite or in-memory)
// while the service stays generic over its store.
#[async_trait]
impl ReportStore for Box<dyn ReportStore> {
    async fn insert_report(
        &self,
        report: &Report,
        queue: QueueType,
    ) -> Result<(), ModerationError> {
        (**self).insert_report(report, queue).await
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, ModerationError> {
        (**self).get_report(report_id).await
    }

    async fn save_report(&self, report: &Report) -> Result<(), ModerationError> {
        (**self).save_report(report).await
    }

    async fn add_to_queue(
        &self,
        queue: QueueType,
        report_id: &str,
    ) -> Result<(), ModerationError> {
        (**self).add_to_queue(queue, report_id).await
    }

    async fn queue_report_ids(&self, queue: QueueType) -> Result<Vec<String>, ModerationError> {
        (**self).queue_report_ids(queue).await
    }

    async fn reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>, ModerationError> {
        (**self).reports_since(since).await
    }

    async fn voter_weight_or_insert(
        &self,
        voter_id: &str,
        initial: f64,
    ) -> Result<f64, ModerationError> {
        (**self).voter_weight_or_insert(voter_id, initial).await
    }

    async fn get_moderator(
        &self,
        moderator_id: &str,
    ) -> Result<Option<ModeratorProfile>, ModerationError> {
        (**self).get_moderator(moderator_id).await
    }

    async fn save_moderator(&self, profile: &ModeratorProfile) -> Result<(), ModerationError> {
        (**self).save_moderator(profile).await
    }

    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>, ModerationError> {
        (**self).get_member(user_id).await
    }

    async fn save_member(&self, profile: &MemberProfile) -> Result<(), ModerationError> {
        (**self).save_member(profile).await
    }
}
