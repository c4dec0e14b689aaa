// Community moderation service - core business logic for the report engine.
//
// This service handles:
// - Report submission (severity, category, priority, queue routing)
// - Weighted community voting and consensus
// - Moderator review, escalation, dismissal and resolution
// - Appeals against resolutions
// - Queue retrieval and metrics
//
// NO Discord dependencies here - just pure domain logic.

use super::collaborators::{
    ClassifierError, EnforcementHandler, ModerationNotifier, ModeratorStats, ModeratorStatsStore,
    NullEnforcer, NullNotifier, SeverityClassifier, SeverityRequest,
};
use super::metrics::{compute_metrics, ModerationMetrics};
use super::moderation_models::{
    generate_id, Appeal, AppealDecision, AppealOutcome, CommunityVote, Escalation,
    EscalationSource, Evidence, MemberProfile, ModerationConfig, ModeratorAction,
    ModeratorDecision, ModeratorProfile, QueueType, Report, ReportFilters, ReportResolution,
    ReportStatus, ReportSubmission, ResolutionSubmission, ReviewSubmission, Severity, SortBy,
    Timeframe, VerificationStatus, VoteSubmission, VoteType,
};
use super::report_store::{ModerationError, ReportStore};
use super::scoring::{
    boosted, calculate_priority, category_for, has_consensus, initial_queue, vote_weight_for,
};
use chrono::Utc;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The community moderation report engine.
///
/// Every operation that mutates a report holds that report's lock for the
/// whole read-check-write sequence, so concurrent votes and decisions on the
/// same report are applied one at a time.
pub struct ModerationService<S: ReportStore> {
    store: S,
    classifier: Box<dyn SeverityClassifier>,
    stats: Box<dyn ModeratorStatsStore>,
    notifier: Box<dyn ModerationNotifier>,
    enforcer: Box<dyn EnforcementHandler>,
    config: ModerationConfig,
    report_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: ReportStore> ModerationService<S> {
    pub fn new(
        store: S,
        classifier: Box<dyn SeverityClassifier>,
        stats: Box<dyn ModeratorStatsStore>,
        config: ModerationConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            stats,
            notifier: Box::new(NullNotifier),
            enforcer: Box::new(NullEnforcer),
            config,
            report_locks: DashMap::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn ModerationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_enforcer(mut self, enforcer: Box<dyn EnforcementHandler>) -> Self {
        self.enforcer = enforcer;
        self
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Take a report's lock and load it. Unknown ids leave no lock behind.
    async fn lock_and_load(
        &self,
        report_id: &str,
    ) -> Result<(OwnedMutexGuard<()>, Report), ModerationError> {
        let lock = Arc::clone(&self.report_locks.entry(report_id.to_string()).or_default());
        let guard = lock.lock_owned().await;

        match self.store.get_report(report_id).await {
            Ok(Some(report)) => Ok((guard, report)),
            Ok(None) => {
                drop(guard);
                // Only drop the entry if nobody else is waiting on it
                self.report_locks
                    .remove_if(report_id, |_, lock| Arc::strong_count(lock) == 1);
                Err(ModerationError::report_not_found(report_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn load_report(&self, report_id: &str) -> Result<Report, ModerationError> {
        self.store
            .get_report(report_id)
            .await?
            .ok_or_else(|| ModerationError::report_not_found(report_id))
    }

    async fn load_moderator(&self, moderator_id: &str) -> Result<ModeratorProfile, ModerationError> {
        self.store
            .get_moderator(moderator_id)
            .await?
            .ok_or_else(|| ModerationError::moderator_not_found(moderator_id))
    }

    /// Ask the classifier for a severity. Failures and timeouts fall back to
    /// medium; they are never surfaced to the caller.
    async fn classify_severity(&self, request: &SeverityRequest) -> Severity {
        let outcome = match tokio::time::timeout(
            self.config.classifier_timeout,
            self.classifier.classify(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout),
        };

        match outcome {
            Ok(severity) => severity,
            Err(e) => {
                tracing::warn!(
                    content_id = %request.content_id,
                    error = %e,
                    "Severity classification failed, falling back to medium"
                );
                Severity::Medium
            }
        }
    }

    // ------------------------------------------------------------------------
    // SUBMISSION
    // ------------------------------------------------------------------------

    /// Submit a new report against a piece of content.
    ///
    /// The report is routed into exactly one queue here, and never moved out
    /// of it afterwards.
    pub async fn submit_report(
        &self,
        content_id: &str,
        reporter_id: &str,
        reporter: &MemberProfile,
        submission: ReportSubmission,
    ) -> Result<Report, ModerationError> {
        if content_id.trim().is_empty() {
            return Err(ModerationError::InvalidInput(
                "Content id cannot be empty".to_string(),
            ));
        }
        if submission.description.trim().is_empty() {
            return Err(ModerationError::InvalidInput(
                "Report description cannot be empty".to_string(),
            ));
        }

        let severity = self
            .classify_severity(&SeverityRequest {
                report_type: submission.report_type,
                description: submission.description.clone(),
                content_id: content_id.to_string(),
            })
            .await;

        let priority = calculate_priority(severity, submission.report_type, reporter.age_group);
        let queue = initial_queue(priority, severity, &self.config);
        let now = Utc::now();

        let (status, escalation) = if severity == Severity::Urgent {
            (
                ReportStatus::Escalated,
                Some(Escalation {
                    source: EscalationSource::UrgentSeverity,
                    escalated_by: None,
                    reason: "Urgent severity at submission".to_string(),
                    escalated_at: now,
                }),
            )
        } else {
            (ReportStatus::Pending, None)
        };

        let evidence = submission
            .evidence
            .into_iter()
            .map(|input| Evidence {
                evidence_id: generate_id("evidence"),
                evidence_type: input.evidence_type,
                content: input.content,
                description: input.description,
                verification_status: VerificationStatus::Unverified,
                submitted_at: now,
                verified_by: None,
                verified_at: None,
            })
            .collect();

        let report = Report {
            report_id: generate_id("report"),
            content_id: content_id.to_string(),
            reporter_id: reporter_id.to_string(),
            reporter_age_group: reporter.age_group,
            target_user_id: submission.target_user_id,
            report_type: submission.report_type,
            category: category_for(submission.report_type),
            description: submission.description,
            severity,
            evidence,
            priority,
            status,
            tags: submission.tags,
            community_votes: Vec::new(),
            moderator_actions: Vec::new(),
            resolution: None,
            appeal: None,
            escalation,
            timestamp: now,
            updated_at: now,
        };

        self.store.insert_report(&report, queue).await?;

        tracing::info!(
            report_id = %report.report_id,
            content_id = %report.content_id,
            report_type = %report.report_type,
            severity = %report.severity,
            priority = report.priority,
            queue = %queue,
            "Report submitted"
        );

        if queue == QueueType::Priority {
            if let Err(e) = self.notifier.notify_moderators(&report).await {
                tracing::warn!(report_id = %report.report_id, error = %e, "Failed to notify moderators");
            }
        }

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // VOTING
    // ------------------------------------------------------------------------

    /// Cast a community vote. One vote per voter per report; priority only
    /// ever goes up as a result.
    pub async fn submit_community_vote(
        &self,
        report_id: &str,
        voter_id: &str,
        voter: &MemberProfile,
        submission: VoteSubmission,
    ) -> Result<CommunityVote, ModerationError> {
        if !(0.0..=1.0).contains(&submission.confidence) {
            return Err(ModerationError::InvalidInput(format!(
                "Confidence must be between 0 and 1, got {}",
                submission.confidence
            )));
        }

        let (_guard, mut report) = self.lock_and_load(report_id).await?;

        if !report.status.is_open() {
            return Err(ModerationError::ReportClosed(report_id.to_string()));
        }
        if report.has_vote_from(voter_id) {
            return Err(ModerationError::DuplicateVote {
                report_id: report_id.to_string(),
                voter_id: voter_id.to_string(),
            });
        }

        // The first vote a voter ever casts fixes their weight.
        let weight = self
            .store
            .voter_weight_or_insert(voter_id, vote_weight_for(voter.age_group))
            .await?;

        let now = Utc::now();
        let vote = CommunityVote {
            voter_id: voter_id.to_string(),
            vote_type: submission.vote_type,
            confidence: submission.confidence,
            reasoning: submission.reasoning,
            weight,
            timestamp: now,
        };
        report.community_votes.push(vote.clone());

        let priority_before = report.priority;
        if report.weight_for(VoteType::Support) > self.config.support_boost_threshold {
            report.priority = boosted(report.priority, self.config.support_boost);
        }

        let mut escalated = false;
        if has_consensus(&report, &self.config) {
            report.priority = boosted(report.priority, self.config.consensus_boost);
            if report.status == ReportStatus::Pending {
                report.status = ReportStatus::Escalated;
                report.escalation = Some(Escalation {
                    source: EscalationSource::CommunityConsensus,
                    escalated_by: None,
                    reason: "Community consensus reached".to_string(),
                    escalated_at: now,
                });
                escalated = true;
            }
        }
        report.updated_at = now;

        self.store.save_report(&report).await?;
        if escalated {
            self.store
                .add_to_queue(QueueType::Escalated, report_id)
                .await?;
        }

        tracing::info!(
            report_id = %report_id,
            voter_id = %voter_id,
            weight,
            votes = report.community_votes.len(),
            priority_before,
            priority_after = report.priority,
            escalated,
            "Community vote recorded"
        );

        Ok(vote)
    }

    // ------------------------------------------------------------------------
    // MODERATOR ACTIONS
    // ------------------------------------------------------------------------

    /// Record a moderator's review of a report and apply their decision.
    pub async fn moderator_review(
        &self,
        report_id: &str,
        moderator_id: &str,
        submission: ReviewSubmission,
    ) -> Result<ModeratorAction, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;
        let moderator = self.load_moderator(moderator_id).await?;

        if !report.status.is_open() {
            return Err(ModerationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: report.status.to_string(),
                to: ReportStatus::Reviewing.to_string(),
            });
        }

        let now = Utc::now();
        let action = ModeratorAction {
            action_id: generate_id("action"),
            moderator_id: moderator_id.to_string(),
            moderator_type: moderator.moderator_type(),
            decision: submission.decision,
            reasoning: submission.reasoning,
            review_time: submission.review_time,
            evidence_reviewed: submission.evidence_reviewed,
            timestamp: now,
        };
        report.moderator_actions.push(action.clone());
        report.status = ReportStatus::Reviewing;
        report.updated_at = now;

        self.store.save_report(&report).await?;

        tracing::info!(
            report_id = %report_id,
            moderator_id = %moderator_id,
            decision = %action.decision,
            "Moderator review recorded"
        );

        self.record_stats(moderator_id, &action).await;

        if action.decision != ModeratorDecision::NoAction {
            if let Err(e) = self.enforcer.enforce(&report, &action).await {
                tracing::warn!(
                    report_id = %report_id,
                    decision = %action.decision,
                    error = %e,
                    "Enforcement failed"
                );
            }
        }

        Ok(action)
    }

    async fn record_stats(&self, moderator_id: &str, action: &ModeratorAction) {
        if let Err(e) = self.stats.record_action(moderator_id, action).await {
            tracing::warn!(moderator_id = %moderator_id, error = %e, "Failed to update moderator statistics");
        }
    }

    /// Close a report with a resolution. A report can only be resolved once.
    pub async fn resolve_report(
        &self,
        report_id: &str,
        resolver_id: &str,
        submission: ResolutionSubmission,
    ) -> Result<ReportResolution, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;

        if report.resolution.is_some() {
            return Err(ModerationError::AlreadyResolved(report_id.to_string()));
        }
        if !report.status.can_transition_to(ReportStatus::Resolved) {
            return Err(ModerationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: report.status.to_string(),
                to: ReportStatus::Resolved.to_string(),
            });
        }

        let now = Utc::now();
        let appealable = submission.appealable.unwrap_or(true);
        let resolution = ReportResolution {
            resolution_type: submission.resolution_type,
            resolver_id: resolver_id.to_string(),
            reasoning: submission.reasoning,
            actions: submission.actions,
            resolved_at: now,
            appealable,
            appeal_deadline: appealable.then(|| now + self.config.appeal_window),
        };
        report.resolution = Some(resolution.clone());
        report.status = ReportStatus::Resolved;
        report.updated_at = now;

        self.store.save_report(&report).await?;

        tracing::info!(
            report_id = %report_id,
            resolver_id = %resolver_id,
            resolution = %resolution.resolution_type,
            appealable,
            "Report resolved"
        );

        if let Err(e) = self.notifier.notify_resolution(&report, &resolution).await {
            tracing::warn!(report_id = %report_id, error = %e, "Failed to send resolution notification");
        }

        Ok(resolution)
    }

    /// Escalate a report on a moderator's say-so. Escalating an already
    /// escalated report changes nothing.
    pub async fn escalate_report(
        &self,
        report_id: &str,
        moderator_id: &str,
        reason: &str,
    ) -> Result<Report, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;
        self.load_moderator(moderator_id).await?;

        if report.status == ReportStatus::Escalated {
            return Ok(report);
        }
        if !report.status.can_transition_to(ReportStatus::Escalated) {
            return Err(ModerationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: report.status.to_string(),
                to: ReportStatus::Escalated.to_string(),
            });
        }

        let now = Utc::now();
        report.status = ReportStatus::Escalated;
        report.escalation = Some(Escalation {
            source: EscalationSource::Moderator,
            escalated_by: Some(moderator_id.to_string()),
            reason: reason.to_string(),
            escalated_at: now,
        });
        report.updated_at = now;

        self.store.save_report(&report).await?;
        self.store
            .add_to_queue(QueueType::Escalated, report_id)
            .await?;

        tracing::info!(report_id = %report_id, moderator_id = %moderator_id, "Report escalated");

        if let Err(e) = self.notifier.notify_moderators(&report).await {
            tracing::warn!(report_id = %report_id, error = %e, "Failed to notify moderators");
        }

        Ok(report)
    }

    /// Dismiss an open report without a resolution.
    pub async fn dismiss_report(
        &self,
        report_id: &str,
        moderator_id: &str,
        reason: &str,
    ) -> Result<Report, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;
        let moderator = self.load_moderator(moderator_id).await?;

        if !report.status.is_open() {
            return Err(ModerationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: report.status.to_string(),
                to: ReportStatus::Dismissed.to_string(),
            });
        }

        let now = Utc::now();
        let action = ModeratorAction {
            action_id: generate_id("action"),
            moderator_id: moderator_id.to_string(),
            moderator_type: moderator.moderator_type(),
            decision: ModeratorDecision::NoAction,
            reasoning: reason.to_string(),
            review_time: 0,
            evidence_reviewed: Vec::new(),
            timestamp: now,
        };
        report.moderator_actions.push(action.clone());
        report.status = ReportStatus::Dismissed;
        report.updated_at = now;

        self.store.save_report(&report).await?;
        self.record_stats(moderator_id, &action).await;

        tracing::info!(report_id = %report_id, moderator_id = %moderator_id, "Report dismissed");

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // APPEALS
    // ------------------------------------------------------------------------

    /// File an appeal against a resolution while its appeal window is open.
    pub async fn appeal_report(
        &self,
        report_id: &str,
        appellant_id: &str,
        reason: &str,
    ) -> Result<Appeal, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;

        if report.appeal.is_some() {
            return Err(ModerationError::AppealNotAllowed(
                "an appeal has already been filed for this report".to_string(),
            ));
        }
        if report.status != ReportStatus::Resolved {
            return Err(ModerationError::AppealNotAllowed(format!(
                "report is {}, not resolved",
                report.status
            )));
        }

        let now = Utc::now();
        match report.resolution.as_ref() {
            Some(resolution) if !resolution.appealable => {
                return Err(ModerationError::AppealNotAllowed(
                    "resolution is not appealable".to_string(),
                ));
            }
            Some(resolution) => {
                if resolution.appeal_deadline.is_some_and(|deadline| now > deadline) {
                    return Err(ModerationError::AppealNotAllowed(
                        "the appeal window has closed".to_string(),
                    ));
                }
            }
            None => {
                return Err(ModerationError::AppealNotAllowed(
                    "report has no resolution".to_string(),
                ));
            }
        }

        let appeal = Appeal {
            appellant_id: appellant_id.to_string(),
            reason: reason.to_string(),
            filed_at: now,
            outcome: None,
        };
        report.appeal = Some(appeal.clone());
        report.status = ReportStatus::Appealed;
        report.updated_at = now;

        self.store.save_report(&report).await?;
        self.store.add_to_queue(QueueType::Appeals, report_id).await?;

        tracing::info!(report_id = %report_id, appellant_id = %appellant_id, "Appeal filed");

        Ok(appeal)
    }

    /// Decide an open appeal. Upholding returns the report to resolved;
    /// overturning dismisses it.
    pub async fn decide_appeal(
        &self,
        report_id: &str,
        moderator_id: &str,
        decision: AppealDecision,
    ) -> Result<Report, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;
        self.load_moderator(moderator_id).await?;

        let next = if decision.upheld {
            ReportStatus::Resolved
        } else {
            ReportStatus::Dismissed
        };
        if report.status != ReportStatus::Appealed {
            return Err(ModerationError::InvalidTransition {
                report_id: report_id.to_string(),
                from: report.status.to_string(),
                to: next.to_string(),
            });
        }

        let now = Utc::now();
        if let Some(appeal) = report.appeal.as_mut() {
            appeal.outcome = Some(AppealOutcome {
                upheld: decision.upheld,
                decided_by: moderator_id.to_string(),
                reasoning: decision.reasoning,
                decided_at: now,
            });
        }
        report.status = next;
        report.updated_at = now;

        self.store.save_report(&report).await?;

        tracing::info!(
            report_id = %report_id,
            moderator_id = %moderator_id,
            upheld = decision.upheld,
            "Appeal decided"
        );

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // EVIDENCE
    // ------------------------------------------------------------------------

    pub async fn verify_evidence(
        &self,
        report_id: &str,
        evidence_id: &str,
        moderator_id: &str,
        status: VerificationStatus,
    ) -> Result<Evidence, ModerationError> {
        let (_guard, mut report) = self.lock_and_load(report_id).await?;
        self.load_moderator(moderator_id).await?;

        let now = Utc::now();
        let evidence = report
            .evidence
            .iter_mut()
            .find(|e| e.evidence_id == evidence_id)
            .ok_or_else(|| ModerationError::NotFound {
                entity: "Evidence",
                id: evidence_id.to_string(),
            })?;
        evidence.verification_status = status;
        evidence.verified_by = Some(moderator_id.to_string());
        evidence.verified_at = Some(now);
        let updated = evidence.clone();
        report.updated_at = now;

        self.store.save_report(&report).await?;
        Ok(updated)
    }

    // ------------------------------------------------------------------------
    // QUERIES
    // ------------------------------------------------------------------------

    pub async fn get_report(&self, report_id: &str) -> Result<Report, ModerationError> {
        self.load_report(report_id).await
    }

    /// Copies of the reports in a queue, filtered and sorted.
    pub async fn get_moderation_queue(
        &self,
        queue: QueueType,
        filters: &ReportFilters,
        sort_by: SortBy,
    ) -> Result<Vec<Report>, ModerationError> {
        let ids = self.store.queue_report_ids(queue).await?;

        let mut reports = Vec::with_capacity(ids.len());
        for id in ids {
            match self.store.get_report(&id).await? {
                Some(report) if filters.matches(&report) => reports.push(report),
                Some(_) => {}
                None => tracing::warn!(report_id = %id, queue = %queue, "Queued report is missing"),
            }
        }

        sort_reports(&mut reports, sort_by);
        Ok(reports)
    }

    pub async fn get_moderation_metrics(
        &self,
        timeframe: Timeframe,
    ) -> Result<ModerationMetrics, ModerationError> {
        self.get_moderation_metrics_for(timeframe, None).await
    }

    /// Metrics over the reports whose content id starts with `content_prefix`,
    /// or over every report when it is `None`.
    pub async fn get_moderation_metrics_for(
        &self,
        timeframe: Timeframe,
        content_prefix: Option<&str>,
    ) -> Result<ModerationMetrics, ModerationError> {
        let now = Utc::now();
        let mut reports = self.store.reports_since(now - timeframe.duration()).await?;
        if let Some(prefix) = content_prefix {
            reports.retain(|r| r.content_id.starts_with(prefix));
        }
        Ok(compute_metrics(&reports, timeframe, now, &self.config))
    }

    // ------------------------------------------------------------------------
    // PROFILES
    // ------------------------------------------------------------------------

    pub async fn register_moderator(&self, profile: ModeratorProfile) -> Result<(), ModerationError> {
        self.store.save_moderator(&profile).await
    }

    pub async fn moderator_profile(
        &self,
        moderator_id: &str,
    ) -> Result<Option<ModeratorProfile>, ModerationError> {
        self.store.get_moderator(moderator_id).await
    }

    pub async fn moderator_stats(&self, moderator_id: &str) -> Result<ModeratorStats, ModerationError> {
        self.stats
            .stats(moderator_id)
            .await
            .map_err(|e| ModerationError::StorageError(e.to_string()))
    }

    /// A member's profile. Members the engine has never seen are adults.
    pub async fn member_profile(&self, user_id: &str) -> Result<MemberProfile, ModerationError> {
        Ok(self
            .store
            .get_member(user_id)
            .await?
            .unwrap_or_else(|| MemberProfile::new(user_id, Default::default())))
    }

    pub async fn save_member_profile(&self, profile: MemberProfile) -> Result<(), ModerationError> {
        self.store.save_member(&profile).await
    }
}

/// Sort in place. Stable, so ties keep queue order.
pub fn sort_reports(reports: &mut [Report], sort_by: SortBy) {
    match sort_by {
        SortBy::Priority => reports.sort_by_key(|r| Reverse(r.priority)),
        SortBy::Severity => reports.sort_by_key(|r| Reverse(r.severity)),
        SortBy::CommunityVotes => reports.sort_by_key(|r| Reverse(r.community_votes.len())),
        SortBy::Timestamp => reports.sort_by_key(|r| Reverse(r.timestamp)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_models::{
        AgeGroup, EvidenceInput, EvidenceType, ReportType, ResolutionType,
    };
    use crate::infra::moderation::{InMemoryModeratorStats, InMemoryReportStore};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex as StdMutex;

    struct FixedClassifier(Severity);

    #[async_trait]
    impl SeverityClassifier for FixedClassifier {
        async fn classify(&self, _request: &SeverityRequest) -> Result<Severity, ClassifierError> {
            Ok(self.0)
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl SeverityClassifier for FailingClassifier {
        async fn classify(&self, _request: &SeverityRequest) -> Result<Severity, ClassifierError> {
            Err(ClassifierError::MalformedResponse("not json".to_string()))
        }
    }

    struct SlowClassifier;

    #[async_trait]
    impl SeverityClassifier for SlowClassifier {
        async fn classify(&self, _request: &SeverityRequest) -> Result<Severity, ClassifierError> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(Severity::Urgent)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        alerts: Arc<StdMutex<Vec<String>>>,
        resolutions: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl ModerationNotifier for RecordingNotifier {
        async fn notify_moderators(&self, report: &Report) -> anyhow::Result<()> {
            self.alerts.lock().unwrap().push(report.report_id.clone());
            Ok(())
        }

        async fn notify_resolution(
            &self,
            report: &Report,
            _resolution: &ReportResolution,
        ) -> anyhow::Result<()> {
            self.resolutions
                .lock()
                .unwrap()
                .push(report.report_id.clone());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingEnforcer {
        decisions: Arc<StdMutex<Vec<ModeratorDecision>>>,
    }

    #[async_trait]
    impl EnforcementHandler for RecordingEnforcer {
        async fn enforce(&self, _report: &Report, action: &ModeratorAction) -> anyhow::Result<()> {
            self.decisions.lock().unwrap().push(action.decision);
            Ok(())
        }
    }

    fn service_with(severity: Severity) -> ModerationService<InMemoryReportStore> {
        ModerationService::new(
            InMemoryReportStore::new(),
            Box::new(FixedClassifier(severity)),
            Box::new(InMemoryModeratorStats::new()),
            ModerationConfig::default(),
        )
    }

    fn adult(id: &str) -> MemberProfile {
        MemberProfile::new(id, AgeGroup::Adult)
    }

    fn submission(report_type: ReportType) -> ReportSubmission {
        ReportSubmission {
            report_type,
            description: "This post breaks the rules".to_string(),
            evidence: vec![],
            tags: vec![],
            target_user_id: Some("author".to_string()),
        }
    }

    fn vote(vote_type: VoteType) -> VoteSubmission {
        VoteSubmission {
            vote_type,
            confidence: 0.9,
            reasoning: None,
        }
    }

    async fn register(service: &ModerationService<InMemoryReportStore>, id: &str) {
        service
            .register_moderator(ModeratorProfile {
                moderator_id: id.to_string(),
                reputation: 100,
                permissions: vec!["moderate".to_string()],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_report_scores_and_routes() {
        let service = service_with(Severity::Low);

        let report = service
            .submit_report("content-1", "reporter", &adult("reporter"), submission(ReportType::Copyright))
            .await
            .unwrap();

        assert_eq!(report.priority, 7);
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.category, crate::core::moderation::ReportCategory::Legal);

        let community = service
            .get_moderation_queue(QueueType::Community, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(community.len(), 1);
        let priority = service
            .get_moderation_queue(QueueType::Priority, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert!(priority.is_empty());
    }

    #[tokio::test]
    async fn test_urgent_report_is_escalated_and_prioritised() {
        let notifier = RecordingNotifier::default();
        let service = service_with(Severity::Urgent).with_notifier(Box::new(notifier.clone()));

        let child = MemberProfile::new("kid", AgeGroup::Child);
        let report = service
            .submit_report("content-1", "kid", &child, submission(ReportType::Harassment))
            .await
            .unwrap();

        assert_eq!(report.priority, 10);
        assert_eq!(report.status, ReportStatus::Escalated);
        assert_eq!(
            report.escalation.as_ref().map(|e| e.source),
            Some(EscalationSource::UrgentSeverity)
        );
        assert_eq!(notifier.alerts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_falls_back_to_medium() {
        let service = ModerationService::new(
            InMemoryReportStore::new(),
            Box::new(FailingClassifier),
            Box::new(InMemoryModeratorStats::new()),
            ModerationConfig::default(),
        );

        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        assert_eq!(report.severity, Severity::Medium);
        // 5 + 3 + 1 + 0
        assert_eq!(report.priority, 9);
    }

    #[tokio::test]
    async fn test_classifier_timeout_falls_back_to_medium() {
        let config = ModerationConfig {
            classifier_timeout: std::time::Duration::from_millis(20),
            ..Default::default()
        };
        let service = ModerationService::new(
            InMemoryReportStore::new(),
            Box::new(SlowClassifier),
            Box::new(InMemoryModeratorStats::new()),
            config,
        );

        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Other))
            .await
            .unwrap();

        assert_eq!(report.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_empty_description_is_rejected() {
        let service = service_with(Severity::Low);
        let mut sub = submission(ReportType::Spam);
        sub.description = "   ".to_string();

        let result = service.submit_report("c", "r", &adult("r"), sub).await;
        assert!(matches!(result, Err(ModerationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_evidence_starts_unverified_and_can_be_verified() {
        let service = service_with(Severity::Low);
        register(&service, "mod").await;

        let mut sub = submission(ReportType::Spam);
        sub.evidence.push(EvidenceInput {
            evidence_type: EvidenceType::Url,
            content: "https://example.com/spam".to_string(),
            description: None,
        });
        let report = service.submit_report("c", "r", &adult("r"), sub).await.unwrap();
        let evidence_id = report.evidence[0].evidence_id.clone();
        assert_eq!(
            report.evidence[0].verification_status,
            VerificationStatus::Unverified
        );

        let updated = service
            .verify_evidence(&report.report_id, &evidence_id, "mod", VerificationStatus::Verified)
            .await
            .unwrap();
        assert_eq!(updated.verification_status, VerificationStatus::Verified);
        assert_eq!(updated.verified_by.as_deref(), Some("mod"));

        let missing = service
            .verify_evidence(&report.report_id, "nope", "mod", VerificationStatus::Invalid)
            .await;
        assert!(matches!(missing, Err(ModerationError::NotFound { entity: "Evidence", .. })));
    }

    #[tokio::test]
    async fn test_duplicate_vote_is_rejected() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        service
            .submit_community_vote(&report.report_id, "voter", &adult("voter"), vote(VoteType::Support))
            .await
            .unwrap();
        let second = service
            .submit_community_vote(&report.report_id, "voter", &adult("voter"), vote(VoteType::Dispute))
            .await;

        assert!(matches!(second, Err(ModerationError::DuplicateVote { .. })));
        let stored = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(stored.community_votes.len(), 1);
    }

    #[tokio::test]
    async fn test_vote_on_unknown_report_is_not_found() {
        let service = service_with(Severity::Low);
        let result = service
            .submit_community_vote("missing", "voter", &adult("voter"), vote(VoteType::Support))
            .await;
        assert!(matches!(result, Err(ModerationError::NotFound { entity: "Report", .. })));
    }

    #[tokio::test]
    async fn test_invalid_confidence_is_rejected() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let mut bad = vote(VoteType::Support);
        bad.confidence = 1.5;
        let result = service
            .submit_community_vote(&report.report_id, "voter", &adult("voter"), bad)
            .await;
        assert!(matches!(result, Err(ModerationError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_vote_weight_is_sticky_per_voter() {
        let service = service_with(Severity::Low);
        let first = service
            .submit_report("c1", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        let second = service
            .submit_report("c2", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let teen = MemberProfile::new("voter", AgeGroup::Teen);
        let v1 = service
            .submit_community_vote(&first.report_id, "voter", &teen, vote(VoteType::Support))
            .await
            .unwrap();
        assert!((v1.weight - 0.8).abs() < 1e-9);

        // Profile changed, but the cached weight wins.
        let v2 = service
            .submit_community_vote(&second.report_id, "voter", &adult("voter"), vote(VoteType::Support))
            .await
            .unwrap();
        assert_eq!(v1.weight, v2.weight);
    }

    #[tokio::test]
    async fn test_priority_never_decreases_from_voting() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let pattern = [
            VoteType::Dispute,
            VoteType::Support,
            VoteType::Dispute,
            VoteType::Neutral,
            VoteType::Support,
            VoteType::Support,
            VoteType::Support,
            VoteType::Support,
            VoteType::Dispute,
        ];
        let mut last = report.priority;
        for (i, vote_type) in pattern.into_iter().enumerate() {
            let voter = format!("voter-{}", i);
            service
                .submit_community_vote(&report.report_id, &voter, &adult(&voter), vote(vote_type))
                .await
                .unwrap();
            let current = service.get_report(&report.report_id).await.unwrap().priority;
            assert!(current >= last, "priority dropped after vote {}", i);
            last = current;
        }
    }

    #[tokio::test]
    async fn test_queue_membership_is_fixed_at_submission() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Copyright))
            .await
            .unwrap();
        assert_eq!(report.priority, 7);

        for i in 0..5 {
            let voter = format!("voter-{}", i);
            service
                .submit_community_vote(&report.report_id, &voter, &adult(&voter), vote(VoteType::Support))
                .await
                .unwrap();
        }

        let updated = service.get_report(&report.report_id).await.unwrap();
        assert!(updated.priority > 8);

        let priority_queue = service
            .get_moderation_queue(QueueType::Priority, &ReportFilters::default(), SortBy::Priority)
            .await
            .unwrap();
        assert!(priority_queue.is_empty());

        let community = service
            .get_moderation_queue(QueueType::Community, &ReportFilters::default(), SortBy::Priority)
            .await
            .unwrap();
        assert_eq!(community.len(), 1);
    }

    #[tokio::test]
    async fn test_consensus_escalates_pending_report() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        for i in 0..4 {
            let voter = format!("voter-{}", i);
            service
                .submit_community_vote(&report.report_id, &voter, &adult(&voter), vote(VoteType::Support))
                .await
                .unwrap();
        }
        service
            .submit_community_vote(&report.report_id, "skeptic", &adult("skeptic"), vote(VoteType::Dispute))
            .await
            .unwrap();

        let updated = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(updated.status, ReportStatus::Escalated);
        assert_eq!(
            updated.escalation.map(|e| e.source),
            Some(EscalationSource::CommunityConsensus)
        );

        let escalated = service
            .get_moderation_queue(QueueType::Escalated, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(escalated.len(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_report_lifecycle() {
        let notifier = RecordingNotifier::default();
        let enforcer = RecordingEnforcer::default();
        let service = service_with(Severity::High)
            .with_notifier(Box::new(notifier.clone()))
            .with_enforcer(Box::new(enforcer.clone()));
        register(&service, "mod").await;

        let report = service
            .submit_report("content-9", "reporter", &adult("reporter"), submission(ReportType::Harassment))
            .await
            .unwrap();
        assert_eq!(report.severity, Severity::High);
        assert_eq!(report.priority, 10);

        let queue = service
            .get_moderation_queue(QueueType::Priority, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);

        for i in 0..4 {
            let voter = format!("supporter-{}", i);
            service
                .submit_community_vote(&report.report_id, &voter, &adult(&voter), vote(VoteType::Support))
                .await
                .unwrap();
        }
        service
            .submit_community_vote(&report.report_id, "doubter", &adult("doubter"), vote(VoteType::Dispute))
            .await
            .unwrap();

        let voted = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(voted.priority, 10);
        let ratio = crate::core::moderation::scoring::support_ratio(&voted).unwrap();
        assert!((ratio - 0.8).abs() < 1e-9);

        let action = service
            .moderator_review(
                &report.report_id,
                "mod",
                ReviewSubmission {
                    decision: ModeratorDecision::Remove,
                    reasoning: "Targeted harassment".to_string(),
                    review_time: 4,
                    evidence_reviewed: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(action.decision, ModeratorDecision::Remove);
        assert_eq!(
            service.get_report(&report.report_id).await.unwrap().status,
            ReportStatus::Reviewing
        );
        assert_eq!(*enforcer.decisions.lock().unwrap(), vec![ModeratorDecision::Remove]);

        let resolution = service
            .resolve_report(
                &report.report_id,
                "mod",
                ResolutionSubmission {
                    resolution_type: ResolutionType::ContentRemoved,
                    reasoning: "Removed".to_string(),
                    actions: vec!["content deleted".to_string()],
                    appealable: None,
                },
            )
            .await
            .unwrap();

        let resolved = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(resolved.status, ReportStatus::Resolved);
        assert_eq!(
            resolution.appeal_deadline,
            Some(resolution.resolved_at + Duration::days(7))
        );
        assert_eq!(notifier.resolutions.lock().unwrap().len(), 1);

        let stats = service.moderator_stats("mod").await.unwrap();
        assert_eq!(stats.actions_taken, 1);
    }

    #[tokio::test]
    async fn test_no_action_review_skips_enforcement() {
        let enforcer = RecordingEnforcer::default();
        let service = service_with(Severity::Low).with_enforcer(Box::new(enforcer.clone()));
        register(&service, "mod").await;
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        service
            .moderator_review(
                &report.report_id,
                "mod",
                ReviewSubmission {
                    decision: ModeratorDecision::NoAction,
                    reasoning: "Fine".to_string(),
                    review_time: 1,
                    evidence_reviewed: vec![],
                },
            )
            .await
            .unwrap();

        assert!(enforcer.decisions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_by_unknown_moderator_is_not_found() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let result = service
            .moderator_review(
                &report.report_id,
                "ghost",
                ReviewSubmission {
                    decision: ModeratorDecision::Approve,
                    reasoning: String::new(),
                    review_time: 0,
                    evidence_reviewed: vec![],
                },
            )
            .await;
        assert!(matches!(result, Err(ModerationError::NotFound { entity: "Moderator", .. })));
    }

    fn resolution(appealable: Option<bool>) -> ResolutionSubmission {
        ResolutionSubmission {
            resolution_type: ResolutionType::UserWarned,
            reasoning: "Warned".to_string(),
            actions: vec![],
            appealable,
        }
    }

    #[tokio::test]
    async fn test_double_resolution_fails() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        service
            .resolve_report(&report.report_id, "mod", resolution(None))
            .await
            .unwrap();
        let second = service
            .resolve_report(&report.report_id, "mod", resolution(None))
            .await;

        assert!(matches!(second, Err(ModerationError::AlreadyResolved(_))));
    }

    #[tokio::test]
    async fn test_votes_rejected_after_resolution() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .resolve_report(&report.report_id, "mod", resolution(Some(false)))
            .await
            .unwrap();

        let result = service
            .submit_community_vote(&report.report_id, "late", &adult("late"), vote(VoteType::Support))
            .await;
        assert!(matches!(result, Err(ModerationError::ReportClosed(_))));
    }

    #[tokio::test]
    async fn test_escalation_is_idempotent_and_keeps_submission_queue() {
        let service = service_with(Severity::Low);
        register(&service, "mod").await;
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let first = service
            .escalate_report(&report.report_id, "mod", "needs staff")
            .await
            .unwrap();
        let again = service
            .escalate_report(&report.report_id, "mod", "still needs staff")
            .await
            .unwrap();
        assert_eq!(first.status, ReportStatus::Escalated);
        assert_eq!(again.escalation, first.escalation);

        let escalated = service
            .get_moderation_queue(QueueType::Escalated, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(escalated.len(), 1);
        let community = service
            .get_moderation_queue(QueueType::Community, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(community.len(), 1);
    }

    #[tokio::test]
    async fn test_dismissed_report_cannot_be_resolved() {
        let service = service_with(Severity::Low);
        register(&service, "mod").await;
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let dismissed = service
            .dismiss_report(&report.report_id, "mod", "not a violation")
            .await
            .unwrap();
        assert_eq!(dismissed.status, ReportStatus::Dismissed);
        assert_eq!(dismissed.moderator_actions.len(), 1);

        let result = service
            .resolve_report(&report.report_id, "mod", resolution(None))
            .await;
        assert!(matches!(result, Err(ModerationError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_appeal_flow() {
        let service = service_with(Severity::Low);
        register(&service, "mod").await;
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .resolve_report(&report.report_id, "mod", resolution(None))
            .await
            .unwrap();

        service
            .appeal_report(&report.report_id, "author", "I was quoting someone")
            .await
            .unwrap();
        let appealed = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(appealed.status, ReportStatus::Appealed);

        let appeals = service
            .get_moderation_queue(QueueType::Appeals, &ReportFilters::default(), SortBy::Timestamp)
            .await
            .unwrap();
        assert_eq!(appeals.len(), 1);

        let second = service
            .appeal_report(&report.report_id, "author", "again")
            .await;
        assert!(matches!(second, Err(ModerationError::AppealNotAllowed(_))));

        let decided = service
            .decide_appeal(
                &report.report_id,
                "mod",
                AppealDecision {
                    upheld: false,
                    reasoning: "Context makes it fine".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(decided.status, ReportStatus::Dismissed);
        assert_eq!(
            decided.appeal.and_then(|a| a.outcome).map(|o| o.upheld),
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_appeal_rejected_when_not_appealable() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .resolve_report(&report.report_id, "mod", resolution(Some(false)))
            .await
            .unwrap();

        let result = service.appeal_report(&report.report_id, "author", "pls").await;
        assert!(matches!(result, Err(ModerationError::AppealNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_appeal_rejected_after_deadline() {
        let service = service_with(Severity::Low);
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .resolve_report(&report.report_id, "mod", resolution(None))
            .await
            .unwrap();

        let mut stored = service.get_report(&report.report_id).await.unwrap();
        if let Some(res) = stored.resolution.as_mut() {
            res.appeal_deadline = Some(Utc::now() - Duration::hours(1));
        }
        service.store.save_report(&stored).await.unwrap();

        let result = service.appeal_report(&report.report_id, "author", "late").await;
        assert!(matches!(result, Err(ModerationError::AppealNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_queue_filters_and_sorting() {
        let store = InMemoryReportStore::new();
        let service = ModerationService::new(
            store,
            Box::new(crate::core::moderation::KeywordSeverityClassifier::new()),
            Box::new(InMemoryModeratorStats::new()),
            ModerationConfig::default(),
        );

        let teen = MemberProfile::new("teen", AgeGroup::Teen);
        // spam/low/adult -> 7, community
        let a = service
            .submit_report("c1", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        // copyright/low/teen -> 9, priority
        service
            .submit_report("c2", "teen", &teen, submission(ReportType::Copyright))
            .await
            .unwrap();
        // other/low/adult -> 7, community
        let c = service
            .submit_report("c3", "r", &adult("r"), submission(ReportType::Other))
            .await
            .unwrap();

        let spam_only = service
            .get_moderation_queue(
                QueueType::Community,
                &ReportFilters {
                    report_type: Some(ReportType::Spam),
                    ..Default::default()
                },
                SortBy::Timestamp,
            )
            .await
            .unwrap();
        assert_eq!(spam_only.len(), 1);
        assert_eq!(spam_only[0].report_id, a.report_id);

        let none = service
            .get_moderation_queue(
                QueueType::Community,
                &ReportFilters {
                    report_type: Some(ReportType::Spam),
                    age_group: Some(AgeGroup::Teen),
                    ..Default::default()
                },
                SortBy::Timestamp,
            )
            .await
            .unwrap();
        assert!(none.is_empty());

        service
            .submit_community_vote(&a.report_id, "v", &adult("v"), vote(VoteType::Support))
            .await
            .unwrap();
        let by_votes = service
            .get_moderation_queue(QueueType::Community, &ReportFilters::default(), SortBy::CommunityVotes)
            .await
            .unwrap();
        assert_eq!(by_votes[0].report_id, a.report_id);
        assert_eq!(by_votes[1].report_id, c.report_id);
    }

    #[test]
    fn test_sort_by_timestamp_is_newest_first() {
        let now = Utc::now();
        let base = Report {
            report_id: "old".to_string(),
            content_id: "c".to_string(),
            reporter_id: "r".to_string(),
            reporter_age_group: AgeGroup::Adult,
            target_user_id: None,
            report_type: ReportType::Spam,
            category: crate::core::moderation::ReportCategory::Quality,
            description: "d".to_string(),
            severity: Severity::Low,
            evidence: vec![],
            priority: 6,
            status: ReportStatus::Pending,
            tags: vec![],
            community_votes: vec![],
            moderator_actions: vec![],
            resolution: None,
            appeal: None,
            escalation: None,
            timestamp: now - Duration::hours(2),
            updated_at: now,
        };
        let mut newer = base.clone();
        newer.report_id = "new".to_string();
        newer.timestamp = now;
        newer.priority = 5;

        let mut reports = vec![base, newer];
        sort_reports(&mut reports, SortBy::default());
        assert_eq!(reports[0].report_id, "new");

        sort_reports(&mut reports, SortBy::Priority);
        assert_eq!(reports[0].report_id, "old");
    }

    #[tokio::test]
    async fn test_metrics_count_submitted_reports() {
        let service = service_with(Severity::Medium);
        for i in 0..3 {
            service
                .submit_report(&format!("c{}", i), "r", &adult("r"), submission(ReportType::Spam))
                .await
                .unwrap();
        }

        let metrics = service
            .get_moderation_metrics(Timeframe::Daily)
            .await
            .unwrap();
        assert_eq!(metrics.total_reports, 3);
        assert_eq!(metrics.reports_by_severity.get(&Severity::Medium), Some(&3));
    }

    #[tokio::test]
    async fn test_concurrent_votes_by_same_voter_record_one() {
        let service = Arc::new(service_with(Severity::Low));
        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let id = report.report_id.clone();
            handles.push(tokio::spawn(async move {
                service
                    .submit_community_vote(&id, "same", &adult("same"), vote(VoteType::Support))
                    .await
                    .is_ok()
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        let stored = service.get_report(&report.report_id).await.unwrap();
        assert_eq!(stored.community_votes.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_report_leaves_no_lock_behind() {
        let service = service_with(Severity::Low);

        for i in 0..5 {
            let result = service
                .submit_community_vote(
                    &format!("made_up_{}", i),
                    "v",
                    &adult("v"),
                    vote(VoteType::Support),
                )
                .await;
            assert!(matches!(result, Err(ModerationError::NotFound { .. })));
        }
        assert!(service.report_locks.is_empty());

        let report = service
            .submit_report("c", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .submit_community_vote(&report.report_id, "v", &adult("v"), vote(VoteType::Support))
            .await
            .unwrap();
        assert_eq!(service.report_locks.len(), 1);
    }

    #[tokio::test]
    async fn test_queue_and_metrics_scoped_by_content_prefix() {
        let service = service_with(Severity::Low);
        let ours = service
            .submit_report("1/10/100", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        service
            .submit_report("2/20/200", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();
        // "1/" must not match a guild whose id merely starts with 1
        service
            .submit_report("11/10/100", "r", &adult("r"), submission(ReportType::Spam))
            .await
            .unwrap();

        let scoped = service
            .get_moderation_queue(
                QueueType::Community,
                &ReportFilters {
                    content_prefix: Some("1/".to_string()),
                    ..Default::default()
                },
                SortBy::Timestamp,
            )
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].report_id, ours.report_id);

        let metrics = service
            .get_moderation_metrics_for(Timeframe::Daily, Some("1/"))
            .await
            .unwrap();
        assert_eq!(metrics.total_reports, 1);

        let everything = service
            .get_moderation_metrics(Timeframe::Daily)
            .await
            .unwrap();
        assert_eq!(everything.total_reports, 3);
    }
}
