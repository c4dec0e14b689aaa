// Moderation domain models - data structures for the community report engine.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts its command choices into these.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIG
// ============================================================================

/// Tunable thresholds for the report engine.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Votes required before consensus is evaluated
    pub consensus_min_votes: usize,
    /// Support ratio that must be exceeded for consensus
    pub consensus_threshold: f64,
    /// Weighted support sum that must be exceeded for the support boost
    pub support_boost_threshold: f64,
    /// Priority added when the support sum threshold is crossed
    pub support_boost: u8,
    /// Priority added when consensus is reached
    pub consensus_boost: u8,
    /// Priority at or above which a report is routed to the priority queue
    pub priority_queue_threshold: u8,
    /// Votes required before a report counts towards the consensus rate metric
    pub metrics_consensus_min_votes: usize,
    /// How long after resolution an appeal may be filed
    pub appeal_window: Duration,
    /// External timeout imposed on the severity classifier
    pub classifier_timeout: std::time::Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            consensus_min_votes: 5,
            consensus_threshold: 0.7,
            support_boost_threshold: 5.0,
            support_boost: 2,
            consensus_boost: 1,
            priority_queue_threshold: 8,
            metrics_consensus_min_votes: 3,
            appeal_window: Duration::days(7),
            classifier_timeout: std::time::Duration::from_secs(10),
        }
    }
}

// ============================================================================
// ENUMS
// ============================================================================

/// What a reporter says is wrong with the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    InappropriateContent,
    Misinformation,
    Harassment,
    Spam,
    PrivacyViolation,
    Copyright,
    Other,
}

impl ReportType {
    pub const ALL: [ReportType; 7] = [
        ReportType::InappropriateContent,
        ReportType::Misinformation,
        ReportType::Harassment,
        ReportType::Spam,
        ReportType::PrivacyViolation,
        ReportType::Copyright,
        ReportType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::InappropriateContent => "inappropriate_content",
            ReportType::Misinformation => "misinformation",
            ReportType::Harassment => "harassment",
            ReportType::Spam => "spam",
            ReportType::PrivacyViolation => "privacy_violation",
            ReportType::Copyright => "copyright",
            ReportType::Other => "other",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Safety,
    Quality,
    Policy,
    Legal,
}

/// Urgency label assigned at submission. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Urgent,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Urgent => "urgent",
        }
    }

    /// Parse a label as returned by a classifier. Case and surrounding
    /// whitespace are ignored; "critical" is accepted as urgent.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "urgent" | "critical" => Some(Severity::Urgent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewing,
    Escalated,
    Resolved,
    Dismissed,
    Appealed,
}

impl ReportStatus {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!(
            (self, next),
            (Pending, Reviewing)
                | (Pending, Escalated)
                | (Pending, Resolved)
                | (Pending, Dismissed)
                | (Escalated, Reviewing)
                | (Escalated, Resolved)
                | (Escalated, Dismissed)
                | (Reviewing, Escalated)
                | (Reviewing, Resolved)
                | (Reviewing, Dismissed)
                | (Resolved, Appealed)
                | (Appealed, Resolved)
                | (Appealed, Dismissed)
        )
    }

    /// Open reports still accept votes and reviews.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ReportStatus::Pending | ReportStatus::Reviewing | ReportStatus::Escalated
        )
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::Escalated => "escalated",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
            ReportStatus::Appealed => "appealed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Screenshot,
    TextQuote,
    Url,
    VideoTimestamp,
    AudioClip,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Verified,
    Disputed,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Support,
    Dispute,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratorDecision {
    Approve,
    Remove,
    Modify,
    WarnUser,
    SuspendUser,
    BanUser,
    NoAction,
}

impl ModeratorDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeratorDecision::Approve => "approve",
            ModeratorDecision::Remove => "remove",
            ModeratorDecision::Modify => "modify",
            ModeratorDecision::WarnUser => "warn_user",
            ModeratorDecision::SuspendUser => "suspend_user",
            ModeratorDecision::BanUser => "ban_user",
            ModeratorDecision::NoAction => "no_action",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approve" => Some(ModeratorDecision::Approve),
            "remove" => Some(ModeratorDecision::Remove),
            "modify" => Some(ModeratorDecision::Modify),
            "warn_user" => Some(ModeratorDecision::WarnUser),
            "suspend_user" => Some(ModeratorDecision::SuspendUser),
            "ban_user" => Some(ModeratorDecision::BanUser),
            "no_action" => Some(ModeratorDecision::NoAction),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModeratorDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratorType {
    Community,
    Volunteer,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    ContentRemoved,
    ContentModified,
    UserWarned,
    UserSuspended,
    UserBanned,
    NoViolation,
    InsufficientEvidence,
}

impl ResolutionType {
    /// Resolutions that took action against the content or its author.
    pub fn is_enforcement(&self) -> bool {
        !matches!(
            self,
            ResolutionType::NoViolation | ResolutionType::InsufficientEvidence
        )
    }
}

impl std::fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionType::ContentRemoved => "content_removed",
            ResolutionType::ContentModified => "content_modified",
            ResolutionType::UserWarned => "user_warned",
            ResolutionType::UserSuspended => "user_suspended",
            ResolutionType::UserBanned => "user_banned",
            ResolutionType::NoViolation => "no_violation",
            ResolutionType::InsufficientEvidence => "insufficient_evidence",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    Priority,
    Community,
    AiFlagged,
    Escalated,
    Appeals,
}

impl QueueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueType::Priority => "priority",
            QueueType::Community => "community",
            QueueType::AiFlagged => "ai_flagged",
            QueueType::Escalated => "escalated",
            QueueType::Appeals => "appeals",
        }
    }
}

impl std::fmt::Display for QueueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Teen,
    #[default]
    Adult,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teen => "teen",
            AgeGroup::Adult => "adult",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "child" => Some(AgeGroup::Child),
            "teen" => Some(AgeGroup::Teen),
            "adult" => Some(AgeGroup::Adult),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationSource {
    UrgentSeverity,
    CommunityConsensus,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Priority,
    Severity,
    CommunityVotes,
    #[default]
    Timestamp,
}

/// Trailing window used by the metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Timeframe {
    pub fn duration(&self) -> Duration {
        match self {
            Timeframe::Daily => Duration::hours(24),
            Timeframe::Weekly => Duration::days(7),
            Timeframe::Monthly => Duration::days(30),
            Timeframe::Quarterly => Duration::days(90),
        }
    }
}

// ============================================================================
// PROFILES
// ============================================================================

/// A reporter's or voter's profile as known to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user_id: String,
    pub age_group: AgeGroup,
}

impl MemberProfile {
    pub fn new(user_id: impl Into<String>, age_group: AgeGroup) -> Self {
        Self {
            user_id: user_id.into(),
            age_group,
        }
    }
}

/// Reputation and permission metadata for someone acting on reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratorProfile {
    pub moderator_id: String,
    pub reputation: u32,
    pub permissions: Vec<String>,
}

/// Reputation at which a community moderator counts as a volunteer.
const VOLUNTEER_REPUTATION: u32 = 500;

impl ModeratorProfile {
    pub fn moderator_type(&self) -> ModeratorType {
        if self
            .permissions
            .iter()
            .any(|p| p == "admin" || p == "staff")
        {
            ModeratorType::Staff
        } else if self.reputation >= VOLUNTEER_REPUTATION {
            ModeratorType::Volunteer
        } else {
            ModeratorType::Community
        }
    }
}

// ============================================================================
// REPORT AND ITS PARTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: String,
    pub evidence_type: EvidenceType,
    pub content: String,
    pub description: Option<String>,
    pub verification_status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Evidence as supplied by a reporter, before the engine assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceInput {
    pub evidence_type: EvidenceType,
    pub content: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityVote {
    pub voter_id: String,
    pub vote_type: VoteType,
    pub confidence: f64,
    pub reasoning: Option<String>,
    /// Frozen at cast time.
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratorAction {
    pub action_id: String,
    pub moderator_id: String,
    pub moderator_type: ModeratorType,
    pub decision: ModeratorDecision,
    pub reasoning: String,
    /// Minutes spent reviewing.
    pub review_time: u32,
    pub evidence_reviewed: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResolution {
    pub resolution_type: ResolutionType,
    pub resolver_id: String,
    pub reasoning: String,
    pub actions: Vec<String>,
    pub resolved_at: DateTime<Utc>,
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealOutcome {
    pub upheld: bool,
    pub decided_by: String,
    pub reasoning: String,
    pub decided_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub appellant_id: String,
    pub reason: String,
    pub filed_at: DateTime<Utc>,
    pub outcome: Option<AppealOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub source: EscalationSource,
    pub escalated_by: Option<String>,
    pub reason: String,
    pub escalated_at: DateTime<Utc>,
}

/// A user-submitted flag against a piece of content.
///
/// Reports are append-only: votes, actions and the resolution accumulate,
/// and nothing is ever removed from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub content_id: String,
    pub reporter_id: String,
    pub reporter_age_group: AgeGroup,
    pub target_user_id: Option<String>,
    pub report_type: ReportType,
    pub category: ReportCategory,
    pub description: String,
    pub severity: Severity,
    pub evidence: Vec<Evidence>,
    pub priority: u8,
    pub status: ReportStatus,
    pub tags: Vec<String>,
    pub community_votes: Vec<CommunityVote>,
    pub moderator_actions: Vec<ModeratorAction>,
    pub resolution: Option<ReportResolution>,
    pub appeal: Option<Appeal>,
    pub escalation: Option<Escalation>,
    pub timestamp: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn has_vote_from(&self, voter_id: &str) -> bool {
        self.community_votes.iter().any(|v| v.voter_id == voter_id)
    }

    /// Sum of vote weights for one vote type.
    pub fn weight_for(&self, vote_type: VoteType) -> f64 {
        self.community_votes
            .iter()
            .filter(|v| v.vote_type == vote_type)
            .map(|v| v.weight)
            .sum()
    }

    pub fn total_vote_weight(&self) -> f64 {
        self.community_votes.iter().map(|v| v.weight).sum()
    }
}

// ============================================================================
// OPERATION INPUTS
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReportSubmission {
    pub report_type: ReportType,
    pub description: String,
    pub evidence: Vec<EvidenceInput>,
    pub tags: Vec<String>,
    pub target_user_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VoteSubmission {
    pub vote_type: VoteType,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReviewSubmission {
    pub decision: ModeratorDecision,
    pub reasoning: String,
    pub review_time: u32,
    pub evidence_reviewed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolutionSubmission {
    pub resolution_type: ResolutionType,
    pub reasoning: String,
    pub actions: Vec<String>,
    /// `None` means appealable.
    pub appealable: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AppealDecision {
    pub upheld: bool,
    pub reasoning: String,
}

/// Active queue filters. Every `Some` field must match.
#[derive(Debug, Clone, Default)]
pub struct ReportFilters {
    pub report_type: Option<ReportType>,
    pub severity: Option<Severity>,
    pub age_group: Option<AgeGroup>,
    /// Only reports whose content id starts with this.
    pub content_prefix: Option<String>,
}

impl ReportFilters {
    pub fn matches(&self, report: &Report) -> bool {
        self.report_type.map_or(true, |t| report.report_type == t)
            && self.severity.map_or(true, |s| report.severity == s)
            && self.age_group.map_or(true, |a| report.reporter_age_group == a)
            && self
                .content_prefix
                .as_deref()
                .map_or(true, |p| report.content_id.starts_with(p))
    }
}

/// Generate an id of the form `<prefix>_<unix-millis>_<suffix>`.
pub fn generate_id(prefix: &str) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}
