// Slash command option enums.
//
// Discord needs a fixed list of choices per option, so each core enum that a
// command accepts gets a mirror here with a human-readable name.

use crate::core::moderation::{
    AgeGroup, ModeratorDecision, QueueType, ReportType, ResolutionType, Severity, SortBy,
    Timeframe, VerificationStatus, VoteType,
};

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ReportTypeChoice {
    #[name = "Inappropriate content"]
    InappropriateContent,
    #[name = "Misinformation"]
    Misinformation,
    #[name = "Harassment"]
    Harassment,
    #[name = "Spam"]
    Spam,
    #[name = "Privacy violation"]
    PrivacyViolation,
    #[name = "Copyright"]
    Copyright,
    #[name = "Other"]
    Other,
}

impl From<ReportTypeChoice> for ReportType {
    fn from(value: ReportTypeChoice) -> Self {
        match value {
            ReportTypeChoice::InappropriateContent => ReportType::InappropriateContent,
            ReportTypeChoice::Misinformation => ReportType::Misinformation,
            ReportTypeChoice::Harassment => ReportType::Harassment,
            ReportTypeChoice::Spam => ReportType::Spam,
            ReportTypeChoice::PrivacyViolation => ReportType::PrivacyViolation,
            ReportTypeChoice::Copyright => ReportType::Copyright,
            ReportTypeChoice::Other => ReportType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SeverityChoice {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<SeverityChoice> for Severity {
    fn from(value: SeverityChoice) -> Self {
        match value {
            SeverityChoice::Low => Severity::Low,
            SeverityChoice::Medium => Severity::Medium,
            SeverityChoice::High => Severity::High,
            SeverityChoice::Urgent => Severity::Urgent,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum VoteChoice {
    #[name = "Support - this breaks the rules"]
    Support,
    #[name = "Dispute - this is fine"]
    Dispute,
    #[name = "Neutral"]
    Neutral,
}

impl From<VoteChoice> for VoteType {
    fn from(value: VoteChoice) -> Self {
        match value {
            VoteChoice::Support => VoteType::Support,
            VoteChoice::Dispute => VoteType::Dispute,
            VoteChoice::Neutral => VoteType::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum DecisionChoice {
    #[name = "Approve content"]
    Approve,
    #[name = "Remove content"]
    Remove,
    #[name = "Modify content"]
    Modify,
    #[name = "Warn user"]
    WarnUser,
    #[name = "Suspend user"]
    SuspendUser,
    #[name = "Ban user"]
    BanUser,
    #[name = "No action"]
    NoAction,
}

impl From<DecisionChoice> for ModeratorDecision {
    fn from(value: DecisionChoice) -> Self {
        match value {
            DecisionChoice::Approve => ModeratorDecision::Approve,
            DecisionChoice::Remove => ModeratorDecision::Remove,
            DecisionChoice::Modify => ModeratorDecision::Modify,
            DecisionChoice::WarnUser => ModeratorDecision::WarnUser,
            DecisionChoice::SuspendUser => ModeratorDecision::SuspendUser,
            DecisionChoice::BanUser => ModeratorDecision::BanUser,
            DecisionChoice::NoAction => ModeratorDecision::NoAction,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ResolutionChoice {
    #[name = "Content removed"]
    ContentRemoved,
    #[name = "Content modified"]
    ContentModified,
    #[name = "User warned"]
    UserWarned,
    #[name = "User suspended"]
    UserSuspended,
    #[name = "User banned"]
    UserBanned,
    #[name = "No violation"]
    NoViolation,
    #[name = "Insufficient evidence"]
    InsufficientEvidence,
}

impl From<ResolutionChoice> for ResolutionType {
    fn from(value: ResolutionChoice) -> Self {
        match value {
            ResolutionChoice::ContentRemoved => ResolutionType::ContentRemoved,
            ResolutionChoice::ContentModified => ResolutionType::ContentModified,
            ResolutionChoice::UserWarned => ResolutionType::UserWarned,
            ResolutionChoice::UserSuspended => ResolutionType::UserSuspended,
            ResolutionChoice::UserBanned => ResolutionType::UserBanned,
            ResolutionChoice::NoViolation => ResolutionType::NoViolation,
            ResolutionChoice::InsufficientEvidence => ResolutionType::InsufficientEvidence,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum QueueChoice {
    Priority,
    Community,
    #[name = "AI flagged"]
    AiFlagged,
    Escalated,
    Appeals,
}

impl From<QueueChoice> for QueueType {
    fn from(value: QueueChoice) -> Self {
        match value {
            QueueChoice::Priority => QueueType::Priority,
            QueueChoice::Community => QueueType::Community,
            QueueChoice::AiFlagged => QueueType::AiFlagged,
            QueueChoice::Escalated => QueueType::Escalated,
            QueueChoice::Appeals => QueueType::Appeals,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum SortChoice {
    #[name = "Newest first"]
    Timestamp,
    #[name = "Highest priority"]
    Priority,
    #[name = "Most severe"]
    Severity,
    #[name = "Most votes"]
    CommunityVotes,
}

impl From<SortChoice> for SortBy {
    fn from(value: SortChoice) -> Self {
        match value {
            SortChoice::Timestamp => SortBy::Timestamp,
            SortChoice::Priority => SortBy::Priority,
            SortChoice::Severity => SortBy::Severity,
            SortChoice::CommunityVotes => SortBy::CommunityVotes,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum TimeframeChoice {
    #[name = "Last 24 hours"]
    Daily,
    #[name = "Last 7 days"]
    Weekly,
    #[name = "Last 30 days"]
    Monthly,
    #[name = "Last 90 days"]
    Quarterly,
}

impl From<TimeframeChoice> for Timeframe {
    fn from(value: TimeframeChoice) -> Self {
        match value {
            TimeframeChoice::Daily => Timeframe::Daily,
            TimeframeChoice::Weekly => Timeframe::Weekly,
            TimeframeChoice::Monthly => Timeframe::Monthly,
            TimeframeChoice::Quarterly => Timeframe::Quarterly,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum AgeGroupChoice {
    Child,
    Teen,
    Adult,
}

impl From<AgeGroupChoice> for AgeGroup {
    fn from(value: AgeGroupChoice) -> Self {
        match value {
            AgeGroupChoice::Child => AgeGroup::Child,
            AgeGroupChoice::Teen => AgeGroup::Teen,
            AgeGroupChoice::Adult => AgeGroup::Adult,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum VerificationChoice {
    Verified,
    Disputed,
    Invalid,
    #[name = "Reset to unverified"]
    Unverified,
}

impl From<VerificationChoice> for VerificationStatus {
    fn from(value: VerificationChoice) -> Self {
        match value {
            VerificationChoice::Verified => VerificationStatus::Verified,
            VerificationChoice::Disputed => VerificationStatus::Disputed,
            VerificationChoice::Invalid => VerificationStatus::Invalid,
            VerificationChoice::Unverified => VerificationStatus::Unverified,
        }
    }
}
