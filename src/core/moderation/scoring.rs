// Scoring rules for reports - category lookup, priority formula, vote weights
// and consensus. Everything here is a pure function of its inputs.

use super::moderation_models::{
    AgeGroup, ModerationConfig, QueueType, Report, ReportCategory, ReportType, Severity, VoteType,
};

/// Every report starts from this priority before weights are added.
pub const BASE_PRIORITY: u8 = 5;
/// Priority is clamped to this value.
pub const MAX_PRIORITY: u8 = 10;

pub fn category_for(report_type: ReportType) -> ReportCategory {
    match report_type {
        ReportType::InappropriateContent => ReportCategory::Safety,
        ReportType::Harassment => ReportCategory::Safety,
        ReportType::PrivacyViolation => ReportCategory::Safety,
        ReportType::Misinformation => ReportCategory::Quality,
        ReportType::Spam => ReportCategory::Quality,
        ReportType::Copyright => ReportCategory::Legal,
        ReportType::Other => ReportCategory::Policy,
    }
}

pub fn severity_weight(severity: Severity) -> u8 {
    match severity {
        Severity::Low => 1,
        Severity::Medium => 3,
        Severity::High => 6,
        Severity::Urgent => 10,
    }
}

pub fn report_type_weight(report_type: ReportType) -> u8 {
    match report_type {
        ReportType::Harassment => 4,
        ReportType::InappropriateContent => 3,
        ReportType::PrivacyViolation => 3,
        ReportType::Misinformation => 2,
        ReportType::Spam => 1,
        ReportType::Copyright => 1,
        ReportType::Other => 1,
    }
}

/// Younger reporters get their reports looked at sooner.
pub fn age_group_bonus(age_group: AgeGroup) -> u8 {
    match age_group {
        AgeGroup::Child => 3,
        AgeGroup::Teen => 2,
        AgeGroup::Adult => 0,
    }
}

/// `min(10, 5 + severity + type + age bonus)`.
pub fn calculate_priority(severity: Severity, report_type: ReportType, age_group: AgeGroup) -> u8 {
    let raw = BASE_PRIORITY
        + severity_weight(severity)
        + report_type_weight(report_type)
        + age_group_bonus(age_group);
    raw.min(MAX_PRIORITY)
}

/// Queue a new report is routed into. Decided once, at submission.
pub fn initial_queue(priority: u8, severity: Severity, config: &ModerationConfig) -> QueueType {
    if priority >= config.priority_queue_threshold || severity == Severity::Urgent {
        QueueType::Priority
    } else {
        QueueType::Community
    }
}

/// Initial vote weight for a voter seen for the first time.
pub fn vote_weight_for(age_group: AgeGroup) -> f64 {
    match age_group {
        AgeGroup::Adult => 1.2,
        AgeGroup::Teen => 0.8,
        AgeGroup::Child => 0.6,
    }
}

/// Fraction of the total vote weight that supports the report.
/// `None` when no weight has been cast.
pub fn support_ratio(report: &Report) -> Option<f64> {
    let total = report.total_vote_weight();
    if total <= 0.0 {
        return None;
    }
    Some(report.weight_for(VoteType::Support) / total)
}

/// Whether the report's votes amount to a consensus in favour of the report.
pub fn has_consensus(report: &Report, config: &ModerationConfig) -> bool {
    report.community_votes.len() >= config.consensus_min_votes
        && support_ratio(report).is_some_and(|r| r > config.consensus_threshold)
}

/// Add `boost` to `priority` without exceeding the cap.
pub fn boosted(priority: u8, boost: u8) -> u8 {
    priority.saturating_add(boost).min(MAX_PRIORITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_clamps_to_ten() {
        let p = calculate_priority(Severity::Urgent, ReportType::Harassment, AgeGroup::Child);
        assert_eq!(p, 10);
    }

    #[test]
    fn test_priority_low_copyright_adult() {
        let p = calculate_priority(Severity::Low, ReportType::Copyright, AgeGroup::Adult);
        assert_eq!(p, 7);
    }

    #[test]
    fn test_priority_never_exceeds_cap() {
        for report_type in ReportType::ALL {
            for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Urgent] {
                for age in [AgeGroup::Child, AgeGroup::Teen, AgeGroup::Adult] {
                    let p = calculate_priority(severity, report_type, age);
                    assert!((1..=MAX_PRIORITY).contains(&p));
                }
            }
        }
    }

    #[test]
    fn test_category_table() {
        assert_eq!(category_for(ReportType::Harassment), ReportCategory::Safety);
        assert_eq!(category_for(ReportType::Copyright), ReportCategory::Legal);
        assert_eq!(category_for(ReportType::Spam), ReportCategory::Quality);
        assert_eq!(category_for(ReportType::Other), ReportCategory::Policy);
    }

    #[test]
    fn test_initial_queue_routing() {
        let config = ModerationConfig::default();
        assert_eq!(
            initial_queue(8, Severity::Medium, &config),
            QueueType::Priority
        );
        assert_eq!(
            initial_queue(7, Severity::Low, &config),
            QueueType::Community
        );
        assert_eq!(
            initial_queue(6, Severity::Urgent, &config),
            QueueType::Priority
        );
    }

    #[test]
    fn test_boost_is_capped() {
        assert_eq!(boosted(9, 2), 10);
        assert_eq!(boosted(10, 1), 10);
        assert_eq!(boosted(6, 2), 8);
    }

    fn voted_report(support: usize, dispute: usize) -> Report {
        use crate::core::moderation::moderation_models::{CommunityVote, ReportStatus};
        use chrono::Utc;

        let now = Utc::now();
        let ballot = |i: usize, vote_type: VoteType| CommunityVote {
            voter_id: format!("{:?}{}", vote_type, i),
            vote_type,
            confidence: 1.0,
            reasoning: None,
            weight: 1.0,
            timestamp: now,
        };
        let community_votes = (0..support)
            .map(|i| ballot(i, VoteType::Support))
            .chain((0..dispute).map(|i| ballot(i, VoteType::Dispute)))
            .collect();

        Report {
            report_id: "r".to_string(),
            content_id: "c".to_string(),
            reporter_id: "reporter".to_string(),
            reporter_age_group: AgeGroup::Adult,
            target_user_id: None,
            report_type: ReportType::Spam,
            category: ReportCategory::Quality,
            description: "spam".to_string(),
            severity: Severity::Low,
            evidence: vec![],
            priority: 7,
            status: ReportStatus::Pending,
            tags: vec![],
            community_votes,
            moderator_actions: vec![],
            resolution: None,
            appeal: None,
            escalation: None,
            timestamp: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_consensus_needs_more_than_threshold() {
        let config = ModerationConfig::default();

        let at_threshold = voted_report(7, 3);
        assert_eq!(support_ratio(&at_threshold), Some(0.7));
        assert!(!has_consensus(&at_threshold, &config));

        assert!(has_consensus(&voted_report(8, 2), &config));
    }

    #[test]
    fn test_consensus_needs_minimum_votes() {
        let config = ModerationConfig::default();
        assert!(!has_consensus(&voted_report(4, 0), &config));
        assert!(has_consensus(&voted_report(5, 0), &config));
        assert_eq!(support_ratio(&voted_report(0, 0)), None);
    }
}
