// Moderation metrics - aggregations over the reports submitted in a
// trailing window.

use super::moderation_models::{
    ModerationConfig, ModeratorDecision, Report, ReportStatus, ReportType, Severity, Timeframe,
    VoteType,
};
use super::scoring::support_ratio;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModeratorMetrics {
    pub total_actions: usize,
    pub active_moderators: usize,
    pub average_review_minutes: f64,
    pub decision_breakdown: HashMap<ModeratorDecision, usize>,
    /// Share of decided appeals that upheld the original resolution.
    pub accuracy_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityMetrics {
    pub total_votes: usize,
    pub average_votes_per_report: f64,
    pub unique_voters: usize,
    /// Mean share of non-neutral votes siding with each report's majority.
    pub agreement_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentHealthMetrics {
    pub removal_rate: f64,
    pub repeat_content_rate: f64,
    pub repeat_offender_rate: f64,
    pub appeal_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationMetrics {
    pub timeframe: Timeframe,
    pub window_start: DateTime<Utc>,
    pub total_reports: usize,
    pub pending_reports: usize,
    pub resolved_reports: usize,
    pub reports_by_status: HashMap<ReportStatus, usize>,
    pub reports_by_type: HashMap<ReportType, usize>,
    pub reports_by_severity: HashMap<Severity, usize>,
    pub average_resolution_hours: f64,
    pub consensus_rate: f64,
    pub average_priority: f64,
    pub moderators: ModeratorMetrics,
    pub community: CommunityMetrics,
    pub content_health: ContentHealthMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Aggregate metrics over `reports`. Reports outside the window are ignored,
/// so callers may pass a superset.
pub fn compute_metrics(
    reports: &[Report],
    timeframe: Timeframe,
    now: DateTime<Utc>,
    config: &ModerationConfig,
) -> ModerationMetrics {
    let window_start = now - timeframe.duration();
    let in_window: Vec<&Report> = reports
        .iter()
        .filter(|r| r.timestamp >= window_start && r.timestamp <= now)
        .collect();

    let mut reports_by_status = HashMap::new();
    let mut reports_by_type = HashMap::new();
    let mut reports_by_severity = HashMap::new();
    for report in &in_window {
        *reports_by_status.entry(report.status).or_insert(0) += 1;
        *reports_by_type.entry(report.report_type).or_insert(0) += 1;
        *reports_by_severity.entry(report.severity).or_insert(0) += 1;
    }

    let resolved: Vec<&Report> = in_window
        .iter()
        .copied()
        .filter(|r| r.resolution.is_some())
        .collect();

    let average_resolution_hours = mean(resolved.iter().filter_map(|r| {
        r.resolution
            .as_ref()
            .map(|res| (res.resolved_at - r.timestamp).num_seconds() as f64 / 3600.0)
    }));

    let voted: Vec<&Report> = in_window
        .iter()
        .copied()
        .filter(|r| r.community_votes.len() >= config.metrics_consensus_min_votes)
        .collect();
    let consensus_reached = voted
        .iter()
        .filter(|r| support_ratio(r).is_some_and(|ratio| ratio >= config.consensus_threshold))
        .count();

    let average_priority = mean(in_window.iter().map(|r| r.priority as f64));

    ModerationMetrics {
        timeframe,
        window_start,
        total_reports: in_window.len(),
        pending_reports: reports_by_status
            .get(&ReportStatus::Pending)
            .copied()
            .unwrap_or(0),
        resolved_reports: resolved.len(),
        reports_by_status,
        reports_by_type,
        reports_by_severity,
        average_resolution_hours,
        consensus_rate: ratio(consensus_reached, voted.len()),
        average_priority,
        moderators: moderator_metrics(&in_window),
        community: community_metrics(&in_window),
        content_health: content_health_metrics(&in_window),
    }
}

fn moderator_metrics(reports: &[&Report]) -> ModeratorMetrics {
    let actions: Vec<_> = reports
        .iter()
        .flat_map(|r| r.moderator_actions.iter())
        .collect();

    let mut decision_breakdown = HashMap::new();
    for action in &actions {
        *decision_breakdown.entry(action.decision).or_insert(0) += 1;
    }
    let active_moderators = actions
        .iter()
        .map(|a| a.moderator_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let decided_appeals: Vec<bool> = reports
        .iter()
        .filter_map(|r| r.appeal.as_ref().and_then(|a| a.outcome.as_ref()))
        .map(|o| o.upheld)
        .collect();
    let accuracy_score = if decided_appeals.is_empty() {
        1.0
    } else {
        ratio(
            decided_appeals.iter().filter(|upheld| **upheld).count(),
            decided_appeals.len(),
        )
    };

    ModeratorMetrics {
        total_actions: actions.len(),
        active_moderators,
        average_review_minutes: mean(actions.iter().map(|a| a.review_time as f64)),
        decision_breakdown,
        accuracy_score,
    }
}

fn community_metrics(reports: &[&Report]) -> CommunityMetrics {
    let total_votes: usize = reports.iter().map(|r| r.community_votes.len()).sum();
    let unique_voters = reports
        .iter()
        .flat_map(|r| r.community_votes.iter().map(|v| v.voter_id.as_str()))
        .collect::<HashSet<_>>()
        .len();

    let agreement_rate = mean(reports.iter().filter_map(|r| {
        let support = r
            .community_votes
            .iter()
            .filter(|v| v.vote_type == VoteType::Support)
            .count();
        let dispute = r
            .community_votes
            .iter()
            .filter(|v| v.vote_type == VoteType::Dispute)
            .count();
        let decisive = support + dispute;
        (decisive > 0).then(|| support.max(dispute) as f64 / decisive as f64)
    }));

    CommunityMetrics {
        total_votes,
        average_votes_per_report: ratio(total_votes, reports.len()),
        unique_voters,
        agreement_rate,
    }
}

fn content_health_metrics(reports: &[&Report]) -> ContentHealthMetrics {
    let resolutions: Vec<_> = reports
        .iter()
        .filter_map(|r| r.resolution.as_ref())
        .collect();
    let enforced = resolutions
        .iter()
        .filter(|res| res.resolution_type.is_enforcement())
        .count();

    let mut per_content: HashMap<&str, usize> = HashMap::new();
    let mut per_target: HashMap<&str, usize> = HashMap::new();
    for report in reports {
        *per_content.entry(report.content_id.as_str()).or_insert(0) += 1;
        if let Some(target) = report.target_user_id.as_deref() {
            *per_target.entry(target).or_insert(0) += 1;
        }
    }
    let repeated_content = per_content.values().filter(|c| **c >= 2).count();
    let repeat_offenders = per_target.values().filter(|c| **c >= 2).count();

    let appealable = resolutions.iter().filter(|res| res.appealable).count();
    let appealed = reports.iter().filter(|r| r.appeal.is_some()).count();

    ContentHealthMetrics {
        removal_rate: ratio(enforced, resolutions.len()),
        repeat_content_rate: ratio(repeated_content, per_content.len()),
        repeat_offender_rate: ratio(repeat_offenders, per_target.len()),
        appeal_rate: ratio(appealed, appealable),
    }
}
