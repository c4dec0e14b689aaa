use super::message_ref::MessageRef;
use crate::core::moderation::{
    ModerationMetrics, ModeratorStats, QueueType, Report, ReportResolution, ReportStatus,
    ReportType, Severity, VoteType,
};
use poise::serenity_prelude::{self as serenity, CreateEmbed, CreateEmbedFooter};

/// Discord rejects field values longer than this.
const FIELD_LIMIT: usize = 1024;
/// Reports listed per queue page.
pub const QUEUE_PAGE_SIZE: usize = 10;

pub fn severity_colour(severity: Severity) -> serenity::Colour {
    match severity {
        Severity::Low => serenity::Colour::from_rgb(87, 242, 135),
        Severity::Medium => serenity::Colour::from_rgb(254, 231, 92),
        Severity::High => serenity::Colour::from_rgb(230, 126, 34),
        Severity::Urgent => serenity::Colour::from_rgb(237, 66, 69),
    }
}

/// Full view of one report, used for submissions, alerts and lookups.
pub fn report_embed(report: &Report) -> CreateEmbed {
    let support = report.weight_for(VoteType::Support);
    let dispute = report.weight_for(VoteType::Dispute);

    let mut embed = CreateEmbed::new()
        .title(format!("Report {}", report.report_id))
        .description(truncate(&report.description, 4000))
        .color(severity_colour(report.severity))
        .field("Content", content_label(&report.content_id), false)
        .field("Type", report.report_type.to_string(), true)
        .field("Severity", report.severity.to_string(), true)
        .field("Priority", format!("{}/10", report.priority), true)
        .field("Status", report.status.to_string(), true)
        .field(
            "Votes",
            format!(
                "{} cast (support {:.1} / dispute {:.1})",
                report.community_votes.len(),
                support,
                dispute
            ),
            true,
        )
        .field("Filed", relative_time(report.timestamp), true)
        .footer(CreateEmbedFooter::new(format!(
            "Reporter: {}",
            report.reporter_id
        )));

    if let Some(target) = &report.target_user_id {
        embed = embed.field("Reported user", format!("<@{}>", target), true);
    }

    if !report.evidence.is_empty() {
        let lines: Vec<String> = report
            .evidence
            .iter()
            .map(|e| {
                format!(
                    "`{}` {:?}: {} ({:?})",
                    e.evidence_id, e.evidence_type, e.content, e.verification_status
                )
            })
            .collect();
        embed = embed.field("Evidence", truncate(&lines.join("\n"), FIELD_LIMIT), false);
    }

    if let Some(escalation) = &report.escalation {
        embed = embed.field(
            "Escalated",
            truncate(&escalation.reason, FIELD_LIMIT),
            false,
        );
    }

    if let Some(resolution) = &report.resolution {
        embed = embed.field(
            "Resolution",
            truncate(
                &format!("{}: {}", resolution.resolution_type, resolution.reasoning),
                FIELD_LIMIT,
            ),
            false,
        );
    }

    if let Some(appeal) = &report.appeal {
        let state = match &appeal.outcome {
            None => "pending".to_string(),
            Some(outcome) if outcome.upheld => "upheld".to_string(),
            Some(_) => "overturned".to_string(),
        };
        embed = embed.field(
            format!("Appeal ({})", state),
            truncate(&appeal.reason, FIELD_LIMIT),
            false,
        );
    }

    embed
}

pub fn queue_embed(queue: QueueType, reports: &[Report]) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(format!("📋 {} queue", queue))
        .color(serenity::Colour::from_rgb(88, 101, 242))
        .timestamp(serenity::Timestamp::now());

    if reports.is_empty() {
        return embed.description("Nothing waiting here. 🎉");
    }

    embed = embed.description(format!(
        "Showing {} of {} report(s)",
        reports.len().min(QUEUE_PAGE_SIZE),
        reports.len()
    ));

    for report in reports.iter().take(QUEUE_PAGE_SIZE) {
        embed = embed.field(
            format!("{} · {}", report.report_id, report.status),
            queue_line(report),
            false,
        );
    }

    embed
}

/// One-line summary shown for each report in a queue listing.
pub fn queue_line(report: &Report) -> String {
    let line = format!(
        "**{}** {} · P{} · {} vote(s) · {}\n{}",
        report.severity,
        report.report_type,
        report.priority,
        report.community_votes.len(),
        relative_time(report.timestamp),
        report.description
    );
    truncate(&line, 300)
}

pub fn resolution_embed(report: &Report, resolution: &ReportResolution) -> CreateEmbed {
    let appeal = match (resolution.appealable, resolution.appeal_deadline) {
        (true, Some(deadline)) => format!("Appealable until {}", relative_time(deadline)),
        _ => "Not appealable".to_string(),
    };

    CreateEmbed::new()
        .title(format!("✅ Report {} resolved", report.report_id))
        .description(truncate(&resolution.reasoning, 4000))
        .color(serenity::Colour::from_rgb(87, 242, 135))
        .field("Outcome", resolution.resolution_type.to_string(), true)
        .field("Resolved by", format!("<@{}>", resolution.resolver_id), true)
        .field("Appeal", appeal, false)
        .field("Content", content_label(&report.content_id), false)
        .timestamp(serenity::Timestamp::now())
}

pub fn metrics_embed(metrics: &ModerationMetrics) -> CreateEmbed {
    let by_type: Vec<String> = ReportType::ALL
        .iter()
        .filter_map(|report_type| {
            metrics
                .reports_by_type
                .get(report_type)
                .map(|count| format!("{}: {}", report_type, count))
        })
        .collect();

    let by_severity: Vec<String> = [
        Severity::Urgent,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ]
    .iter()
    .map(|severity| {
        let count = metrics.reports_by_severity.get(severity).copied().unwrap_or(0);
        format!("{}: {}", severity, count)
    })
    .collect();

    let status_count = |status: ReportStatus| {
        metrics.reports_by_status.get(&status).copied().unwrap_or(0)
    };

    let mut decisions: Vec<String> = metrics
        .moderators
        .decision_breakdown
        .iter()
        .map(|(decision, count)| format!("{}: {}", decision, count))
        .collect();
    decisions.sort();

    CreateEmbed::new()
        .title("📊 Moderation metrics")
        .description(format!(
            "Since {}",
            relative_time(metrics.window_start)
        ))
        .color(serenity::Colour::from_rgb(88, 101, 242))
        .field(
            "Reports",
            format!(
                "{} total · {} open · {} resolved\n{} escalated · {} under appeal\nAvg priority {:.1}",
                metrics.total_reports,
                metrics.pending_reports,
                metrics.resolved_reports,
                status_count(ReportStatus::Escalated),
                status_count(ReportStatus::Appealed),
                metrics.average_priority
            ),
            false,
        )
        .field(
            "By type",
            if by_type.is_empty() {
                "No reports".to_string()
            } else {
                truncate(&by_type.join("\n"), FIELD_LIMIT)
            },
            true,
        )
        .field("By severity", by_severity.join("\n"), true)
        .field(
            "Speed",
            format!(
                "Avg resolution {:.1}h\nAvg review {:.1} min",
                metrics.average_resolution_hours, metrics.moderators.average_review_minutes
            ),
            true,
        )
        .field(
            "Moderators",
            format!(
                "{} actions by {} moderator(s)\nAccuracy {}\n{}",
                metrics.moderators.total_actions,
                metrics.moderators.active_moderators,
                percent(metrics.moderators.accuracy_score),
                decisions.join(" · ")
            ),
            true,
        )
        .field(
            "Community",
            format!(
                "{} votes from {} voter(s), {:.1} per report\nConsensus {} · Agreement {}",
                metrics.community.total_votes,
                metrics.community.unique_voters,
                metrics.community.average_votes_per_report,
                percent(metrics.consensus_rate),
                percent(metrics.community.agreement_rate)
            ),
            true,
        )
        .field(
            "Content health",
            format!(
                "Removal {} · Appeals {}\nRepeat content {} · Repeat offenders {}",
                percent(metrics.content_health.removal_rate),
                percent(metrics.content_health.appeal_rate),
                percent(metrics.content_health.repeat_content_rate),
                percent(metrics.content_health.repeat_offender_rate)
            ),
            false,
        )
        .timestamp(serenity::Timestamp::now())
}

pub fn stats_embed(stats: &ModeratorStats) -> CreateEmbed {
    let mut decisions: Vec<String> = stats
        .decisions
        .iter()
        .map(|(decision, count)| format!("{}: {}", decision, count))
        .collect();
    decisions.sort();

    let last = stats
        .last_action_at
        .map(relative_time)
        .unwrap_or_else(|| "never".to_string());

    CreateEmbed::new()
        .title("🛡️ Moderator stats")
        .description(format!("<@{}>", stats.moderator_id))
        .color(serenity::Colour::from_rgb(88, 101, 242))
        .field("Actions", stats.actions_taken.to_string(), true)
        .field(
            "Avg review",
            format!("{:.1} min", stats.average_review_minutes()),
            true,
        )
        .field("Last action", last, true)
        .field(
            "Decisions",
            if decisions.is_empty() {
                "None yet".to_string()
            } else {
                decisions.join("\n")
            },
            false,
        )
}

fn content_label(content_id: &str) -> String {
    match MessageRef::from_content_id(content_id) {
        Some(message) => format!("[Jump to message]({})", message.link()),
        None => format!("`{}`", content_id),
    }
}

fn relative_time(at: chrono::DateTime<chrono::Utc>) -> String {
    format!("<t:{}:R>", at.timestamp())
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let cut = truncate("ééééé", 3);
        assert_eq!(cut.chars().count(), 3);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_content_label_links_discord_messages() {
        assert_eq!(
            content_label("1/2/3"),
            "[Jump to message](https://discord.com/channels/1/2/3)"
        );
        assert_eq!(content_label("post-42"), "`post-42`");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.756), "76%");
        assert_eq!(percent(1.0), "100%");
    }
}
