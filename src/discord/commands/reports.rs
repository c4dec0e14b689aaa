// Discord commands for members: filing reports, voting on them, appealing.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call the moderation service
// 3. Format the response based on the result
//
// Everything that decides what happens to a report lives in the core.

use super::choices::{ReportTypeChoice, VoteChoice};
use crate::core::moderation::{
    EvidenceInput, EvidenceType, ModerationError, ModerationService, Report, ReportStore,
    ReportSubmission, VoteSubmission,
};
use crate::discord::moderation::embeds::report_embed;
use crate::discord::moderation::message_ref::{in_guild, member_key};
use crate::discord::moderation::MessageRef;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
pub struct Data {
    pub moderation: Arc<ModerationService<Box<dyn ReportStore>>>,
}

/// A report filed in another server looks exactly like a missing one.
pub fn ensure_in_guild(report: &Report, guild_id: u64) -> Result<(), ModerationError> {
    if in_guild(&report.content_id, guild_id) {
        Ok(())
    } else {
        Err(ModerationError::report_not_found(&report.report_id))
    }
}

/// Load a report, but only if it was filed in the server the command runs in.
pub async fn guild_report(ctx: Context<'_>, report_id: &str) -> Result<Report, Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let report = ctx.data().moderation.get_report(report_id).await?;
    ensure_in_guild(&report, guild_id.get())?;
    Ok(report)
}

/// Report a message to the moderators and the community.
#[poise::command(slash_command, guild_only)]
pub async fn report(
    ctx: Context<'_>,
    #[description = "Link to the message (right click > Copy Message Link)"] message_link: String,
    #[description = "What kind of problem is it?"] report_type: ReportTypeChoice,
    #[description = "Describe what is wrong"] description: String,
    #[description = "Link to a screenshot or other evidence"] evidence_url: Option<String>,
    #[description = "Comma-separated tags"] tags: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let message = MessageRef::from_link(&message_link)
        .ok_or("That doesn't look like a message link from a server.")?;
    if message.guild_id != guild_id.get() {
        return Err("You can only report messages from this server.".into());
    }

    // Classification can take a while
    ctx.defer_ephemeral().await?;

    // Best effort: without an author the report still stands, it just can't
    // be enforced against a user
    let target_user_id = match serenity::ChannelId::new(message.channel_id)
        .message(&ctx, serenity::MessageId::new(message.message_id))
        .await
    {
        Ok(msg) => Some(msg.author.id.get().to_string()),
        Err(e) => {
            tracing::warn!(
                content_id = %message.content_id(),
                error = %e,
                "Could not fetch reported message"
            );
            None
        }
    };

    let evidence: Vec<EvidenceInput> = evidence_url
        .into_iter()
        .map(|url| EvidenceInput {
            evidence_type: EvidenceType::Url,
            content: url,
            description: None,
        })
        .collect();

    let tags: Vec<String> = split_list(tags)
        .into_iter()
        .map(|t| t.to_lowercase())
        .collect();

    let reporter_id = ctx.author().id.get().to_string();
    let moderation = &ctx.data().moderation;
    let reporter = moderation
        .member_profile(&member_key(guild_id.get(), ctx.author().id.get()))
        .await?;
    let report = moderation
        .submit_report(
            &message.content_id(),
            &reporter_id,
            &reporter,
            ReportSubmission {
                report_type: report_type.into(),
                description,
                evidence,
                tags,
                target_user_id,
            },
        )
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .content("📨 Thanks! Your report has been filed.")
            .embed(report_embed(&report))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Vote on whether a report is valid.
#[poise::command(slash_command, guild_only)]
pub async fn vote(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Your verdict"] verdict: VoteChoice,
    #[description = "How sure are you, 0.0 to 1.0 (default: 1.0)"] confidence: Option<f64>,
    #[description = "Why you voted this way"] reasoning: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let report = guild_report(ctx, &report_id).await?;
    if report.reporter_id == ctx.author().id.get().to_string() {
        ctx.send(
            poise::CreateReply::default()
                .content("You can't vote on your own report.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let voter_id = member_key(guild_id.get(), ctx.author().id.get());
    let moderation = &ctx.data().moderation;
    let voter = moderation.member_profile(&voter_id).await?;
    let vote = moderation
        .submit_community_vote(
            &report_id,
            &voter_id,
            &voter,
            VoteSubmission {
                vote_type: verdict.into(),
                confidence: confidence.unwrap_or(1.0),
                reasoning,
            },
        )
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "🗳️ Vote recorded on `{}` ({:?}, weight {:.1}).",
                report_id, vote.vote_type, vote.weight
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Appeal the resolution of a report against your content.
#[poise::command(slash_command, guild_only)]
pub async fn appeal(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Why the decision should be reconsidered"] reason: String,
) -> Result<(), Error> {
    let appellant_id = ctx.author().id.get().to_string();
    let report = guild_report(ctx, &report_id).await?;
    if report.target_user_id.as_deref() != Some(appellant_id.as_str()) {
        ctx.send(
            poise::CreateReply::default()
                .content("Only the author of the reported message can appeal.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.data()
        .moderation
        .appeal_report(&report_id, &appellant_id, &reason)
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "📮 Your appeal for `{}` has been sent to the moderators.",
                report_id
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Look up a report.
#[poise::command(slash_command, guild_only)]
pub async fn report_info(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
) -> Result<(), Error> {
    let report = guild_report(ctx, &report_id).await?;
    ctx.send(
        poise::CreateReply::default()
            .embed(report_embed(&report))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Split an optional comma-separated option into trimmed, non-empty items.
pub fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some(" spam, ,scam ,".to_string())),
            vec!["spam".to_string(), "scam".to_string()]
        );
        assert!(split_list(None).is_empty());
    }

    #[tokio::test]
    async fn test_reports_from_other_guilds_are_not_found() {
        use crate::core::moderation::{
            KeywordSeverityClassifier, MemberProfile, ModerationConfig, ReportType,
        };
        use crate::infra::moderation::{InMemoryModeratorStats, InMemoryReportStore};

        let service = ModerationService::new(
            InMemoryReportStore::new(),
            Box::new(KeywordSeverityClassifier::new()),
            Box::new(InMemoryModeratorStats::new()),
            ModerationConfig::default(),
        );
        let report = service
            .submit_report(
                "111/222/333",
                "42",
                &MemberProfile::new("111:42", Default::default()),
                ReportSubmission {
                    report_type: ReportType::Spam,
                    description: "buy followers".to_string(),
                    evidence: vec![],
                    tags: vec![],
                    target_user_id: Some("7".to_string()),
                },
            )
            .await
            .unwrap();

        assert!(ensure_in_guild(&report, 111).is_ok());
        assert!(matches!(
            ensure_in_guild(&report, 999),
            Err(ModerationError::NotFound { .. })
        ));
    }
}
