// Moderator slash commands: working the queues, reviewing, resolving.

use super::choices::{
    AgeGroupChoice, DecisionChoice, QueueChoice, ReportTypeChoice, ResolutionChoice,
    SeverityChoice, SortChoice, TimeframeChoice, VerificationChoice,
};
use super::reports::{guild_report, split_list, Context, Error};
use crate::core::moderation::{
    AppealDecision, MemberProfile, ModeratorProfile, QueueType, ReportFilters,
    ResolutionSubmission, ReviewSubmission, SortBy, Timeframe,
};
use crate::discord::moderation::embeds::{
    metrics_embed, queue_embed, report_embed, stats_embed, truncate,
};
use crate::discord::moderation::message_ref::{guild_prefix, member_key};
use poise::serenity_prelude as serenity;

/// Upsert the invoker's moderator profile and return their id.
///
/// Members with Manage Server are treated as admins; everyone else keeps
/// whatever reputation the engine already has for them.
async fn register_invoker(ctx: Context<'_>) -> Result<String, Error> {
    let moderator_id = ctx.author().id.get().to_string();
    let is_admin = ctx
        .author_member()
        .await
        .and_then(|member| member.permissions)
        .map_or(false, |permissions| permissions.manage_guild());

    let moderation = &ctx.data().moderation;
    let mut profile = moderation
        .moderator_profile(&moderator_id)
        .await?
        .unwrap_or_else(|| ModeratorProfile {
            moderator_id: moderator_id.clone(),
            reputation: 0,
            permissions: vec![],
        });
    profile.permissions.retain(|p| p != "admin");
    if is_admin {
        profile.permissions.push("admin".to_string());
    }
    moderation.register_moderator(profile).await?;

    Ok(moderator_id)
}

async fn reply(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Show the reports waiting in a moderation queue.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn modqueue(
    ctx: Context<'_>,
    #[description = "Queue to show (default: priority)"] queue: Option<QueueChoice>,
    #[description = "Sort order (default: newest first)"] sort: Option<SortChoice>,
    #[description = "Only this report type"] report_type: Option<ReportTypeChoice>,
    #[description = "Only this severity"] severity: Option<SeverityChoice>,
    #[description = "Only reports filed by this age group"] age_group: Option<AgeGroupChoice>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let queue = queue.map(QueueType::from).unwrap_or(QueueType::Priority);
    let filters = ReportFilters {
        report_type: report_type.map(Into::into),
        severity: severity.map(Into::into),
        age_group: age_group.map(Into::into),
        content_prefix: Some(guild_prefix(guild_id.get())),
    };
    let sort_by = sort.map(SortBy::from).unwrap_or_default();

    let reports = ctx
        .data()
        .moderation
        .get_moderation_queue(queue, &filters, sort_by)
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .embed(queue_embed(queue, &reports))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Record your review decision on a report.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn review(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Your decision"] decision: DecisionChoice,
    #[description = "Why"] reasoning: String,
    #[description = "Minutes spent reviewing (default: 0)"] review_minutes: Option<u32>,
    #[description = "Comma-separated evidence IDs you looked at"] evidence_ids: Option<String>,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let moderator_id = register_invoker(ctx).await?;
    ctx.defer_ephemeral().await?;

    let action = ctx
        .data()
        .moderation
        .moderator_review(
            &report_id,
            &moderator_id,
            ReviewSubmission {
                decision: decision.into(),
                reasoning,
                review_time: review_minutes.unwrap_or(0),
                evidence_reviewed: split_list(evidence_ids),
            },
        )
        .await?;

    reply(
        ctx,
        format!(
            "🔍 Recorded **{}** on `{}` (action `{}`).",
            action.decision, report_id, action.action_id
        ),
    )
    .await
}

/// Close a report with a final outcome.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn resolve(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Outcome"] outcome: ResolutionChoice,
    #[description = "Why"] reasoning: String,
    #[description = "Comma-separated list of actions taken"] actions: Option<String>,
    #[description = "Can the user appeal? (default: yes)"] appealable: Option<bool>,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let resolver_id = register_invoker(ctx).await?;
    ctx.defer_ephemeral().await?;

    let resolution = ctx
        .data()
        .moderation
        .resolve_report(
            &report_id,
            &resolver_id,
            ResolutionSubmission {
                resolution_type: outcome.into(),
                reasoning,
                actions: split_list(actions),
                appealable,
            },
        )
        .await?;

    reply(
        ctx,
        format!(
            "✅ `{}` resolved as **{}**.",
            report_id, resolution.resolution_type
        ),
    )
    .await
}

/// Escalate a report to senior moderators.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn escalate(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Why it needs escalation"] reason: String,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let moderator_id = register_invoker(ctx).await?;
    let report = ctx
        .data()
        .moderation
        .escalate_report(&report_id, &moderator_id, &reason)
        .await?;

    reply(
        ctx,
        format!("⬆️ `{}` is now **{}**.", report.report_id, report.status),
    )
    .await
}

/// Dismiss a report without action.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn dismiss(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Why it is being dismissed"] reason: String,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let moderator_id = register_invoker(ctx).await?;
    let report = ctx
        .data()
        .moderation
        .dismiss_report(&report_id, &moderator_id, &reason)
        .await?;

    reply(ctx, format!("🗑️ `{}` dismissed.", report.report_id)).await
}

/// Decide a pending appeal.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn appeal_decide(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Keep the original resolution?"] upheld: bool,
    #[description = "Why"] reasoning: String,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let moderator_id = register_invoker(ctx).await?;
    let report = ctx
        .data()
        .moderation
        .decide_appeal(
            &report_id,
            &moderator_id,
            AppealDecision { upheld, reasoning },
        )
        .await?;

    let verdict = if upheld { "upheld" } else { "overturned" };
    reply(
        ctx,
        format!(
            "⚖️ Appeal on `{}` {}. Report is now **{}**.",
            report.report_id, verdict, report.status
        ),
    )
    .await
}

/// Mark a piece of evidence as verified, disputed or invalid.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn verify_evidence(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
    #[description = "Evidence ID"] evidence_id: String,
    #[description = "Verdict"] status: VerificationChoice,
) -> Result<(), Error> {
    guild_report(ctx, &report_id).await?;
    let moderator_id = register_invoker(ctx).await?;
    let evidence = ctx
        .data()
        .moderation
        .verify_evidence(&report_id, &evidence_id, &moderator_id, status.into())
        .await?;

    reply(
        ctx,
        format!(
            "🧾 Evidence `{}` is now {:?}.",
            evidence.evidence_id, evidence.verification_status
        ),
    )
    .await
}

/// Show moderation metrics for a recent window.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn modmetrics(
    ctx: Context<'_>,
    #[description = "Window (default: last 7 days)"] timeframe: Option<TimeframeChoice>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;
    let timeframe = timeframe.map(Timeframe::from).unwrap_or(Timeframe::Weekly);
    let prefix = guild_prefix(guild_id.get());
    let metrics = ctx
        .data()
        .moderation
        .get_moderation_metrics_for(timeframe, Some(&prefix))
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .embed(metrics_embed(&metrics))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Show a moderator's activity.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn modstats(
    ctx: Context<'_>,
    #[description = "Moderator to check (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let stats = ctx
        .data()
        .moderation
        .moderator_stats(&target.id.get().to_string())
        .await?;

    ctx.send(
        poise::CreateReply::default()
            .embed(stats_embed(&stats))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Set a member's age group in this server, which controls how much their votes count.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn member_age_group(
    ctx: Context<'_>,
    #[description = "Member"] user: serenity::User,
    #[description = "Age group"] age_group: AgeGroupChoice,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    if user.bot {
        return Err("Bots don't vote.".into());
    }

    let profile = MemberProfile::new(
        member_key(guild_id.get(), user.id.get()),
        age_group.into(),
    );
    let group = profile.age_group;
    ctx.data().moderation.save_member_profile(profile).await?;

    reply(
        ctx,
        format!(
            "👤 <@{}> is now in the **{}** age group. Vote weight is fixed at a member's first vote in this server, so this only changes it if they haven't voted here yet.",
            user.id,
            group.as_str()
        ),
    )
    .await
}

/// Look up a report with moderator context.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn modreport(
    ctx: Context<'_>,
    #[description = "Report ID"] report_id: String,
) -> Result<(), Error> {
    let report = guild_report(ctx, &report_id).await?;
    let history: Vec<String> = report
        .moderator_actions
        .iter()
        .map(|a| {
            format!(
                "<@{}> **{}** ({} min): {}",
                a.moderator_id, a.decision, a.review_time, a.reasoning
            )
        })
        .collect();

    let mut embed = report_embed(&report);
    if !history.is_empty() {
        embed = embed.field(
            "Moderator actions",
            truncate(&history.join("\n"), 1024),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
