// Discord-specific enforcement - translates moderator decisions into actions
// on the reported message and its author.

use super::message_ref::{parse_snowflake, MessageRef};
use crate::core::moderation::{
    EnforcementHandler, ModeratorAction, ModeratorDecision, Report,
};
use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// How long a suspension keeps someone timed out.
const SUSPENSION_SECS: i64 = 24 * 60 * 60;
/// Audit log reasons are capped by Discord.
const AUDIT_REASON_LIMIT: usize = 512;

/// What happens on Discord for a given decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementStep {
    DeleteMessage,
    WarnAuthor,
    TimeoutAuthor,
    BanAuthor,
}

impl EnforcementStep {
    /// `None` for decisions that leave the content and its author alone.
    pub fn for_decision(decision: ModeratorDecision) -> Option<Self> {
        match decision {
            ModeratorDecision::Remove => Some(EnforcementStep::DeleteMessage),
            ModeratorDecision::WarnUser => Some(EnforcementStep::WarnAuthor),
            ModeratorDecision::SuspendUser => Some(EnforcementStep::TimeoutAuthor),
            ModeratorDecision::BanUser => Some(EnforcementStep::BanAuthor),
            // Edits have to be made by the author or a human moderator
            ModeratorDecision::Approve | ModeratorDecision::Modify | ModeratorDecision::NoAction => {
                None
            }
        }
    }
}

pub struct DiscordEnforcer {
    http: Arc<serenity::Http>,
}

impl DiscordEnforcer {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }

    fn target_user(report: &Report) -> anyhow::Result<serenity::UserId> {
        report
            .target_user_id
            .as_deref()
            .and_then(parse_snowflake)
            .map(serenity::UserId::new)
            .ok_or_else(|| anyhow!("Report {} has no reported user", report.report_id))
    }
}

#[async_trait]
impl EnforcementHandler for DiscordEnforcer {
    async fn enforce(&self, report: &Report, action: &ModeratorAction) -> anyhow::Result<()> {
        let Some(step) = EnforcementStep::for_decision(action.decision) else {
            return Ok(());
        };
        let Some(message) = MessageRef::from_content_id(&report.content_id) else {
            tracing::warn!(
                report_id = %report.report_id,
                content_id = %report.content_id,
                "Reported content is not a Discord message, skipping enforcement"
            );
            return Ok(());
        };
        let guild_id = serenity::GuildId::new(message.guild_id);

        match step {
            EnforcementStep::DeleteMessage => {
                serenity::ChannelId::new(message.channel_id)
                    .delete_message(&self.http, serenity::MessageId::new(message.message_id))
                    .await
                    .context("Failed to delete reported message")?;
            }
            EnforcementStep::WarnAuthor => {
                let user_id = Self::target_user(report)?;
                let warning = format!(
                    "⚠️ **Moderator warning**\nA message you posted ({}) was reported and reviewed.\n{}",
                    message.link(),
                    action.reasoning
                );
                user_id
                    .direct_message(&self.http, serenity::CreateMessage::new().content(warning))
                    .await
                    .context("Failed to DM warning")?;
            }
            EnforcementStep::TimeoutAuthor => {
                let user_id = Self::target_user(report)?;
                let until = serenity::Timestamp::from_unix_timestamp(
                    chrono::Utc::now().timestamp() + SUSPENSION_SECS,
                )
                .context("Failed to create timeout timestamp")?;
                let reason = audit_reason(report, action);
                guild_id
                    .edit_member(
                        &self.http,
                        user_id,
                        serenity::EditMember::new()
                            .disable_communication_until_datetime(until)
                            .audit_log_reason(&reason),
                    )
                    .await
                    .context("Failed to timeout user")?;
            }
            EnforcementStep::BanAuthor => {
                let user_id = Self::target_user(report)?;
                guild_id
                    .ban_with_reason(&self.http, user_id, 0, audit_reason(report, action))
                    .await
                    .context("Failed to ban user")?;
            }
        }

        tracing::info!(
            report_id = %report.report_id,
            decision = %action.decision,
            step = ?step,
            "Enforcement applied"
        );
        Ok(())
    }
}

fn audit_reason(report: &Report, action: &ModeratorAction) -> String {
    let reason = format!("Report {}: {}", report.report_id, action.reasoning);
    reason.chars().take(AUDIT_REASON_LIMIT).collect()
}
