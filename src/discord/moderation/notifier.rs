// Posts moderation alerts to the moderator channel and tells reporters how
// their report was resolved.

use super::embeds::{report_embed, resolution_embed};
use super::message_ref::parse_snowflake;
use crate::core::moderation::{ModerationNotifier, Report, ReportResolution};
use anyhow::Context as _;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub struct DiscordNotifier {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl DiscordNotifier {
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

#[async_trait]
impl ModerationNotifier for DiscordNotifier {
    async fn notify_moderators(&self, report: &Report) -> anyhow::Result<()> {
        let message = serenity::CreateMessage::new()
            .content("🚨 A report needs moderator attention")
            .embed(report_embed(report));

        self.channel_id
            .send_message(&self.http, message)
            .await
            .context("Failed to post report alert")?;
        Ok(())
    }

    async fn notify_resolution(
        &self,
        report: &Report,
        resolution: &ReportResolution,
    ) -> anyhow::Result<()> {
        self.channel_id
            .send_message(
                &self.http,
                serenity::CreateMessage::new().embed(resolution_embed(report, resolution)),
            )
            .await
            .context("Failed to post resolution")?;

        // Reporters who keep DMs closed just miss the follow-up
        let Some(reporter_id) = parse_snowflake(&report.reporter_id) else {
            return Ok(());
        };
        let dm = serenity::CreateMessage::new()
            .content("Thanks for your report. A moderator has reviewed it.")
            .embed(resolution_embed(report, resolution));
        if let Err(e) = serenity::UserId::new(reporter_id)
            .direct_message(&self.http, dm)
            .await
        {
            tracing::warn!(
                report_id = %report.report_id,
                reporter_id = %report.reporter_id,
                error = %e,
                "Failed to DM reporter about resolution"
            );
        }
        Ok(())
    }
}
