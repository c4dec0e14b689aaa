// Log-only collaborators, used when there is no Discord channel to post to.

use crate::core::moderation::{
    EnforcementHandler, ModerationNotifier, ModeratorAction, Report, ReportResolution,
};
use async_trait::async_trait;

pub struct LogNotifier;

#[async_trait]
impl ModerationNotifier for LogNotifier {
    async fn notify_moderators(&self, report: &Report) -> anyhow::Result<()> {
        tracing::info!(
            report_id = %report.report_id,
            report_type = %report.report_type,
            severity = %report.severity,
            priority = report.priority,
            "Report needs moderator attention"
        );
        Ok(())
    }

    async fn notify_resolution(
        &self,
        report: &Report,
        resolution: &ReportResolution,
    ) -> anyhow::Result<()> {
        tracing::info!(
            report_id = %report.report_id,
            reporter_id = %report.reporter_id,
            resolution = %resolution.resolution_type,
            "Report resolution ready for delivery"
        );
        Ok(())
    }
}

pub struct LogEnforcer;

#[async_trait]
impl EnforcementHandler for LogEnforcer {
    async fn enforce(&self, report: &Report, action: &ModeratorAction) -> anyhow::Result<()> {
        tracing::info!(
            report_id = %report.report_id,
            content_id = %report.content_id,
            target_user_id = ?report.target_user_id,
            decision = %action.decision,
            "Enforcement requested"
        );
        Ok(())
    }
}
