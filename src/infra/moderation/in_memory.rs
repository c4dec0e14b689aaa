// In-memory implementation of ReportStore.
//
// Everything lives in DashMaps, so nothing survives a restart. Used in tests
// and when no database path is configured.

use crate::core::moderation::{
    MemberProfile, ModerationError, ModeratorProfile, QueueType, Report, ReportStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

pub struct InMemoryReportStore {
    reports: DashMap<String, Report>,
    // Queue -> report ids in insertion order
    queues: DashMap<QueueType, Vec<String>>,
    voter_weights: DashMap<String, f64>,
    moderators: DashMap<String, ModeratorProfile>,
    members: DashMap<String, MemberProfile>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: DashMap::new(),
            queues: DashMap::new(),
            voter_weights: DashMap::new(),
            moderators: DashMap::new(),
            members: DashMap::new(),
        }
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert_report(
        &self,
        report: &Report,
        queue: QueueType,
    ) -> Result<(), ModerationError> {
        if self.reports.contains_key(&report.report_id) {
            return Err(ModerationError::StorageError(format!(
                "Report {} already exists",
                report.report_id
            )));
        }
        self.reports
            .insert(report.report_id.clone(), report.clone());
        self.add_to_queue(queue, &report.report_id).await
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, ModerationError> {
        Ok(self.reports.get(report_id).map(|entry| entry.clone()))
    }

    async fn save_report(&self, report: &Report) -> Result<(), ModerationError> {
        match self.reports.get_mut(&report.report_id) {
            Some(mut entry) => {
                *entry = report.clone();
                Ok(())
            }
            None => Err(ModerationError::report_not_found(&report.report_id)),
        }
    }

    async fn add_to_queue(
        &self,
        queue: QueueType,
        report_id: &str,
    ) -> Result<(), ModerationError> {
        let mut ids = self.queues.entry(queue).or_default();
        if !ids.iter().any(|id| id == report_id) {
            ids.push(report_id.to_string());
        }
        Ok(())
    }

    async fn queue_report_ids(&self, queue: QueueType) -> Result<Vec<String>, ModerationError> {
        Ok(self
            .queues
            .get(&queue)
            .map(|ids| ids.clone())
            .unwrap_or_default())
    }

    async fn reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>, ModerationError> {
        Ok(self
            .reports
            .iter()
            .filter(|entry| entry.timestamp >= since)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn voter_weight_or_insert(
        &self,
        voter_id: &str,
        initial: f64,
    ) -> Result<f64, ModerationError> {
        // entry() holds the shard lock, so two first votes can't both insert
        Ok(*self
            .voter_weights
            .entry(voter_id.to_string())
            .or_insert(initial))
    }

    async fn get_moderator(
        &self,
        moderator_id: &str,
    ) -> Result<Option<ModeratorProfile>, ModerationError> {
        Ok(self.moderators.get(moderator_id).map(|m| m.clone()))
    }

    async fn save_moderator(&self, profile: &ModeratorProfile) -> Result<(), ModerationError> {
        self.moderators
            .insert(profile.moderator_id.clone(), profile.clone());
        Ok(())
    }

    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>, ModerationError> {
        Ok(self.members.get(user_id).map(|m| m.clone()))
    }

    async fn save_member(&self, profile: &MemberProfile) -> Result<(), ModerationError> {
        self.members.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}
