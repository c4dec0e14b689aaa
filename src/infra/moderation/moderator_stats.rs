// In-memory moderator performance store.

use crate::core::moderation::{ModeratorAction, ModeratorStats, ModeratorStatsStore};
use async_trait::async_trait;
use dashmap::DashMap;

pub struct InMemoryModeratorStats {
    stats: DashMap<String, ModeratorStats>,
}

impl InMemoryModeratorStats {
    pub fn new() -> Self {
        Self {
            stats: DashMap::new(),
        }
    }
}

impl Default for InMemoryModeratorStats {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModeratorStatsStore for InMemoryModeratorStats {
    async fn record_action(
        &self,
        moderator_id: &str,
        action: &ModeratorAction,
    ) -> anyhow::Result<()> {
        let mut entry = self
            .stats
            .entry(moderator_id.to_string())
            .or_insert_with(|| ModeratorStats {
                moderator_id: moderator_id.to_string(),
                ..Default::default()
            });

        entry.actions_taken += 1;
        entry.total_review_minutes += action.review_time as u64;
        *entry.decisions.entry(action.decision).or_insert(0) += 1;
        entry.last_action_at = Some(action.timestamp);
        Ok(())
    }

    async fn stats(&self, moderator_id: &str) -> anyhow::Result<ModeratorStats> {
        Ok(self
            .stats
            .get(moderator_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| ModeratorStats {
                moderator_id: moderator_id.to_string(),
                ..Default::default()
            }))
    }
}
