// SQLite-backed moderator performance store.
//
// Shares the report store's pool. Counters are bumped with upserts, so two
// actions recorded at once never lose an increment.

use crate::core::moderation::{
    ModeratorAction, ModeratorDecision, ModeratorStats, ModeratorStatsStore,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteModeratorStats {
    pool: Pool<Sqlite>,
}

impl SqliteModeratorStats {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderator_stats (
                moderator_id TEXT PRIMARY KEY,
                actions_taken INTEGER NOT NULL DEFAULT 0,
                total_review_minutes INTEGER NOT NULL DEFAULT 0,
                last_action_ms INTEGER
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderator_decisions (
                moderator_id TEXT NOT NULL,
                decision TEXT NOT NULL,
                count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (moderator_id, decision)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ModeratorStatsStore for SqliteModeratorStats {
    async fn record_action(&self, moderator_id: &str, action: &ModeratorAction) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO moderator_stats (moderator_id, actions_taken, total_review_minutes, last_action_ms)
            VALUES (?, 1, ?, ?)
            ON CONFLICT(moderator_id) DO UPDATE SET
                actions_taken = actions_taken + 1,
                total_review_minutes = total_review_minutes + excluded.total_review_minutes,
                last_action_ms = MAX(COALESCE(last_action_ms, 0), excluded.last_action_ms)
            "#,
        )
        .bind(moderator_id)
        .bind(action.review_time as i64)
        .bind(action.timestamp.timestamp_millis())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO moderator_decisions (moderator_id, decision, count)
            VALUES (?, ?, 1)
            ON CONFLICT(moderator_id, decision) DO UPDATE SET count = count + 1
            "#,
        )
        .bind(moderator_id)
        .bind(action.decision.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn stats(&self, moderator_id: &str) -> Result<ModeratorStats> {
        let mut stats = ModeratorStats {
            moderator_id: moderator_id.to_string(),
            ..Default::default()
        };

        let row = sqlx::query(
            "SELECT actions_taken, total_review_minutes, last_action_ms FROM moderator_stats WHERE moderator_id = ?",
        )
        .bind(moderator_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(stats);
        };
        stats.actions_taken = row.try_get::<i64, _>("actions_taken")?.max(0) as u32;
        stats.total_review_minutes = row.try_get::<i64, _>("total_review_minutes")?.max(0) as u64;
        stats.last_action_at = row
            .try_get::<Option<i64>, _>("last_action_ms")?
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        let rows = sqlx::query("SELECT decision, count FROM moderator_decisions WHERE moderator_id = ?")
            .bind(moderator_id)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let label: String = row.try_get("decision")?;
            let Some(decision) = ModeratorDecision::parse(&label) else {
                tracing::warn!(moderator_id, decision = %label, "Unknown decision in moderator stats");
                continue;
            };
            let count: i64 = row.try_get("count")?;
            stats.decisions.insert(decision, count.max(0) as u32);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::ModeratorType;
    use crate::infra::moderation::SqliteReportStore;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    fn action(decision: ModeratorDecision, minutes: u32) -> ModeratorAction {
        ModeratorAction {
            action_id: "a".to_string(),
            moderator_id: "m".to_string(),
            moderator_type: ModeratorType::Volunteer,
            decision,
            reasoning: String::new(),
            review_time: minutes,
            evidence_reviewed: vec![],
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_stats_survive_a_new_store() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_owned();
        drop(tmp);
        let db = path.to_str().unwrap();

        {
            let reports = SqliteReportStore::new(db).await.unwrap();
            let stats = SqliteModeratorStats::new(reports.pool());
            stats.migrate().await.unwrap();

            stats
                .record_action("m", &action(ModeratorDecision::Remove, 4))
                .await
                .unwrap();
            stats
                .record_action("m", &action(ModeratorDecision::Remove, 2))
                .await
                .unwrap();
            let mut late = action(ModeratorDecision::BanUser, 0);
            late.timestamp = Utc::now() - Duration::days(1);
            stats.record_action("m", &late).await.unwrap();
        }

        // Reopen, as after a restart
        let reports = SqliteReportStore::new(db).await.unwrap();
        let stats = SqliteModeratorStats::new(reports.pool());
        stats.migrate().await.unwrap();

        let loaded = stats.stats("m").await.unwrap();
        assert_eq!(loaded.actions_taken, 3);
        assert_eq!(loaded.total_review_minutes, 6);
        assert_eq!(loaded.decisions.get(&ModeratorDecision::Remove), Some(&2));
        assert_eq!(loaded.decisions.get(&ModeratorDecision::BanUser), Some(&1));
        // An older action does not move the last-action time backwards
        assert!(loaded.last_action_at.unwrap() > Utc::now() - Duration::hours(1));
        assert!((loaded.average_review_minutes() - 2.0).abs() < 1e-9);

        let empty = stats.stats("unknown").await.unwrap();
        assert_eq!(empty.actions_taken, 0);
        assert!(empty.decisions.is_empty());

        let _ = std::fs::remove_file(path);
    }
}
