// SQLite-backed report store for persistent moderation data.
//
// Tables:
// - reports: one row per report, full report as JSON plus indexed columns
// - report_queues: queue membership in insertion order
// - voter_weights: sticky per-voter vote weights
// - moderators: moderator profiles
// - member_profiles: reporter/voter age groups

use crate::core::moderation::{
    AgeGroup, MemberProfile, ModerationError, ModeratorProfile, QueueType, Report, ReportStore,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

fn storage_err(e: impl std::fmt::Display) -> ModerationError {
    ModerationError::StorageError(e.to_string())
}

pub struct SqliteReportStore {
    pool: Pool<Sqlite>,
}

impl SqliteReportStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Handle to the pool, for stores that live in the same database.
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }

    /// Run database migrations to create required tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                report_id TEXT PRIMARY KEY,
                content_id TEXT NOT NULL,
                status TEXT NOT NULL,
                timestamp_ms INTEGER NOT NULL,
                data TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reports_timestamp ON reports(timestamp_ms);",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_queues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue TEXT NOT NULL,
                report_id TEXT NOT NULL,
                UNIQUE (queue, report_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voter_weights (
                voter_id TEXT PRIMARY KEY,
                weight REAL NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS moderators (
                moderator_id TEXT PRIMARY KEY,
                reputation INTEGER NOT NULL DEFAULT 0,
                permissions TEXT NOT NULL DEFAULT '[]'
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS member_profiles (
                user_id TEXT PRIMARY KEY,
                age_group TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn decode_report(data: &str) -> Result<Report, ModerationError> {
        serde_json::from_str(data).map_err(storage_err)
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn insert_report(
        &self,
        report: &Report,
        queue: QueueType,
    ) -> Result<(), ModerationError> {
        let data = serde_json::to_string(report).map_err(storage_err)?;
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query(
            r#"
            INSERT INTO reports (report_id, content_id, status, timestamp_ms, data)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.report_id.as_str())
        .bind(report.content_id.as_str())
        .bind(report.status.to_string())
        .bind(report.timestamp.timestamp_millis())
        .bind(data.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage_err)?;

        sqlx::query("INSERT OR IGNORE INTO report_queues (queue, report_id) VALUES (?, ?)")
            .bind(queue.as_str())
            .bind(report.report_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<Report>, ModerationError> {
        let row = sqlx::query("SELECT data FROM reports WHERE report_id = ?")
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data").map_err(storage_err)?;
                Ok(Some(Self::decode_report(&data)?))
            }
            None => Ok(None),
        }
    }

    async fn save_report(&self, report: &Report) -> Result<(), ModerationError> {
        let data = serde_json::to_string(report).map_err(storage_err)?;
        let result = sqlx::query("UPDATE reports SET status = ?, data = ? WHERE report_id = ?")
            .bind(report.status.to_string())
            .bind(data.as_str())
            .bind(report.report_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(ModerationError::report_not_found(&report.report_id));
        }
        Ok(())
    }

    async fn add_to_queue(
        &self,
        queue: QueueType,
        report_id: &str,
    ) -> Result<(), ModerationError> {
        sqlx::query("INSERT OR IGNORE INTO report_queues (queue, report_id) VALUES (?, ?)")
            .bind(queue.as_str())
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn queue_report_ids(&self, queue: QueueType) -> Result<Vec<String>, ModerationError> {
        let rows = sqlx::query("SELECT report_id FROM report_queues WHERE queue = ? ORDER BY id")
            .bind(queue.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("report_id").map_err(storage_err))
            .collect()
    }

    async fn reports_since(&self, since: DateTime<Utc>) -> Result<Vec<Report>, ModerationError> {
        let rows = sqlx::query("SELECT data FROM reports WHERE timestamp_ms >= ?")
            .bind(since.timestamp_millis())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                let data: String = row.try_get("data").map_err(storage_err)?;
                Self::decode_report(&data)
            })
            .collect()
    }

    async fn voter_weight_or_insert(
        &self,
        voter_id: &str,
        initial: f64,
    ) -> Result<f64, ModerationError> {
        sqlx::query(
            "INSERT INTO voter_weights (voter_id, weight) VALUES (?, ?) ON CONFLICT(voter_id) DO NOTHING",
        )
        .bind(voter_id)
        .bind(initial)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        let row = sqlx::query("SELECT weight FROM voter_weights WHERE voter_id = ?")
            .bind(voter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        row.try_get::<f64, _>("weight").map_err(storage_err)
    }

    async fn get_moderator(
        &self,
        moderator_id: &str,
    ) -> Result<Option<ModeratorProfile>, ModerationError> {
        let row = sqlx::query(
            "SELECT reputation, permissions FROM moderators WHERE moderator_id = ?",
        )
        .bind(moderator_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some(row) => {
                let reputation: i64 = row.try_get("reputation").map_err(storage_err)?;
                let permissions: String = row.try_get("permissions").map_err(storage_err)?;
                Ok(Some(ModeratorProfile {
                    moderator_id: moderator_id.to_string(),
                    reputation: reputation.max(0) as u32,
                    permissions: serde_json::from_str(&permissions).map_err(storage_err)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn save_moderator(&self, profile: &ModeratorProfile) -> Result<(), ModerationError> {
        let permissions = serde_json::to_string(&profile.permissions).map_err(storage_err)?;
        sqlx::query(
            r#"
            INSERT INTO moderators (moderator_id, reputation, permissions)
            VALUES (?, ?, ?)
            ON CONFLICT(moderator_id) DO UPDATE SET
                reputation = excluded.reputation,
                permissions = excluded.permissions
            "#,
        )
        .bind(profile.moderator_id.as_str())
        .bind(profile.reputation as i64)
        .bind(permissions)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>, ModerationError> {
        let row = sqlx::query("SELECT age_group FROM member_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        match row {
            Some(row) => {
                let age_group: String = row.try_get("age_group").map_err(storage_err)?;
                let age_group = AgeGroup::parse(&age_group).ok_or_else(|| {
                    ModerationError::StorageError(format!("Unknown age group: {}", age_group))
                })?;
                Ok(Some(MemberProfile::new(user_id, age_group)))
            }
            None => Ok(None),
        }
    }

    async fn save_member(&self, profile: &MemberProfile) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            INSERT INTO member_profiles (user_id, age_group) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET age_group = excluded.age_group
            "#,
        )
        .bind(profile.user_id.as_str())
        .bind(profile.age_group.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }
}
