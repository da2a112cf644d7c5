//! Audit log: records every reply dispatch attempt.

use murmur_core::{
    error::MurmurError,
    memory::{DispatchEntry, DispatchOutcome},
    post::PostId,
};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

/// Audit logger backed by SQLite.
pub struct AuditLogger {
    pool: SqlitePool,
}

impl AuditLogger {
    /// Create a new audit logger sharing the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write an entry to the audit log.
    pub async fn log(&self, entry: &DispatchEntry) -> Result<(), MurmurError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO audit_log \
             (id, agent_id, post_id, author_handle, outcome, sent_posts, detail) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(entry.agent_id.to_string())
        .bind(entry.post_id.as_str())
        .bind(&entry.author_handle)
        .bind(entry.outcome.as_str())
        .bind(entry.sent_posts as i64)
        .bind(&entry.detail)
        .execute(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("audit log write failed: {e}")))?;

        debug!(
            "audit: {} @{} [{}] {} post(s)",
            entry.post_id,
            entry.author_handle,
            entry.outcome.as_str(),
            entry.sent_posts
        );

        Ok(())
    }

    /// Whether an entry for this agent, post, and outcome exists.
    pub async fn contains(
        &self,
        agent_id: &Uuid,
        post_id: &PostId,
        outcome: DispatchOutcome,
    ) -> Result<bool, MurmurError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM audit_log \
             WHERE agent_id = ? AND post_id = ? AND outcome = ? LIMIT 1",
        )
        .bind(agent_id.to_string())
        .bind(post_id.as_str())
        .bind(outcome.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("audit query failed: {e}")))?;
        Ok(row.is_some())
    }

    /// Outcome counts since a `datetime('now', ...)` offset such as `"-1 day"`.
    pub async fn outcome_counts(&self, since: &str) -> Result<Vec<(String, i64)>, MurmurError> {
        sqlx::query_as(
            "SELECT outcome, COUNT(*) FROM audit_log \
             WHERE timestamp >= datetime('now', ?) \
             GROUP BY outcome ORDER BY outcome",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("audit query failed: {e}")))
    }
}
