//! Per-agent watermark persistence.

use super::Store;
use murmur_core::{error::MurmurError, post::Watermark};
use uuid::Uuid;

impl Store {
    /// Load the stored watermark. A value that no longer parses is reported
    /// as an error rather than silently treated as absent.
    pub(super) async fn load_watermark(
        &self,
        agent_id: &Uuid,
    ) -> Result<Option<Watermark>, MurmurError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT last_processed_id FROM interaction_state WHERE agent_id = ?")
                .bind(agent_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| MurmurError::Memory(format!("watermark read failed: {e}")))?;

        row.map(|(raw,)| Watermark::parse(&raw)).transpose()
    }

    pub(super) async fn save_watermark(
        &self,
        agent_id: &Uuid,
        watermark: &Watermark,
    ) -> Result<(), MurmurError> {
        sqlx::query(
            "INSERT INTO interaction_state (agent_id, last_processed_id) VALUES (?, ?) \
             ON CONFLICT(agent_id) DO UPDATE SET \
             last_processed_id = excluded.last_processed_id, \
             updated_at = datetime('now')",
        )
        .bind(agent_id.to_string())
        .bind(watermark.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("watermark write failed: {e}")))?;

        Ok(())
    }
}
