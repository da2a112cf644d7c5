//! Conversation memory records.

use super::Store;
use chrono::{DateTime, SecondsFormat, Utc};
use murmur_core::{
    error::MurmurError,
    memory::{MemoryKind, MemoryRecord},
    post::PostId,
};
use uuid::Uuid;

type MemoryRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
);

const MEMORY_COLUMNS: &str = "id, agent_id, room_id, kind, post_id, author_handle, \
                              counterpart, content, url, in_reply_to, created_at";

fn parse_uuid(raw: &str, column: &str) -> Result<Uuid, MurmurError> {
    Uuid::parse_str(raw).map_err(|e| MurmurError::Memory(format!("bad {column} {raw:?}: {e}")))
}

fn from_row(row: MemoryRow) -> Result<MemoryRecord, MurmurError> {
    let (
        id,
        agent_id,
        room_id,
        kind,
        post_id,
        author_handle,
        counterpart,
        content,
        url,
        in_reply_to,
        created_at,
    ) = row;

    let kind = MemoryKind::parse(&kind)
        .ok_or_else(|| MurmurError::Memory(format!("unknown memory kind {kind:?}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| MurmurError::Memory(format!("bad created_at {created_at:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(MemoryRecord {
        id: parse_uuid(&id, "id")?,
        agent_id: parse_uuid(&agent_id, "agent_id")?,
        room_id: parse_uuid(&room_id, "room_id")?,
        kind,
        post_id: PostId::new(post_id),
        author_handle,
        counterpart,
        content,
        url,
        in_reply_to: in_reply_to
            .as_deref()
            .map(|r| parse_uuid(r, "in_reply_to"))
            .transpose()?,
        created_at,
    })
}

impl Store {
    pub(super) async fn memory_by_id(&self, id: &Uuid) -> Result<Option<MemoryRecord>, MurmurError> {
        let row: Option<MemoryRow> =
            sqlx::query_as(&format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| MurmurError::Memory(format!("memory lookup failed: {e}")))?;

        row.map(from_row).transpose()
    }

    /// Insert a record; an existing id is left untouched.
    pub(super) async fn insert_memory(&self, record: &MemoryRecord) -> Result<(), MurmurError> {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO memories ({MEMORY_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(record.id.to_string())
        .bind(record.agent_id.to_string())
        .bind(record.room_id.to_string())
        .bind(record.kind.as_str())
        .bind(record.post_id.as_str())
        .bind(&record.author_handle)
        .bind(&record.counterpart)
        .bind(&record.content)
        .bind(&record.url)
        .bind(record.in_reply_to.map(|u| u.to_string()))
        .bind(
            record
                .created_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("memory insert failed: {e}")))?;

        Ok(())
    }

    /// Latest `limit` records with a counterpart, returned oldest first.
    pub(super) async fn memories_with(
        &self,
        agent_id: &Uuid,
        counterpart: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MurmurError> {
        let rows: Vec<MemoryRow> = sqlx::query_as(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories \
             WHERE agent_id = ? AND counterpart = ? COLLATE NOCASE \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?"
        ))
        .bind(agent_id.to_string())
        .bind(counterpart)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("memory history query failed: {e}")))?;

        let mut records = rows
            .into_iter()
            .map(from_row)
            .collect::<Result<Vec<_>, _>>()?;
        records.reverse();
        Ok(records)
    }

    /// Number of memory records stored for an agent.
    pub async fn memory_count(&self, agent_id: &Uuid) -> Result<i64, MurmurError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories WHERE agent_id = ?")
            .bind(agent_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MurmurError::Memory(format!("memory count failed: {e}")))?;
        Ok(count)
    }
}
