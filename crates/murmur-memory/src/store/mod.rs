//! SQLite-backed persistent store.
//!
//! Split into focused submodules:
//! - `state`: per-agent watermark
//! - `memories`: conversation memory records and per-author history
//!
//! [`Store`] implements [`InteractionStore`] by delegating to both.

mod memories;
mod state;

use async_trait::async_trait;
use murmur_core::{
    config::{shellexpand, MemoryConfig},
    error::MurmurError,
    memory::{DispatchEntry, DispatchOutcome, MemoryRecord},
    post::{PostId, Watermark},
    traits::InteractionStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::audit::AuditLogger;

/// Persistent store backed by SQLite.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run pending migrations.
    pub async fn new(config: &MemoryConfig) -> Result<Self, MurmurError> {
        let db_path = shellexpand(&config.db_path);

        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MurmurError::Memory(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| MurmurError::Memory(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| MurmurError::Memory(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Memory store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), MurmurError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| MurmurError::Memory(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] = &[
            ("001_init", include_str!("../../migrations/001_init.sql")),
            (
                "002_audit_log",
                include_str!("../../migrations/002_audit_log.sql"),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        MurmurError::Memory(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| MurmurError::Memory(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    MurmurError::Memory(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for Store {
    async fn get_watermark(&self, agent_id: &Uuid) -> Result<Option<Watermark>, MurmurError> {
        self.load_watermark(agent_id).await
    }

    async fn set_watermark(
        &self,
        agent_id: &Uuid,
        watermark: &Watermark,
    ) -> Result<(), MurmurError> {
        self.save_watermark(agent_id, watermark).await
    }

    async fn get_memory(&self, id: &Uuid) -> Result<Option<MemoryRecord>, MurmurError> {
        self.memory_by_id(id).await
    }

    async fn put_memory(&self, record: &MemoryRecord) -> Result<(), MurmurError> {
        self.insert_memory(record).await
    }

    async fn recent_memories_for(
        &self,
        agent_id: &Uuid,
        counterpart: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MurmurError> {
        self.memories_with(agent_id, counterpart, limit).await
    }

    async fn log_dispatch(&self, entry: &DispatchEntry) -> Result<(), MurmurError> {
        AuditLogger::new(self.pool.clone()).log(entry).await
    }

    async fn has_dispatch(
        &self,
        agent_id: &Uuid,
        post_id: &PostId,
        outcome: DispatchOutcome,
    ) -> Result<bool, MurmurError> {
        AuditLogger::new(self.pool.clone())
            .contains(agent_id, post_id, outcome)
            .await
    }
}
