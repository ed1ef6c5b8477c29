//! Optional debug sink for intermediate Run Context snapshots.
//!
//! The orchestrator writes one snapshot after every completed stage. A failing
//! store is logged and otherwise ignored; snapshots are never on the data path.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::stage::StageKind;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn write(&self, run_id: Uuid, stage: StageKind, snapshot: Value)
        -> Result<(), SnapshotError>;
}

/// Appends snapshots to the `run_snapshots` table.
pub struct PgSnapshotStore {
    db: PgPool,
}

impl PgSnapshotStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn write(
        &self,
        run_id: Uuid,
        stage: StageKind,
        snapshot: Value,
    ) -> Result<(), SnapshotError> {
        sqlx::query(
            r#"
            INSERT INTO run_snapshots (run_id, stage, context)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(run_id)
        .bind(stage.as_str())
        .bind(snapshot)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
