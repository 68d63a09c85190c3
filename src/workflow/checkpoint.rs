// Checkpointing - Persist and resume workflows by thread id
use super::state::WorkflowState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Checkpoint - Snapshot of workflow state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub checkpoint_id: String,
    pub workflow_id: String,
    pub thread_id: String,
    pub state: WorkflowState,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

/// Store of state snapshots keyed by thread id
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Save a snapshot and return its checkpoint id
    async fn save(&self, state: &WorkflowState) -> Result<String, CheckpointError>;

    /// Most recent snapshot of a thread
    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// All snapshots of a thread, oldest first
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError>;
}

fn checkpoint_id(state: &WorkflowState, version: i32) -> String {
    format!("{}::{}::{}", state.workflow_id, version, Utc::now().timestamp_millis())
}

/// In-process store holding only the newest snapshot of each thread
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointer {
    async fn save(&self, state: &WorkflowState) -> Result<String, CheckpointError> {
        let mut threads = self.threads.write().await;

        let version = threads.get(&state.thread_id).map_or(0, |c| c.version) + 1;
        let id = checkpoint_id(state, version);
        // Replaces the previous snapshot; resume only ever reads the latest
        threads.insert(
            state.thread_id.clone(),
            Checkpoint {
                checkpoint_id: id.clone(),
                workflow_id: state.workflow_id.clone(),
                thread_id: state.thread_id.clone(),
                state: state.clone(),
                version,
                created_at: Utc::now(),
            },
        );

        Ok(id)
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned())
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().into_iter().collect())
    }
}

/// PostgreSQL store, state kept as JSONB
pub struct PgCheckpointer {
    pool: PgPool,
}

impl PgCheckpointer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Setup checkpoint table
    pub async fn setup(&self) -> Result<(), CheckpointError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflow_checkpoints (
                checkpoint_id VARCHAR(255) PRIMARY KEY,
                workflow_id VARCHAR(255) NOT NULL,
                thread_id VARCHAR(255) NOT NULL,
                state JSONB NOT NULL,
                version INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_workflow_checkpoints_thread_id
            ON workflow_checkpoints(thread_id, version)
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("✅ Workflow checkpoint table setup complete");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CheckpointRow {
    checkpoint_id: String,
    workflow_id: String,
    thread_id: String,
    state: serde_json::Value,
    version: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CheckpointRow> for Checkpoint {
    type Error = CheckpointError;

    fn try_from(row: CheckpointRow) -> Result<Self, Self::Error> {
        Ok(Checkpoint {
            checkpoint_id: row.checkpoint_id,
            workflow_id: row.workflow_id,
            thread_id: row.thread_id,
            state: serde_json::from_value(row.state)?,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CheckpointStore for PgCheckpointer {
    async fn save(&self, state: &WorkflowState) -> Result<String, CheckpointError> {
        let current_version: Option<i32> =
            sqlx::query_scalar("SELECT MAX(version) FROM workflow_checkpoints WHERE thread_id = $1")
                .bind(&state.thread_id)
                .fetch_one(&self.pool)
                .await?;

        let version = current_version.unwrap_or(0) + 1;
        let id = checkpoint_id(state, version);
        let state_json = serde_json::to_value(state)?;

        sqlx::query(
            r#"
            INSERT INTO workflow_checkpoints
            (checkpoint_id, workflow_id, thread_id, state, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&id)
        .bind(&state.workflow_id)
        .bind(&state.thread_id)
        .bind(state_json)
        .bind(version)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to save checkpoint: {}", e);
            e
        })?;

        info!(thread_id = %state.thread_id, version, "💾 Checkpoint saved: {}", id);
        Ok(id)
    }

    async fn latest(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let row = sqlx::query_as::<_, CheckpointRow>(
            r#"
            SELECT checkpoint_id, workflow_id, thread_id, state, version, created_at
            FROM workflow_checkpoints
            WHERE thread_id = $1
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Checkpoint::try_from).transpose()
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint>, CheckpointError> {
        let rows = sqlx::query_as::<_, CheckpointRow>(
            r#"
            SELECT checkpoint_id, workflow_id, thread_id, state, version, created_at
            FROM workflow_checkpoints
            WHERE thread_id = $1
            ORDER BY version ASC
            "#,
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Checkpoint::try_from).collect()
    }
}
