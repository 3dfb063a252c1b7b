//! # Activity Log Repository
//!
//! Append-only audit trail of who did what to which entity.
//!
//! Entries are plain rows, never updated or deleted. The detail column
//! holds an optional JSON payload for action-specific context (invoice
//! totals, status edges, etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::DbResult;

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    /// JSON payload with action-specific context.
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Repository for the activity log.
#[derive(Debug, Clone)]
pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    /// Creates a new ActivityLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActivityLogRepository { pool }
    }

    /// Appends an entry.
    pub async fn record(
        &self,
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        detail: Option<serde_json::Value>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (actor, action, entity_type, entity_id, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(actor)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(detail.map(|d| d.to_string()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists entries for one entity, newest first.
    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT * FROM activity_log
            WHERE entity_type = ?1 AND entity_id = ?2
            ORDER BY id DESC
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists the most recent entries across all entities.
    pub async fn recent(&self, limit: i64) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            "SELECT * FROM activity_log ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
