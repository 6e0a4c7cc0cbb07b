use chrono::{DateTime, Duration, Utc};
use sqlx::Row;

use quiz_core::model::UserId;
use quiz_core::session::SessionState;

use super::SqliteRepository;
use crate::repository::{SessionStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SessionStore for SqliteRepository {
    async fn load(&self, user_id: UserId) -> Result<Option<SessionState>, StorageError> {
        let row = sqlx::query("SELECT snapshot, expires_at FROM sessions WHERE user_id = ?1")
            .bind(user_id.value())
            .fetch_optional(self.pool())
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(conn)?;
        if expires_at <= self.clock().now() {
            // TTL beat the reader; sweep the stale row.
            sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
                .bind(user_id.value())
                .execute(self.pool())
                .await
                .map_err(conn)?;
            return Ok(None);
        }

        let snapshot: String = row.try_get("snapshot").map_err(conn)?;
        let state: SessionState = serde_json::from_str(&snapshot)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &SessionState, ttl: Duration) -> Result<(), StorageError> {
        let snapshot = serde_json::to_string(state)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let expires_at = self.clock().now() + ttl;

        sqlx::query(
            r"
                INSERT INTO sessions (user_id, snapshot, expires_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id) DO UPDATE
                    SET snapshot = excluded.snapshot,
                        expires_at = excluded.expires_at
            ",
        )
        .bind(state.user_id().value())
        .bind(snapshot)
        .bind(expires_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id.value())
            .execute(self.pool())
            .await
            .map_err(conn)?;
        Ok(())
    }
}
