use chrono::{DateTime, Utc};
use sqlx::Row;

use quiz_core::model::{ResultRecord, TestOutcome, UserId};

use super::SqliteRepository;
use crate::repository::{ResultSink, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn outcome_text(outcome: TestOutcome) -> &'static str {
    match outcome {
        TestOutcome::Passed => "passed",
        TestOutcome::Failed => "failed",
    }
}

#[async_trait::async_trait]
impl ResultSink for SqliteRepository {
    async fn append_result(&self, record: &ResultRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO results (
                    user_id, display_name, completed_at, full_name,
                    outcome, correct_count, notes
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(record.user_id().value())
        .bind(record.display_name())
        // Rendered with the reporting offset so the stored string matches
        // the sheet convention.
        .bind(record.completed_at().to_rfc3339())
        .bind(record.full_name())
        .bind(outcome_text(record.outcome()))
        .bind(i64::from(record.correct_count()))
        .bind(record.notes())
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn last_attempt_time(
        &self,
        user_id: UserId,
    ) -> Result<Option<DateTime<Utc>>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT completed_at FROM results
                WHERE user_id = ?1
                ORDER BY completed_at DESC
                LIMIT 1
            ",
        )
        .bind(user_id.value())
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let completed_at: String = row.try_get("completed_at").map_err(conn)?;
        let parsed = DateTime::parse_from_rfc3339(&completed_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }
}
