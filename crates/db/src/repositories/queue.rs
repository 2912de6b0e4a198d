use slotrace_core::chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use slotrace_core::domain::applicant::ApplicantId;
use slotrace_core::domain::queue::{QueueEntry, QueuePosition, QueueStatus};

use super::{QueueStore, RepositoryError};
use crate::DbPool;

pub struct SqlQueueStore {
    pool: DbPool,
}

impl SqlQueueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn waiting_rank(
        &self,
        enqueued_at: &str,
        rowid: i64,
    ) -> Result<u32, RepositoryError> {
        let (rank,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM queue_entry
             WHERE status = 'waiting'
               AND (enqueued_at < ?1 OR (enqueued_at = ?1 AND rowid <= ?2))",
        )
        .bind(enqueued_at)
        .bind(rowid)
        .fetch_one(&self.pool)
        .await?;

        u32::try_from(rank)
            .map_err(|_| RepositoryError::Decode(format!("invalid queue rank: {rank}")))
    }
}

#[async_trait::async_trait]
impl QueueStore for SqlQueueStore {
    async fn enqueue(&self, applicant_id: &ApplicantId) -> Result<QueuePosition, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO queue_entry (applicant_id, status, enqueued_at, updated_at)
             VALUES (?, 'waiting', ?, ?)
             ON CONFLICT(applicant_id) DO NOTHING",
        )
        .bind(&applicant_id.0)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.position(applicant_id).await
    }

    async fn dequeue_head(&self) -> Result<Option<ApplicantId>, RepositoryError> {
        // Single-statement claim: SQLite serializes writers, so two
        // concurrent callers can never pop the same head.
        let row = sqlx::query(
            "UPDATE queue_entry
             SET status = 'processing', updated_at = ?
             WHERE applicant_id = (
                 SELECT applicant_id FROM queue_entry
                 WHERE status = 'waiting'
                 ORDER BY enqueued_at ASC, rowid ASC
                 LIMIT 1)
               AND status = 'waiting'
             RETURNING applicant_id",
        )
        .bind(Utc::now().to_rfc3339())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ApplicantId(row.get("applicant_id"))))
    }

    async fn mark_booked(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE queue_entry
             SET status = 'booked', updated_at = ?
             WHERE applicant_id = ? AND status = 'processing'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&applicant_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn return_to_waiting(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<bool, RepositoryError> {
        // enqueued_at is deliberately untouched: the applicant keeps their
        // place in line for the next availability event.
        let result = sqlx::query(
            "UPDATE queue_entry
             SET status = 'waiting', updated_at = ?
             WHERE applicant_id = ? AND status = 'processing'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&applicant_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_abandoned(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE queue_entry
             SET status = 'abandoned', updated_at = ?
             WHERE applicant_id = ? AND status IN ('waiting', 'processing')",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(&applicant_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, applicant_id: &ApplicantId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM queue_entry WHERE applicant_id = ?")
            .bind(&applicant_id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn position(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<QueuePosition, RepositoryError> {
        let row = sqlx::query(
            "SELECT rowid, status, enqueued_at FROM queue_entry WHERE applicant_id = ?",
        )
        .bind(&applicant_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(QueuePosition::Absent);
        };

        let status = decode_status(&row)?;
        match status {
            QueueStatus::Waiting => {
                let enqueued_at = row.try_get::<String, _>("enqueued_at")?;
                let rowid = row.try_get::<i64, _>("rowid")?;
                Ok(QueuePosition::Waiting(self.waiting_rank(&enqueued_at, rowid).await?))
            }
            QueueStatus::Processing => Ok(QueuePosition::Processing),
            QueueStatus::Booked => Ok(QueuePosition::Booked),
            QueueStatus::Abandoned => Ok(QueuePosition::Abandoned),
        }
    }

    async fn entry(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT applicant_id, status, enqueued_at, updated_at
             FROM queue_entry WHERE applicant_id = ?",
        )
        .bind(&applicant_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(entry_from_row).transpose()
    }

    async fn waiting(&self) -> Result<Vec<QueueEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT applicant_id, status, enqueued_at, updated_at
             FROM queue_entry
             WHERE status = 'waiting'
             ORDER BY enqueued_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn depth(&self) -> Result<u64, RepositoryError> {
        let (depth,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM queue_entry WHERE status = 'waiting'")
                .fetch_one(&self.pool)
                .await?;

        u64::try_from(depth)
            .map_err(|_| RepositoryError::Decode(format!("invalid queue depth: {depth}")))
    }
}

fn decode_status(row: &SqliteRow) -> Result<QueueStatus, RepositoryError> {
    let raw = row.try_get::<String, _>("status")?;
    QueueStatus::parse(&raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown queue status `{raw}`")))
}

fn entry_from_row(row: SqliteRow) -> Result<QueueEntry, RepositoryError> {
    let status = decode_status(&row)?;

    Ok(QueueEntry {
        applicant_id: ApplicantId(row.try_get("applicant_id")?),
        status,
        enqueued_at: parse_timestamp("enqueued_at", row.try_get("enqueued_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
