use slotrace_core::chrono::{NaiveDate, NaiveTime};
use sqlx::{sqlite::SqliteRow, Row};

use slotrace_core::domain::applicant::ApplicantId;
use slotrace_core::domain::slot::Reservation;

use super::{RepositoryError, ReservationStore};
use crate::repositories::queue::parse_timestamp;
use crate::DbPool;

pub struct SqlReservationStore {
    pool: DbPool,
}

impl SqlReservationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ReservationStore for SqlReservationStore {
    async fn insert(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO reservation (
                id,
                applicant_id,
                confirmation_id,
                slot_date,
                slot_time,
                confirmed_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&reservation.id)
        .bind(&reservation.applicant_id.0)
        .bind(&reservation.confirmation_id)
        .bind(reservation.slot_date.format("%Y-%m-%d").to_string())
        .bind(reservation.slot_time.format("%H:%M").to_string())
        .bind(reservation.confirmed_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_for_applicant(
        &self,
        applicant_id: &ApplicantId,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, applicant_id, confirmation_id, slot_date, slot_time, confirmed_at
             FROM reservation
             WHERE applicant_id = ?
             ORDER BY confirmed_at ASC",
        )
        .bind(&applicant_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(reservation_from_row).collect()
    }
}

fn reservation_from_row(row: SqliteRow) -> Result<Reservation, RepositoryError> {
    let slot_date_raw = row.try_get::<String, _>("slot_date")?;
    let slot_date = NaiveDate::parse_from_str(&slot_date_raw, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("invalid slot_date `{slot_date_raw}` ({error})"))
    })?;

    let slot_time_raw = row.try_get::<String, _>("slot_time")?;
    let slot_time = NaiveTime::parse_from_str(&slot_time_raw, "%H:%M").map_err(|error| {
        RepositoryError::Decode(format!("invalid slot_time `{slot_time_raw}` ({error})"))
    })?;

    Ok(Reservation {
        id: row.try_get("id")?,
        applicant_id: ApplicantId(row.try_get("applicant_id")?),
        confirmation_id: row.try_get("confirmation_id")?,
        slot_date,
        slot_time,
        confirmed_at: parse_timestamp("confirmed_at", row.try_get("confirmed_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use slotrace_core::chrono::{NaiveDate, NaiveTime, Utc};
    use slotrace_core::domain::applicant::ApplicantId;
    use slotrace_core::domain::slot::Reservation;

    use super::SqlReservationStore;
    use crate::migrations;
    use crate::repositories::ReservationStore;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn reservation_round_trip() {
        let pool = setup_pool().await;
        let store = SqlReservationStore::new(pool.clone());
        let applicant_id = ApplicantId("U-RT-1".to_string());

        let reservation = Reservation {
            id: "RES-RT-001".to_string(),
            applicant_id: applicant_id.clone(),
            confirmation_id: "CONF123".to_string(),
            slot_date: NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid date"),
            slot_time: NaiveTime::from_hms_opt(9, 45, 0).expect("valid time"),
            confirmed_at: Utc::now(),
        };

        store.insert(&reservation).await.expect("insert");

        let found = store.find_for_applicant(&applicant_id).await.expect("find");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].confirmation_id, "CONF123");
        assert_eq!(found[0].slot_date, reservation.slot_date);
        assert_eq!(found[0].slot_time, reservation.slot_time);

        pool.close().await;
    }

    #[tokio::test]
    async fn duplicate_reservation_ids_are_rejected() {
        let pool = setup_pool().await;
        let store = SqlReservationStore::new(pool.clone());

        let reservation = Reservation {
            id: "RES-DUP-001".to_string(),
            applicant_id: ApplicantId("U-DUP-1".to_string()),
            confirmation_id: "CONF123".to_string(),
            slot_date: NaiveDate::from_ymd_opt(2025, 12, 18).expect("valid date"),
            slot_time: NaiveTime::from_hms_opt(9, 45, 0).expect("valid time"),
            confirmed_at: Utc::now(),
        };

        store.insert(&reservation).await.expect("first insert");
        assert!(store.insert(&reservation).await.is_err(), "primary key must reject duplicates");

        pool.close().await;
    }
}
