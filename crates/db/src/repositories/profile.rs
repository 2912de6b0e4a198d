use slotrace_core::chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use slotrace_core::domain::applicant::{ApplicantId, Profile};

use super::{ProfileStore, RepositoryError};
use crate::DbPool;

pub struct SqlProfileStore {
    pool: DbPool,
}

impl SqlProfileStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for SqlProfileStore {
    async fn upsert(
        &self,
        applicant_id: &ApplicantId,
        profile: &Profile,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO applicant_profile (
                applicant_id,
                given_name,
                family_name,
                document,
                email,
                phone,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(applicant_id) DO UPDATE SET
                given_name = excluded.given_name,
                family_name = excluded.family_name,
                document = excluded.document,
                email = excluded.email,
                phone = excluded.phone,
                updated_at = excluded.updated_at",
        )
        .bind(&applicant_id.0)
        .bind(&profile.given_name)
        .bind(&profile.family_name)
        .bind(&profile.document)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, applicant_id: &ApplicantId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT given_name, family_name, document, email, phone
             FROM applicant_profile
             WHERE applicant_id = ?",
        )
        .bind(&applicant_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(profile_from_row).transpose()
    }
}

fn profile_from_row(row: SqliteRow) -> Result<Profile, RepositoryError> {
    Ok(Profile {
        given_name: row.try_get("given_name")?,
        family_name: row.try_get("family_name")?,
        document: row.try_get("document")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
    })
}

#[cfg(test)]
mod tests {
    use slotrace_core::domain::applicant::{ApplicantId, Profile};

    use super::SqlProfileStore;
    use crate::migrations;
    use crate::repositories::ProfileStore;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn sample_profile() -> Profile {
        Profile {
            given_name: "Ana".to_string(),
            family_name: "Gomez".to_string(),
            document: "X1234567L".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+34600111222".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_round_trips_and_overwrites() {
        let pool = setup_pool().await;
        let store = SqlProfileStore::new(pool.clone());
        let applicant_id = ApplicantId("U-1".to_string());

        let profile = sample_profile();
        store.upsert(&applicant_id, &profile).await.expect("insert");
        assert_eq!(store.get(&applicant_id).await.expect("get"), Some(profile.clone()));

        let updated = Profile { phone: "+34600999888".to_string(), ..profile };
        store.upsert(&applicant_id, &updated).await.expect("update");
        assert_eq!(store.get(&applicant_id).await.expect("get"), Some(updated));

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let pool = setup_pool().await;
        let store = SqlProfileStore::new(pool.clone());

        let found = store.get(&ApplicantId("U-404".to_string())).await.expect("get");
        assert_eq!(found, None);

        pool.close().await;
    }
}
