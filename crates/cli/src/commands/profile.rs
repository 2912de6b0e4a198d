use slotrace_core::domain::applicant::{ApplicantId, Profile};
use slotrace_db::repositories::SqlProfileStore;
use slotrace_db::{DbPool, ProfileStore};

use super::CommandResult;

#[allow(clippy::too_many_arguments)]
pub async fn set(
    pool: &DbPool,
    applicant_id: &str,
    given_name: &str,
    family_name: &str,
    document: &str,
    email: &str,
    phone: &str,
) -> CommandResult {
    let profile = Profile {
        given_name: given_name.to_string(),
        family_name: family_name.to_string(),
        document: document.to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
    };

    let store = SqlProfileStore::new(pool.clone());
    match store.upsert(&ApplicantId(applicant_id.to_string()), &profile).await {
        Ok(()) => CommandResult::success(
            "profile.set",
            format!("profile stored for applicant {applicant_id}"),
        ),
        Err(error) => CommandResult::failure("profile.set", "database", error.to_string(), 1),
    }
}

pub async fn show(pool: &DbPool, applicant_id: &str) -> CommandResult {
    let store = SqlProfileStore::new(pool.clone());
    match store.get(&ApplicantId(applicant_id.to_string())).await {
        Ok(Some(profile)) => CommandResult::success(
            "profile.show",
            format!(
                "{}; document {}; email {}; phone {}",
                profile.full_name(),
                profile.document,
                profile.email,
                profile.phone
            ),
        ),
        Ok(None) => CommandResult::failure(
            "profile.show",
            "not_found",
            format!("no profile stored for applicant {applicant_id}"),
            1,
        ),
        Err(error) => CommandResult::failure("profile.show", "database", error.to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use slotrace_db::{connect_with_settings, migrations, DbPool};

    use super::{set, show};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn set_then_show_round_trips() {
        let pool = setup_pool().await;

        let stored = set(
            &pool,
            "U-1",
            "Ana",
            "Gomez",
            "X1234567L",
            "ana@example.com",
            "+34600111222",
        )
        .await;
        assert_eq!(stored.exit_code, 0);

        let shown = show(&pool, "U-1").await;
        assert_eq!(shown.exit_code, 0);
        assert!(shown.output.contains("Ana Gomez"));
        assert!(shown.output.contains("X1234567L"));

        let missing = show(&pool, "U-404").await;
        assert_eq!(missing.exit_code, 1);

        pool.close().await;
    }
}
