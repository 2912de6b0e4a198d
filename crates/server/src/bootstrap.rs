use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use slotrace_core::booking::{StrategyKind, UpstreamError};
use slotrace_core::config::{AppConfig, ConfigError, LoadOptions};
use slotrace_db::repositories::{SqlProfileStore, SqlQueueStore, SqlReservationStore};
use slotrace_db::{connect_with_settings, migrations, DbPool, QueueStore};
use slotrace_engine::{AcquisitionEngine, AvailabilityPoller, DailyHeartbeat, EngineConfig, PollerStats};
use slotrace_notify::{NoopNotifier, Notifier, NotifyError, TelegramNotifier};
use slotrace_qmatic::{HttpBookingStrategy, QmaticClient};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub queue: Arc<dyn QueueStore>,
    pub poller: Arc<AvailabilityPoller>,
    pub heartbeat: Arc<DailyHeartbeat>,
    pub stats: Arc<PollerStats>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("upstream client construction failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("notifier construction failed: {0}")]
    Notifier(#[from] NotifyError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let client = Arc::new(QmaticClient::new(&config.upstream)?);
    // Pay the DNS/TLS handshake now, not when the first slot appears.
    client.warmup().await;

    let notifier: Arc<dyn Notifier> = if config.telegram.enabled {
        Arc::new(TelegramNotifier::new(&config.telegram)?)
    } else {
        Arc::new(NoopNotifier)
    };

    let queue: Arc<dyn QueueStore> = Arc::new(SqlQueueStore::new(db_pool.clone()));
    let profiles = Arc::new(SqlProfileStore::new(db_pool.clone()));
    let reservations = Arc::new(SqlReservationStore::new(db_pool.clone()));

    let strategy = match config.booking.strategy {
        StrategyKind::Http => Arc::new(HttpBookingStrategy::new(client.clone())),
    };

    let engine = Arc::new(AcquisitionEngine::new(
        queue.clone(),
        profiles,
        reservations,
        strategy,
        client.clone(),
        notifier.clone(),
        config.booking.catalog()?,
        config.upstream.target(),
        EngineConfig {
            attempt_timeout: config.booking.attempt_timeout(),
            operator_chat_id: config.telegram.admin_chat_id.clone(),
            booking_page_url: config.booking.booking_page_url.clone(),
        },
    ));

    let poller =
        Arc::new(AvailabilityPoller::new(client, engine, config.monitor.schedule()?));
    let stats = poller.stats();

    let heartbeat = Arc::new(DailyHeartbeat::new(
        notifier,
        config.telegram.admin_chat_id.clone(),
        config.monitor.heartbeat_hour,
        stats.clone(),
    ));

    info!(
        event_name = "system.bootstrap.done",
        strategy = config.booking.strategy.as_str(),
        notifications = config.telegram.enabled,
        "application bootstrap complete"
    );

    Ok(Application { config, db_pool, queue, poller, heartbeat, stats })
}

#[cfg(test)]
mod tests {
    use slotrace_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                upstream_base_url: Some("https://booking.example.test/rest/schedule".to_string()),
                upstream_branch_id: Some("branch-test".to_string()),
                upstream_service_id: Some("service-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_upstream_coordinates() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("upstream.base_url"));
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_queue_access() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('applicant_profile', 'queue_entry', 'reservation')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 3, "bootstrap should expose the queue-path tables");

        let depth = app.queue.depth().await.expect("queue depth query");
        assert_eq!(depth, 0);

        app.db_pool.close().await;
    }
}
