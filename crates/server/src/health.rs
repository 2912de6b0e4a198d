use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use slotrace_db::{DbPool, QueueStore};
use slotrace_engine::{PollerStats, StatsSnapshot};

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    queue: Arc<dyn QueueStore>,
    stats: Arc<PollerStats>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusResponse {
    pub monitor: StatsSnapshot,
    pub queue_depth: u64,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, queue: Arc<dyn QueueStore>, stats: Arc<PollerStats>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(HealthState { db_pool, queue, stats })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    db_pool: DbPool,
    queue: Arc<dyn QueueStore>,
    stats: Arc<PollerStats>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(db_pool, queue, stats)).await {
            error!(
                event_name = "system.health.error",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "slotrace-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

pub async fn status(State(state): State<HealthState>) -> (StatusCode, Json<StatusResponse>) {
    let queue_depth = match state.queue.depth().await {
        Ok(depth) => depth,
        Err(error) => {
            error!(event_name = "system.status.queue_error", error = %error, "queue depth query failed");
            0
        }
    };

    let payload = StatusResponse {
        monitor: state.stats.snapshot(),
        queue_depth,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}
