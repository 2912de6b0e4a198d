use serde::Serialize;

use slotrace_core::config::{AppConfig, LoadOptions};
use slotrace_db::connect_with_settings;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    ok: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: String,
    checks: Vec<DoctorCheck>,
}

pub async fn run(json: bool) -> CommandResult {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                ok: true,
                detail: "configuration loaded and validated".to_string(),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck { name: "config", ok: false, detail: error.to_string() });
            None
        }
    };

    if let Some(config) = &config {
        match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => {
                let detail = match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&pool).await
                {
                    Ok(_) => DoctorCheck {
                        name: "database",
                        ok: true,
                        detail: "database reachable".to_string(),
                    },
                    Err(error) => DoctorCheck {
                        name: "database",
                        ok: false,
                        detail: format!("database query failed: {error}"),
                    },
                };
                checks.push(detail);
                pool.close().await;
            }
            Err(error) => {
                checks.push(DoctorCheck {
                    name: "database",
                    ok: false,
                    detail: format!("database connection failed: {error}"),
                });
            }
        }

        checks.push(DoctorCheck {
            name: "notifications",
            ok: true,
            detail: if config.telegram.enabled {
                "telegram notifications enabled".to_string()
            } else {
                "notifications disabled".to_string()
            },
        });
    }

    let healthy = checks.iter().all(|check| check.ok);
    let report = DoctorReport {
        status: if healthy { "ok".to_string() } else { "error".to_string() },
        checks,
    };

    let output = if json {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| error.to_string())
    } else {
        let mut lines = vec![format!("status: {}", report.status)];
        for check in &report.checks {
            lines.push(format!(
                "  [{}] {}: {}",
                if check.ok { "ok" } else { "fail" },
                check.name,
                check.detail
            ));
        }
        lines.join("\n")
    };

    CommandResult { exit_code: u8::from(!healthy), output }
}
