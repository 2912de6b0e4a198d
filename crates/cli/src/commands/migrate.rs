use super::CommandResult;

pub async fn run() -> CommandResult {
    match super::open_pool("migrate").await {
        Ok((_config, pool)) => {
            pool.close().await;
            CommandResult::success("migrate", "database schema is up to date")
        }
        Err(failure) => failure,
    }
}
