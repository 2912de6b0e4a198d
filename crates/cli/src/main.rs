use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    slotrace_cli::run().await
}
