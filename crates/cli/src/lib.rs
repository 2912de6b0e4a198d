pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "slotrace",
    about = "Slotrace operator CLI",
    long_about = "Operate the slotrace waiting list: migrations, readiness checks, queue and profile administration.",
    after_help = "Examples:\n  slotrace doctor --json\n  slotrace queue add 5901833301\n  slotrace profile show 5901833301"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Validate config and database connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(subcommand, about = "Inspect and administer the waiting queue")]
    Queue(QueueCommand),
    #[command(subcommand, about = "Manage applicant booking profiles")]
    Profile(ProfileCommand),
}

#[derive(Debug, Subcommand)]
enum QueueCommand {
    #[command(about = "List waiting applicants in FIFO order")]
    List,
    #[command(about = "Add an applicant to the back of the queue")]
    Add { applicant_id: String },
    #[command(about = "Remove an applicant from the queue entirely")]
    Remove { applicant_id: String },
    #[command(about = "Show an applicant's queue position")]
    Position { applicant_id: String },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    #[command(about = "Store the identity and contact fields used for booking")]
    Set {
        applicant_id: String,
        #[arg(long)]
        given_name: String,
        #[arg(long)]
        family_name: String,
        #[arg(long)]
        document: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },
    #[command(about = "Show an applicant's stored profile")]
    Show { applicant_id: String },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run().await,
        Command::Doctor { json } => commands::doctor::run(json).await,
        Command::Queue(queue_command) => match commands::open_pool("queue").await {
            Ok((_config, pool)) => {
                let result = match queue_command {
                    QueueCommand::List => commands::queue::list(&pool).await,
                    QueueCommand::Add { applicant_id } => {
                        commands::queue::add(&pool, &applicant_id).await
                    }
                    QueueCommand::Remove { applicant_id } => {
                        commands::queue::remove(&pool, &applicant_id).await
                    }
                    QueueCommand::Position { applicant_id } => {
                        commands::queue::position(&pool, &applicant_id).await
                    }
                };
                pool.close().await;
                result
            }
            Err(failure) => failure,
        },
        Command::Profile(profile_command) => match commands::open_pool("profile").await {
            Ok((_config, pool)) => {
                let result = match profile_command {
                    ProfileCommand::Set {
                        applicant_id,
                        given_name,
                        family_name,
                        document,
                        email,
                        phone,
                    } => {
                        commands::profile::set(
                            &pool,
                            &applicant_id,
                            &given_name,
                            &family_name,
                            &document,
                            &email,
                            &phone,
                        )
                        .await
                    }
                    ProfileCommand::Show { applicant_id } => {
                        commands::profile::show(&pool, &applicant_id).await
                    }
                };
                pool.close().await;
                result
            }
            Err(failure) => failure,
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
