use slotrace_core::domain::applicant::ApplicantId;
use slotrace_core::domain::queue::QueuePosition;
use slotrace_db::repositories::SqlQueueStore;
use slotrace_db::{DbPool, QueueStore};

use super::CommandResult;

pub async fn add(pool: &DbPool, applicant_id: &str) -> CommandResult {
    let store = SqlQueueStore::new(pool.clone());
    match store.enqueue(&ApplicantId(applicant_id.to_string())).await {
        Ok(QueuePosition::Waiting(position)) => CommandResult::success(
            "queue.add",
            format!("applicant {applicant_id} is waiting at position {position}"),
        ),
        Ok(position) => CommandResult::failure(
            "queue.add",
            "queue_state",
            format!("applicant {applicant_id} cannot be enqueued: {}", describe(position)),
            1,
        ),
        Err(error) => CommandResult::failure("queue.add", "database", error.to_string(), 1),
    }
}

pub async fn remove(pool: &DbPool, applicant_id: &str) -> CommandResult {
    let store = SqlQueueStore::new(pool.clone());
    match store.remove(&ApplicantId(applicant_id.to_string())).await {
        Ok(true) => {
            CommandResult::success("queue.remove", format!("applicant {applicant_id} removed"))
        }
        Ok(false) => CommandResult::failure(
            "queue.remove",
            "not_found",
            format!("applicant {applicant_id} is not in the queue"),
            1,
        ),
        Err(error) => CommandResult::failure("queue.remove", "database", error.to_string(), 1),
    }
}

pub async fn position(pool: &DbPool, applicant_id: &str) -> CommandResult {
    let store = SqlQueueStore::new(pool.clone());
    match store.position(&ApplicantId(applicant_id.to_string())).await {
        Ok(position) => CommandResult::success(
            "queue.position",
            format!("applicant {applicant_id}: {}", describe(position)),
        ),
        Err(error) => CommandResult::failure("queue.position", "database", error.to_string(), 1),
    }
}

pub async fn list(pool: &DbPool) -> CommandResult {
    let store = SqlQueueStore::new(pool.clone());
    match store.waiting().await {
        Ok(entries) => {
            let lines: Vec<String> = entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    format!(
                        "#{} {} (since {})",
                        index + 1,
                        entry.applicant_id,
                        entry.enqueued_at.to_rfc3339()
                    )
                })
                .collect();
            let message = if lines.is_empty() {
                "queue is empty".to_string()
            } else {
                lines.join("; ")
            };
            CommandResult::success("queue.list", message)
        }
        Err(error) => CommandResult::failure("queue.list", "database", error.to_string(), 1),
    }
}

fn describe(position: QueuePosition) -> String {
    match position {
        QueuePosition::Waiting(rank) => format!("waiting at position {rank}"),
        QueuePosition::Processing => "inside an acquisition cycle".to_string(),
        QueuePosition::Booked => "already booked".to_string(),
        QueuePosition::Abandoned => "abandoned".to_string(),
        QueuePosition::Absent => "not in the queue".to_string(),
    }
}
