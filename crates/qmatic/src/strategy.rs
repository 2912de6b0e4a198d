use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use slotrace_core::booking::{AttemptOutcome, BookingStrategy, UpstreamError};
use slotrace_core::payload::BookingRequest;

use crate::client::QmaticClient;

/// Direct-HTTP booking: POST the pre-rendered body, read back the
/// confirmation id. Every failure class folds into "not confirmed" so a bad
/// candidate can never poison its siblings in the fan-out.
pub struct HttpBookingStrategy {
    client: Arc<QmaticClient>,
}

impl HttpBookingStrategy {
    pub fn new(client: Arc<QmaticClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingStrategy for HttpBookingStrategy {
    async fn attempt(&self, request: &BookingRequest) -> AttemptOutcome {
        match self.client.create_appointment(&request.body).await {
            Ok(confirmation_id) => AttemptOutcome::Confirmed { confirmation_id },
            Err(UpstreamError::Status(status)) => {
                debug!(
                    event_name = "booking.attempt.rejected",
                    candidate = %request.candidate,
                    status,
                    "candidate rejected upstream"
                );
                AttemptOutcome::Rejected { reason: format!("upstream status {status}") }
            }
            Err(UpstreamError::Decode(message)) => {
                AttemptOutcome::Rejected { reason: message }
            }
            Err(error @ (UpstreamError::Transport(_) | UpstreamError::Timeout(_))) => {
                AttemptOutcome::TransportError { message: error.to_string() }
            }
        }
    }
}
