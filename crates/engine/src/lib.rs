//! Slot acquisition runtime.
//!
//! Two dependency-ordered components:
//! - **Poller** (`poller`) - long-lived loop watching the upstream for open
//!   dates, with an adaptive time-of-day interval
//! - **Engine** (`acquire`) - converts one availability event into at most
//!   one confirmed reservation for the head of the queue: dequeue, blind
//!   candidate fan-out, first-confirmation arbitration, directory fallback,
//!   persistence
//!
//! Plus the operator `heartbeat` task.

pub mod acquire;
pub mod heartbeat;
pub mod poller;

pub use acquire::{AcquisitionEngine, EngineConfig, Outcome};
pub use heartbeat::DailyHeartbeat;
pub use poller::{AvailabilityHandler, AvailabilityPoller, PollerStats, StatsSnapshot};
