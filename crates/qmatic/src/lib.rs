//! Upstream scheduling API client.
//!
//! Talks to the Qmatic-style REST scheduler the bookings race against:
//! - **Client** (`client`) - pooled, warmup-capable reqwest client tuned for
//!   a legacy TLS host and sub-second response budgets
//! - **Wire** (`wire`) - tolerant decoding of a partially-known contract
//! - **Retry** (`retry`) - one consolidated policy for idempotent reads
//! - **Strategy** (`strategy`) - the direct-HTTP [`BookingStrategy`]
//!   implementation wired in by configuration
//!
//! [`BookingStrategy`]: slotrace_core::booking::BookingStrategy

pub mod client;
pub mod retry;
pub mod strategy;
pub mod wire;

pub use client::QmaticClient;
pub use retry::RetryPolicy;
pub use strategy::HttpBookingStrategy;
