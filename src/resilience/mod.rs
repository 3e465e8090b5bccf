//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Ledger call that may need repeating (status poll, simulation):
//!     → retries.rs (attempt ceiling, delay schedule)
//!     → backoff.rs (fixed / linear / exponential-with-jitter delays)
//! ```
//!
//! # Design Decisions
//! - Every external call also has its own request timeout (see ledger::rpc)
//! - Submissions are never retried; only the one-shot classic fallback applies

pub mod backoff;
pub mod retries;

pub use retries::{Delay, RetryPolicy};
