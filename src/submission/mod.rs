//! Submission and status tracking.
//!
//! # Data Flow
//! ```text
//! Signed Envelope
//!     → submitter.rs (mock synthesis | RPC, then Horizon fallback)
//!     → SubmissionResult { transaction_id, status }
//!     → poller.rs (stream of StatusUpdate until terminal or ceiling)
//! ```
//!
//! # State Machine
//! ```text
//! Created --submit()--> Submitted(Pending) --poll success--> Success
//!                                           --poll failure--> Failed
//!                                           --ceiling-------> Failed
//! Created --structural error--> Failed
//! ```

pub mod poller;
pub mod submitter;

pub use poller::{StatusPoller, StatusUpdate};
pub use submitter::{mock_transaction_id, Submitter};
