//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Init logging → Build AppContext
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Cancellation token cancelled → Pollers stop scheduling attempts
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
