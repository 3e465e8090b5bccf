//! Bookie ledger client library

pub mod config;
pub mod context;
pub mod ledger;
pub mod lifecycle;
pub mod marketplace;
pub mod mode;
pub mod observability;
pub mod resilience;
pub mod submission;

pub use config::schema::BookieConfig;
pub use context::AppContext;
pub use lifecycle::Shutdown;
pub use mode::{resolve_mode, BuildTag, ModeDecision, TransactionMode};
