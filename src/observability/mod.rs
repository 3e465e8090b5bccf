//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stderr (fmt layer)
//!     → any metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields (`tx_id`, `attempt`) instead of formatted messages
//! - Metrics are cheap and optional

pub mod logging;
pub mod metrics;
