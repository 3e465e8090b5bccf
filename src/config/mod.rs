//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (BOOKIE_*)
//!     → validation.rs (semantic checks)
//!     → BookieConfig (validated, immutable)
//!     → AppContext (mode decision, clients, cache)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Defaults keep the client in mock mode

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::BookieConfig;
pub use schema::{BackoffKind, NetworkConfig, NetworkPreset, PollingConfig};
