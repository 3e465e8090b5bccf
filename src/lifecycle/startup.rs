//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging
//! - Build the application context
//!
//! # Design Decisions
//! - Fail fast: a malformed config or endpoint URL is fatal
//! - An unusable contract id is not an error; it only selects mock mode

use std::path::Path;

use crate::config::loader::load_or_default;
use crate::config::validation::contract_warnings;
use crate::context::AppContext;
use crate::observability::logging::init_logging;

/// Load config, start logging, build the context.
///
/// `log_level` from the command line takes precedence over the config file.
pub fn bootstrap(
    config_path: Option<&Path>,
    log_level: Option<&str>,
) -> Result<AppContext, Box<dyn std::error::Error>> {
    let config = load_or_default(config_path)?;

    init_logging(log_level.unwrap_or(&config.observability.log_level));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bookie-ledger starting");

    for issue in contract_warnings(&config) {
        tracing::warn!(field = issue.field, "{}", issue.message);
    }

    tracing::info!(
        rpc_url = %config.network.rpc_url(),
        horizon_url = %config.network.horizon_url(),
        max_poll_attempts = config.polling.max_attempts,
        poll_interval_ms = config.polling.interval_ms,
        "Configuration loaded"
    );

    Ok(AppContext::from_config(config)?)
}
