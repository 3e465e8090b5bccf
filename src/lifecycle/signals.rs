//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for Ctrl-C (SIGINT)
//! - Translate it into a shutdown trigger
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second Ctrl-C is left to the default handler once the listener ends

use crate::lifecycle::shutdown::Shutdown;

/// Spawn a task that triggers `shutdown` on the first Ctrl-C.
pub fn spawn_ctrl_c_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let token = shutdown.token();
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    tracing::info!("Interrupt received, cancelling in-flight work");
                    shutdown.trigger();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
            },
            _ = token.cancelled() => {}
        }
    })
}
