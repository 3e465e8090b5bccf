//! Shutdown coordination.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Wraps a cancellation token that pollers and other long-running tasks
/// watch. Child tokens can be cancelled on their own without affecting the
/// rest of the process.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is cancelled when shutdown is triggered.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Token for one task: cancelled on shutdown, or on its own.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_cancels_children() {
        let shutdown = Shutdown::new();
        let child = shutdown.child_token();
        assert!(!child.is_cancelled());

        shutdown.trigger();
        assert!(shutdown.is_triggered());
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_is_local() {
        let shutdown = Shutdown::new();
        let child = shutdown.child_token();
        child.cancel();
        assert!(!shutdown.is_triggered());
    }
}
