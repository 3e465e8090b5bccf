//! Transaction status polling.
//!
//! # Responsibilities
//! - Turn repeated `getTransaction` calls into a lazy, finite stream
//! - Stop at a terminal status, at the attempt ceiling, or on cancellation
//!
//! # Design Decisions
//! - Every call to `poll_status` starts a fresh attempt counter
//! - A failed status call is transient: it uses up an attempt but yields nothing
//! - The ceiling is reported as an error item, never swallowed
//! - Mock ids short-circuit to one `Success` without any network call

use futures_util::stream::{self, Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ledger::traits::LedgerRpc;
use crate::ledger::types::{is_mock_transaction_id, PollError, RpcTxStatus, TxStatus};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// One observation of a transaction's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub tx_id: String,
    /// 1-based status call that produced this update; 0 for mock ids.
    pub attempt: u32,
    pub status: TxStatus,
    pub ledger: Option<u32>,
    /// Result XDR reported with a terminal status.
    pub detail: Option<String>,
}

struct PollState {
    rpc: Arc<dyn LedgerRpc>,
    policy: RetryPolicy,
    tx_id: String,
    cancel: CancellationToken,
    attempt: u32,
    done: bool,
}

async fn next_update(mut st: PollState) -> Option<(Result<StatusUpdate, PollError>, PollState)> {
    if st.done {
        return None;
    }

    if is_mock_transaction_id(&st.tx_id) {
        st.done = true;
        let update = StatusUpdate {
            tx_id: st.tx_id.clone(),
            attempt: 0,
            status: TxStatus::Success,
            ledger: None,
            detail: None,
        };
        return Some((Ok(update), st));
    }

    loop {
        if st.attempt > 0 {
            let Some(delay) = st.policy.delay_after(st.attempt) else {
                st.done = true;
                tracing::warn!(tx_id = %st.tx_id, attempts = st.attempt, "Status polling gave up");
                let err = PollError::CeilingExceeded {
                    tx_id: st.tx_id.clone(),
                    attempts: st.attempt,
                };
                return Some((Err(err), st));
            };
            tokio::select! {
                _ = st.cancel.cancelled() => {
                    tracing::debug!(tx_id = %st.tx_id, "Status polling cancelled");
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        } else if st.cancel.is_cancelled() {
            return None;
        }

        st.attempt += 1;
        let result = tokio::select! {
            biased;
            _ = st.cancel.cancelled() => {
                tracing::debug!(tx_id = %st.tx_id, "Status polling cancelled");
                return None;
            }
            r = st.rpc.get_transaction_status(&st.tx_id) => r,
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                metrics::record_poll_attempt("error");
                tracing::warn!(
                    tx_id = %st.tx_id,
                    attempt = st.attempt,
                    error = %PollError::Transient(e.to_string()),
                    "Status check failed"
                );
                continue;
            }
        };

        let status = match report.status {
            RpcTxStatus::Success => TxStatus::Success,
            RpcTxStatus::Failed => TxStatus::Failed,
            RpcTxStatus::NotFound => TxStatus::Pending,
        };
        metrics::record_poll_attempt(match status {
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
            TxStatus::Pending => "pending",
        });

        if status.is_terminal() {
            st.done = true;
            tracing::info!(tx_id = %st.tx_id, attempt = st.attempt, status = %status, "Transaction final");
        } else {
            tracing::debug!(tx_id = %st.tx_id, attempt = st.attempt, "Transaction pending");
        }

        let update = StatusUpdate {
            tx_id: st.tx_id.clone(),
            attempt: st.attempt,
            status,
            ledger: report.ledger,
            detail: report.result_detail,
        };
        return Some((Ok(update), st));
    }
}

/// Polls transaction status through the ledger RPC.
#[derive(Clone)]
pub struct StatusPoller {
    rpc: Arc<dyn LedgerRpc>,
    policy: RetryPolicy,
}

impl StatusPoller {
    pub fn new(rpc: Arc<dyn LedgerRpc>, policy: RetryPolicy) -> Self {
        Self { rpc, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Lazy stream of status updates for `tx_id`.
    ///
    /// Yields `Pending` while the node does not know the transaction yet, then
    /// one terminal update. After `max_attempts` status calls without a
    /// terminal status it yields `PollError::CeilingExceeded` and ends.
    /// Cancelling `cancel` ends the stream without further calls.
    pub fn poll_status(
        &self,
        tx_id: &str,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<StatusUpdate, PollError>> + Send + 'static {
        let state = PollState {
            rpc: self.rpc.clone(),
            policy: self.policy,
            tx_id: tx_id.to_string(),
            cancel,
            attempt: 0,
            done: false,
        };
        stream::unfold(state, next_update)
    }

    /// Drive the stream to its terminal update, handing every update to
    /// `on_update` on the way. A stream that ends without a terminal update
    /// was cancelled.
    pub async fn watch<F>(
        &self,
        tx_id: &str,
        cancel: CancellationToken,
        mut on_update: F,
    ) -> Result<StatusUpdate, PollError>
    where
        F: FnMut(&StatusUpdate),
    {
        let mut updates = Box::pin(self.poll_status(tx_id, cancel));
        while let Some(item) = updates.next().await {
            let update = item?;
            on_update(&update);
            if update.status.is_terminal() {
                return Ok(update);
            }
        }
        Err(PollError::Cancelled(tx_id.to_string()))
    }

    /// Drive the stream to its terminal update.
    pub async fn wait_for_completion(
        &self,
        tx_id: &str,
        cancel: CancellationToken,
    ) -> Result<StatusUpdate, PollError> {
        self.watch(tx_id, cancel, |_| {}).await
    }
}

impl std::fmt::Debug for StatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusPoller")
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::envelope::Envelope;
    use crate::ledger::types::{
        AccountState, LedgerError, LedgerResult, SendReceipt, SimulationResult, StatusReport,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers status calls from a script; repeats the last answer when empty.
    struct StatusScript {
        answers: Mutex<VecDeque<LedgerResult<StatusReport>>>,
        calls: AtomicU32,
    }

    impl StatusScript {
        fn new(answers: Vec<LedgerResult<StatusReport>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn report(status: RpcTxStatus) -> LedgerResult<StatusReport> {
        Ok(StatusReport {
            status,
            result_detail: None,
            ledger: None,
        })
    }

    #[async_trait]
    impl LedgerRpc for StatusScript {
        async fn health(&self) -> LedgerResult<String> {
            Ok("healthy".into())
        }

        async fn send_transaction(&self, _: &Envelope) -> LedgerResult<SendReceipt> {
            unreachable!()
        }

        async fn get_transaction_status(&self, _: &str) -> LedgerResult<StatusReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut answers = self.answers.lock().unwrap();
            match answers.len() {
                0 => report(RpcTxStatus::NotFound),
                1 => match answers.front().unwrap() {
                    Ok(r) => Ok(r.clone()),
                    Err(e) => Err(LedgerError::Rpc(e.to_string())),
                },
                _ => answers.pop_front().unwrap(),
            }
        }

        async fn get_account(&self, _: &str) -> LedgerResult<AccountState> {
            unreachable!()
        }

        async fn simulate_transaction(&self, _: &Envelope) -> LedgerResult<SimulationResult> {
            unreachable!()
        }
    }

    fn poller(rpc: Arc<StatusScript>, attempts: u32) -> StatusPoller {
        StatusPoller::new(rpc, RetryPolicy::fixed(attempts, Duration::from_secs(2)))
    }

    #[tokio::test]
    async fn test_mock_id_short_circuits() {
        let rpc = StatusScript::new(vec![]);
        let updates: Vec<_> = poller(rpc.clone(), 10)
            .poll_status("dev_1700000000000_abc", CancellationToken::new())
            .collect()
            .await;

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].as_ref().unwrap().status, TxStatus::Success);
        assert_eq!(rpc.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_success() {
        let rpc = StatusScript::new(vec![
            report(RpcTxStatus::NotFound),
            report(RpcTxStatus::NotFound),
            report(RpcTxStatus::Success),
        ]);
        let updates: Vec<_> = poller(rpc.clone(), 10)
            .poll_status("abc123", CancellationToken::new())
            .collect()
            .await;

        let statuses: Vec<_> = updates.iter().map(|u| u.as_ref().unwrap().status).collect();
        assert_eq!(
            statuses,
            vec![TxStatus::Pending, TxStatus::Pending, TxStatus::Success]
        );
        assert_eq!(rpc.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_after_exactly_n_calls() {
        let rpc = StatusScript::new(vec![]);
        let start = tokio::time::Instant::now();
        let result = poller(rpc.clone(), 5)
            .wait_for_completion("abc123", CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(PollError::CeilingExceeded {
                tx_id: "abc123".into(),
                attempts: 5
            })
        );
        assert_eq!(rpc.calls(), 5);
        // Four delays between five attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_count_toward_ceiling() {
        let rpc = StatusScript::new(vec![
            Err(LedgerError::Rpc("connection reset".into())),
            report(RpcTxStatus::Failed),
        ]);
        let update = poller(rpc.clone(), 3)
            .wait_for_completion("abc123", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(update.status, TxStatus::Failed);
        assert_eq!(update.attempt, 2);
        assert_eq!(rpc.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_counter_per_call() {
        let rpc = StatusScript::new(vec![]);
        let p = poller(rpc.clone(), 2);
        let _ = p.wait_for_completion("abc", CancellationToken::new()).await;
        let _ = p.wait_for_completion("abc", CancellationToken::new()).await;
        assert_eq!(rpc.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling() {
        let rpc = StatusScript::new(vec![]);
        let p = poller(rpc.clone(), 10);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let result = p.wait_for_completion("abc123", cancel).await;
        assert_eq!(result, Err(PollError::Cancelled("abc123".into())));
        // Calls at t=0 and t=2; cancelled during the wait before t=4.
        assert_eq!(rpc.calls(), 2);
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_calls() {
        let rpc = StatusScript::new(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let updates: Vec<_> = poller(rpc.clone(), 10)
            .poll_status("abc123", cancel)
            .collect()
            .await;
        assert!(updates.is_empty());
        assert_eq!(rpc.calls(), 0);
    }
}
