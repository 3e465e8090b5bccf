//! Transaction submission.
//!
//! # Responsibilities
//! - Synthesize results in mock mode without any network I/O
//! - Submit to the Soroban RPC endpoint in real mode
//! - Fall back once to Horizon for envelopes without contract invocations
//!
//! # Design Decisions
//! - Submissions are never retried; the fallback is the only second chance
//! - Unsigned envelopes are rejected before any I/O in real mode

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ledger::envelope::Envelope;
use crate::ledger::traits::{ClassicLedger, LedgerRpc};
use crate::ledger::types::{
    LedgerError, LedgerResult, SubmissionError, SubmissionResult, TxStatus, ValidationError,
    MOCK_TX_PREFIX,
};
use crate::mode::TransactionMode;
use crate::observability::metrics;

const MOCK_SUFFIX_LEN: usize = 9;

/// Locally synthesized transaction id: `dev_<unix millis>_<random suffix>`.
pub fn mock_transaction_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: String = (0..MOCK_SUFFIX_LEN)
        .map(|_| fastrand::alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{}{}_{}", MOCK_TX_PREFIX, millis, suffix)
}

/// Hands signed envelopes to the ledger.
#[derive(Clone)]
pub struct Submitter {
    mode: TransactionMode,
    rpc: Arc<dyn LedgerRpc>,
    classic: Arc<dyn ClassicLedger>,
}

impl Submitter {
    pub fn new(
        mode: TransactionMode,
        rpc: Arc<dyn LedgerRpc>,
        classic: Arc<dyn ClassicLedger>,
    ) -> Self {
        Self { mode, rpc, classic }
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Decode a base64 envelope, then submit it. A malformed envelope fails
    /// here, before any I/O, in both modes.
    pub async fn submit_xdr(&self, xdr: &str) -> LedgerResult<SubmissionResult> {
        let envelope = Envelope::from_xdr(xdr)?;
        self.submit(&envelope).await
    }

    pub async fn submit(&self, envelope: &Envelope) -> LedgerResult<SubmissionResult> {
        match self.mode {
            TransactionMode::Mock => Ok(self.submit_mock()),
            TransactionMode::Real => self.submit_real(envelope).await,
        }
    }

    fn submit_mock(&self) -> SubmissionResult {
        let result = SubmissionResult {
            transaction_id: mock_transaction_id(),
            status: TxStatus::Success,
        };
        tracing::info!(tx_id = %result.transaction_id, "Mock transaction submitted");
        metrics::record_submission(TransactionMode::Mock, "success");
        result
    }

    async fn submit_real(&self, envelope: &Envelope) -> LedgerResult<SubmissionResult> {
        if !envelope.is_signed() {
            return Err(ValidationError::Unsigned.into());
        }

        let primary = match self.rpc.send_transaction(envelope).await {
            Ok(receipt) => {
                tracing::info!(tx_id = %receipt.hash, "Transaction submitted");
                metrics::record_submission(TransactionMode::Real, "accepted");
                return Ok(SubmissionResult {
                    transaction_id: receipt.hash,
                    status: TxStatus::Pending,
                });
            }
            Err(e) => e.to_string(),
        };

        if envelope.has_contract_invocation() {
            tracing::error!(error = %primary, "Submission failed; contract calls cannot use Horizon");
            metrics::record_submission(TransactionMode::Real, "failed");
            return Err(SubmissionError::PrimaryFailed { primary }.into());
        }

        tracing::warn!(error = %primary, "RPC submission failed, falling back to Horizon");
        match self.classic.submit_classic(envelope).await {
            Ok(receipt) => {
                tracing::info!(tx_id = %receipt.hash, "Transaction submitted via Horizon");
                metrics::record_fallback("accepted");
                metrics::record_submission(TransactionMode::Real, "accepted");
                Ok(SubmissionResult {
                    transaction_id: receipt.hash,
                    status: TxStatus::Pending,
                })
            }
            Err(LedgerError::TransactionFailed { detail, .. }) => {
                metrics::record_fallback("rejected");
                metrics::record_submission(TransactionMode::Real, "failed");
                Err(SubmissionError::FallbackFailed {
                    primary,
                    fallback: detail,
                }
                .into())
            }
            Err(e) => {
                metrics::record_fallback("unreachable");
                metrics::record_submission(TransactionMode::Real, "failed");
                Err(SubmissionError::BothFailed {
                    primary,
                    fallback: e.to_string(),
                }
                .into())
            }
        }
    }
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter").field("mode", &self.mode).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::is_mock_transaction_id;

    #[test]
    fn test_mock_id_shape() {
        let id = mock_transaction_id();
        assert!(is_mock_transaction_id(&id));
        let rest = &id[MOCK_TX_PREFIX.len()..];
        let (millis, suffix) = rest.split_once('_').unwrap();
        assert!(millis.parse::<u128>().is_ok());
        assert_eq!(suffix.len(), MOCK_SUFFIX_LEN);
    }

    #[test]
    fn test_mock_ids_differ() {
        assert_ne!(mock_transaction_id(), mock_transaction_id());
    }
}
