//! Ledger-facing types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of transaction ids synthesized in mock mode.
///
/// Anything starting with this marker was never sent to a network.
pub const MOCK_TX_PREFIX: &str = "dev_";

/// Returns true when the id was synthesized locally rather than returned by a ledger.
pub fn is_mock_transaction_id(id: &str) -> bool {
    id.starts_with(MOCK_TX_PREFIX)
}

/// Lifecycle status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Accepted by the network, not yet applied.
    Pending,
    /// Applied successfully.
    Success,
    /// Applied and failed, or abandoned.
    Failed,
}

impl TxStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Success => write!(f, "success"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of handing a signed envelope to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Transaction hash, or a synthesized `dev_` id in mock mode.
    pub transaction_id: String,
    /// Initial status. Mock submissions start (and end) at `Success`.
    pub status: TxStatus,
}

impl SubmissionResult {
    /// Whether this result was synthesized without touching the network.
    pub fn is_mock(&self) -> bool {
        is_mock_transaction_id(&self.transaction_id)
    }
}

/// Status of a transaction as reported by `getTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcTxStatus {
    Success,
    Failed,
    /// Unknown to the node yet (still in flight, or expired).
    NotFound,
}

/// A single `getTransaction` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: RpcTxStatus,
    /// Result XDR, when the node returned one.
    pub result_detail: Option<String>,
    /// Ledger the transaction was applied in.
    pub ledger: Option<u32>,
}

/// Acknowledgement of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub hash: String,
}

/// Account state needed to build a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountState {
    pub account_id: String,
    /// Current sequence number; the next transaction uses `sequence + 1`.
    pub sequence: i64,
    /// Balance in stroops.
    pub balance: i64,
}

/// Result of `simulateTransaction`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationResult {
    /// Base64 `SorobanTransactionData` to attach to the transaction.
    pub transaction_data: Option<String>,
    /// Minimum resource fee in stroops.
    pub min_resource_fee: i64,
    /// Base64 `SorobanAuthorizationEntry` values for the invocation.
    pub auth: Vec<String>,
    /// Base64 `ScVal` return value of the invocation.
    pub retval: Option<String>,
    pub latest_ledger: u32,
}

/// Malformed operation payloads and envelopes. Fatal and synchronous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid Stellar account ID format: '{0}'")]
    InvalidAccount(String),

    #[error("invalid contract ID format: '{0}'")]
    InvalidContract(String),

    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("malformed transaction envelope: {0}")]
    MalformedEnvelope(String),

    #[error("transaction has no signatures")]
    Unsigned,
}

/// Failures reported by a wallet signer. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("signature request was rejected by the user")]
    UserRejected,

    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Submission failures, raised only after the fallback decision was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Primary endpoint failed and the envelope was not eligible for fallback.
    #[error("transaction submission failed: {primary}")]
    PrimaryFailed { primary: String },

    /// Primary failed; the classic endpoint answered but rejected the transaction.
    #[error("transaction submission failed: rpc: {primary}; horizon rejected transaction: {fallback}")]
    FallbackFailed { primary: String, fallback: String },

    /// Primary failed and the classic endpoint could not be reached either.
    #[error("transaction submission failed: rpc: {primary}; horizon: {fallback}")]
    BothFailed { primary: String, fallback: String },
}

/// Failures while tracking a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// A status call failed; retried until the ceiling.
    #[error("transient status check failure: {0}")]
    Transient(String),

    #[error("transaction {tx_id} not final after {attempts} status checks")]
    CeilingExceeded { tx_id: String, attempts: u32 },

    #[error("status polling for {0} was cancelled")]
    Cancelled(String),
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    /// The ledger applied the transaction and it failed.
    #[error("transaction {tx_id} failed: {detail}")]
    TransactionFailed { tx_id: String, detail: String },

    #[error("XDR error: {0}")]
    Xdr(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl From<stellar_xdr::curr::Error> for LedgerError {
    fn from(e: stellar_xdr::curr::Error) -> Self {
        LedgerError::Xdr(e.to_string())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_id_detection() {
        assert!(is_mock_transaction_id("dev_1700000000000_ab12"));
        assert!(!is_mock_transaction_id("9f3c0a"));
        assert!(!is_mock_transaction_id(""));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TxStatus::Pending.is_terminal());
        assert!(TxStatus::Success.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Timeout(30);
        assert_eq!(err.to_string(), "RPC timeout after 30 seconds");

        let err = SubmissionError::BothFailed {
            primary: "connection refused".into(),
            fallback: "HTTP 504".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("connection refused"));
        assert!(msg.contains("HTTP 504"));

        let err: LedgerError = ValidationError::InvalidAccount("GABC".into()).into();
        assert!(err.to_string().contains("invalid Stellar account ID format"));
    }
}
