//! Capability interfaces for the external collaborators.
//!
//! The submission core only talks to the network and the wallet through these
//! traits. Production implementations live in `rpc.rs`, `horizon.rs` and
//! `signer.rs`; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::ledger::envelope::Envelope;
use crate::ledger::types::{
    AccountState, LedgerResult, SendReceipt, SignerError, SimulationResult, StatusReport,
};

/// Soroban JSON-RPC endpoint.
///
/// Implementations are shared across tasks through `Arc`, so they must be
/// `Send + Sync`.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Node health string (`"healthy"` when ready).
    async fn health(&self) -> LedgerResult<String>;

    /// Hand a signed envelope to the node. Acceptance is not inclusion.
    async fn send_transaction(&self, envelope: &Envelope) -> LedgerResult<SendReceipt>;

    async fn get_transaction_status(&self, tx_id: &str) -> LedgerResult<StatusReport>;

    /// Fails with `LedgerError::AccountNotFound` for unfunded accounts.
    async fn get_account(&self, account_id: &str) -> LedgerResult<AccountState>;

    async fn simulate_transaction(&self, envelope: &Envelope) -> LedgerResult<SimulationResult>;
}

/// Classic (Horizon) submission endpoint, used only as a fallback.
#[async_trait]
pub trait ClassicLedger: Send + Sync {
    /// Fails with `LedgerError::TransactionFailed` when Horizon answered and
    /// rejected the transaction, and with a transport error otherwise.
    async fn submit_classic(&self, envelope: &Envelope) -> LedgerResult<SendReceipt>;

    async fn is_reachable(&self) -> bool;
}

/// A wallet that can sign envelopes: browser extension, passkey, or local key.
#[async_trait]
pub trait Signer: Send + Sync {
    /// `G…` account the signer signs for.
    fn account_id(&self) -> String;

    async fn sign(&self, envelope: &Envelope, network_passphrase: &str)
        -> Result<Envelope, SignerError>;
}
