//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! PendingOperation (kind + payload)
//!     → builder.rs (validate, mock payment or contract invocation)
//!     → signer.rs / traits::Signer (wallet signature)
//!     → submission::Submitter (rpc.rs, horizon.rs fallback)
//!     → submission::StatusPoller (rpc.rs getTransaction)
//! ```
//!
//! # Security Constraints
//! - Secret seeds ONLY from environment variables
//! - Never log secret seeds or signatures
//! - All RPC calls have configurable timeouts

pub mod builder;
pub mod envelope;
pub mod horizon;
pub mod rpc;
pub mod signer;
pub mod strkey;
pub mod traits;
pub mod types;

pub use builder::{OperationKind, OperationPayload, PendingOperation, TransactionBuilder};
pub use envelope::Envelope;
pub use horizon::HorizonClient;
pub use rpc::SorobanRpcClient;
pub use signer::LocalSigner;
pub use traits::{ClassicLedger, LedgerRpc, Signer};
pub use types::{LedgerError, LedgerResult, SubmissionResult, TxStatus};
