//! End-to-end execution of one marketplace operation.
//!
//! # Data Flow
//! ```text
//! PendingOperation
//!     → TransactionBuilder::build (validate; mock payment | simulated invocation)
//!     → Signer::sign
//!     → Submitter::submit
//!     → StatusPoller::wait_for_completion (real mode only)
//!     → AssetCache (successful listings and purchases)
//!     → TxOutcome
//! ```

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::ledger::builder::{OperationKind, OperationPayload, PendingOperation, TransactionBuilder};
use crate::ledger::traits::Signer;
use crate::ledger::types::{LedgerResult, SignerError, TxStatus};
use crate::marketplace::cache::{now_secs, AssetCache, AssetRecord};
use crate::marketplace::catalog::find_sample_asset;
use crate::mode::TransactionMode;
use crate::observability::metrics;
use crate::submission::{StatusPoller, Submitter};

/// Terminal result of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub correlation_id: u64,
    pub kind: OperationKind,
    pub mode: TransactionMode,
    pub transaction_id: String,
    pub status: TxStatus,
    pub ledger: Option<u32>,
    pub detail: Option<String>,
}

impl TxOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}

/// Runs operations through build, sign, submit and poll.
#[derive(Clone)]
pub struct Workflow {
    mode: TransactionMode,
    passphrase: String,
    builder: Arc<TransactionBuilder>,
    submitter: Submitter,
    poller: StatusPoller,
    cache: AssetCache,
}

impl Workflow {
    pub fn new(
        mode: TransactionMode,
        passphrase: impl Into<String>,
        builder: Arc<TransactionBuilder>,
        submitter: Submitter,
        poller: StatusPoller,
        cache: AssetCache,
    ) -> Self {
        Self {
            mode,
            passphrase: passphrase.into(),
            builder,
            submitter,
            poller,
            cache,
        }
    }

    /// Execute `op` to a terminal status. A `Failed` transaction is an
    /// outcome, not an error; errors are validation, signer, submission and
    /// polling failures.
    pub async fn execute(
        &self,
        op: &PendingOperation,
        signer: &dyn Signer,
        cancel: CancellationToken,
    ) -> LedgerResult<TxOutcome> {
        let span = tracing::info_span!(
            "operation",
            correlation_id = op.correlation_id,
            kind = %op.kind(),
            mode = %self.mode
        );
        self.run(op, signer, cancel).instrument(span).await
    }

    async fn run(
        &self,
        op: &PendingOperation,
        signer: &dyn Signer,
        cancel: CancellationToken,
    ) -> LedgerResult<TxOutcome> {
        let envelope = self.builder.build(op, self.mode).await?;

        let signed = signer
            .sign(&envelope, &self.passphrase)
            .await
            .inspect_err(|e| {
                metrics::record_signer_rejection(match e {
                    SignerError::UserRejected => "user_rejected",
                    SignerError::Unavailable(_) => "unavailable",
                });
                tracing::warn!(error = %e, "Signing failed");
            })?;

        let submission = self.submitter.submit(&signed).await?;

        let mut outcome = TxOutcome {
            correlation_id: op.correlation_id,
            kind: op.kind(),
            mode: self.mode,
            transaction_id: submission.transaction_id.clone(),
            status: submission.status,
            ledger: None,
            detail: None,
        };

        if !submission.status.is_terminal() {
            let update = self
                .poller
                .wait_for_completion(&submission.transaction_id, cancel)
                .await?;
            outcome.status = update.status;
            outcome.ledger = update.ledger;
            outcome.detail = update.detail;
        }

        if outcome.is_success() {
            self.record(op, &outcome);
        }
        tracing::info!(tx_id = %outcome.transaction_id, status = %outcome.status, "Operation finished");
        Ok(outcome)
    }

    fn record(&self, op: &PendingOperation, outcome: &TxOutcome) {
        match &op.payload {
            OperationPayload::ListAsset {
                title,
                description,
                data_type,
                price,
                size,
                ..
            } => self.cache.record_listing(
                &op.requester,
                AssetRecord {
                    id: outcome.transaction_id.clone(),
                    title: title.clone(),
                    description: description.clone(),
                    data_type: data_type.clone(),
                    price: *price,
                    size: size.clone(),
                    tx_id: outcome.transaction_id.clone(),
                    recorded_at: now_secs(),
                },
            ),
            OperationPayload::PurchaseAsset { asset_id, price } => {
                let sample = find_sample_asset(asset_id);
                self.cache.record_purchase(
                    &op.requester,
                    AssetRecord {
                        id: asset_id.clone(),
                        title: sample
                            .as_ref()
                            .map(|a| a.title.clone())
                            .unwrap_or_else(|| asset_id.clone()),
                        description: sample
                            .as_ref()
                            .map(|a| a.description.clone())
                            .unwrap_or_default(),
                        data_type: sample
                            .as_ref()
                            .map(|a| a.data_type.clone())
                            .unwrap_or_default(),
                        price: *price,
                        size: sample.map(|a| a.size).unwrap_or_default(),
                        tx_id: outcome.transaction_id.clone(),
                        recorded_at: now_secs(),
                    },
                );
            }
            OperationPayload::CreateRequest { .. } | OperationPayload::ApproveRequest { .. } => {}
        }
    }
}
