//! Transaction building.
//!
//! # Responsibilities
//! - Validate operation payloads before anything else happens
//! - Build the mock-mode payment that stands in for a contract call
//! - Build, simulate and assemble real-mode contract invocations
//!
//! # Design Decisions
//! - Mock builds never touch the network; the source account's sequence is
//!   taken as 0 so the transaction uses sequence 1
//! - Simulation is retried on transport errors only; a simulation that ran
//!   and reported an error is final

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use stellar_xdr::curr::{
    Asset, HostFunction, Int128Parts, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo,
    Operation, OperationBody, PaymentOp, Preconditions, ReadXdr, ScString, ScSymbol, ScVal,
    SequenceNumber, SorobanAuthorizationEntry, SorobanTransactionData, StringM, TimeBounds,
    TimePoint, Transaction, TransactionEnvelope, TransactionExt, TransactionV1Envelope, VecM,
};

use crate::ledger::envelope::Envelope;
use crate::ledger::strkey::{
    account_address, contract_address, muxed_account, parse_account, parse_contract,
    MOCK_SINK_KEY,
};
use crate::ledger::traits::LedgerRpc;
use crate::ledger::types::{LedgerError, LedgerResult, SimulationResult, ValidationError};
use crate::mode::TransactionMode;
use crate::resilience::RetryPolicy;

/// Base fee per transaction, in stroops.
pub const BASE_FEE: u32 = 100;

/// Validity window of contract invocations.
pub const TX_TIMEOUT_SECS: u64 = 30;

/// Validity window of mock payments.
pub const MOCK_TX_TIMEOUT_SECS: u64 = 180;

/// Amount of the mock payment: one stroop (0.0000001 XLM).
pub const MOCK_PAYMENT_STROOPS: i64 = 1;

const MAX_SYMBOL_LEN: usize = 32;

/// Marketplace operations the contract exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ListAsset,
    PurchaseAsset,
    CreateRequest,
    ApproveRequest,
}

impl OperationKind {
    /// Contract function implementing the operation.
    pub fn function_name(self) -> &'static str {
        match self {
            OperationKind::ListAsset => "list_data_asset",
            OperationKind::PurchaseAsset => "purchase_data",
            OperationKind::CreateRequest => "create_request",
            OperationKind::ApproveRequest => "approve_request",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.function_name())
    }
}

/// Kind-specific operation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationPayload {
    ListAsset {
        title: String,
        description: String,
        data_type: String,
        price: i128,
        ipfs_cid: String,
        size: String,
    },
    PurchaseAsset {
        asset_id: String,
        price: i128,
    },
    CreateRequest {
        data_type: String,
        price: i128,
        duration_days: u32,
    },
    ApproveRequest {
        index: u32,
    },
}

impl OperationPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationPayload::ListAsset { .. } => OperationKind::ListAsset,
            OperationPayload::PurchaseAsset { .. } => OperationKind::PurchaseAsset,
            OperationPayload::CreateRequest { .. } => OperationKind::CreateRequest,
            OperationPayload::ApproveRequest { .. } => OperationKind::ApproveRequest,
        }
    }
}

/// One requested operation, alive for a single submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingOperation {
    /// Client-side key, increasing per builder. Never sent to the ledger.
    pub correlation_id: u64,
    /// `G…` account the operation is performed for.
    pub requester: String,
    pub payload: OperationPayload,
}

impl PendingOperation {
    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }

    /// Check every field. Returns the first problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.requester.trim().is_empty() {
            return Err(ValidationError::MissingField("requester"));
        }
        parse_account(&self.requester)?;

        match &self.payload {
            OperationPayload::ListAsset {
                title,
                description,
                data_type,
                price,
                ipfs_cid,
                size,
            } => {
                require("title", title)?;
                require("description", description)?;
                require("data_type", data_type)?;
                require("ipfs_cid", ipfs_cid)?;
                require("size", size)?;
                require_positive_price(*price)
            }
            OperationPayload::PurchaseAsset { asset_id, price } => {
                require("asset_id", asset_id)?;
                require_positive_price(*price)
            }
            OperationPayload::CreateRequest {
                data_type,
                price,
                duration_days,
            } => {
                require("data_type", data_type)?;
                validate_symbol("data_type", data_type)?;
                require_positive_price(*price)?;
                if *duration_days == 0 {
                    return Err(ValidationError::InvalidField {
                        field: "duration_days",
                        reason: "must be at least one day".into(),
                    });
                }
                Ok(())
            }
            OperationPayload::ApproveRequest { .. } => Ok(()),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_positive_price(price: i128) -> Result<(), ValidationError> {
    if price <= 0 {
        return Err(ValidationError::InvalidField {
            field: "price",
            reason: format!("must be positive, got {}", price),
        });
    }
    Ok(())
}

fn validate_symbol(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_SYMBOL_LEN {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("symbols are limited to {} characters", MAX_SYMBOL_LEN),
        });
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidField {
            field,
            reason: "symbols may only contain [A-Za-z0-9_]".into(),
        });
    }
    Ok(())
}

fn xdr_field(field: &'static str, e: stellar_xdr::curr::Error) -> ValidationError {
    ValidationError::InvalidField {
        field,
        reason: e.to_string(),
    }
}

fn sc_string(field: &'static str, value: &str) -> Result<ScVal, ValidationError> {
    let s: StringM = value.try_into().map_err(|e| xdr_field(field, e))?;
    Ok(ScVal::String(ScString(s)))
}

fn sc_symbol(field: &'static str, value: &str) -> Result<ScVal, ValidationError> {
    let s: StringM<32> = value.try_into().map_err(|e| xdr_field(field, e))?;
    Ok(ScVal::Symbol(ScSymbol(s)))
}

fn sc_i128(value: i128) -> ScVal {
    ScVal::I128(Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    })
}

fn sc_account(id: &str) -> Result<ScVal, ValidationError> {
    Ok(ScVal::Address(account_address(parse_account(id)?)))
}

/// Contract call arguments, in declaration order.
pub fn contract_args(op: &PendingOperation) -> Result<Vec<ScVal>, ValidationError> {
    let args = match &op.payload {
        OperationPayload::ListAsset {
            title,
            description,
            data_type,
            price,
            ipfs_cid,
            size,
        } => vec![
            sc_account(&op.requester)?,
            sc_string("title", title)?,
            sc_string("description", description)?,
            sc_string("data_type", data_type)?,
            sc_i128(*price),
            sc_string("ipfs_cid", ipfs_cid)?,
            sc_string("size", size)?,
        ],
        OperationPayload::PurchaseAsset { asset_id, price } => vec![
            sc_account(&op.requester)?,
            sc_string("asset_id", asset_id)?,
            sc_i128(*price),
        ],
        OperationPayload::CreateRequest {
            data_type,
            price,
            duration_days,
        } => vec![
            sc_account(&op.requester)?,
            sc_symbol("data_type", data_type)?,
            sc_i128(*price),
            ScVal::U32(*duration_days),
        ],
        OperationPayload::ApproveRequest { index } => vec![ScVal::U32(*index)],
    };
    Ok(args)
}

fn time_bounds(timeout_secs: u64) -> Preconditions {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Preconditions::Time(TimeBounds {
        min_time: TimePoint(0),
        max_time: TimePoint(now + timeout_secs),
    })
}

fn unsigned(tx: Transaction) -> LedgerResult<Envelope> {
    Envelope::from_envelope(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    }))
}

/// Invocation of `function` on `contract_id` with `args`.
pub fn invoke_operation(
    contract_id: &str,
    function: &str,
    args: Vec<ScVal>,
) -> LedgerResult<Operation> {
    let contract = parse_contract(contract_id)?;
    let function_name: StringM<32> = function.try_into()?;
    Ok(Operation {
        source_account: None,
        body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address: contract_address(contract),
                function_name: ScSymbol(function_name),
                args: args.try_into()?,
            }),
            auth: VecM::default(),
        }),
    })
}

/// Unsigned contract invocation from `source` at `sequence`, before simulation.
pub fn invocation_transaction(
    source: &str,
    sequence: i64,
    operation: Operation,
) -> LedgerResult<Envelope> {
    let tx = Transaction {
        source_account: muxed_account(parse_account(source)?),
        fee: BASE_FEE,
        seq_num: SequenceNumber(sequence),
        cond: time_bounds(TX_TIMEOUT_SECS),
        memo: Memo::None,
        operations: vec![operation].try_into()?,
        ext: TransactionExt::V0,
    };
    unsigned(tx)
}

/// Attach simulation output: resources, fee and authorization entries.
pub fn assemble(envelope: &Envelope, simulation: &SimulationResult) -> LedgerResult<Envelope> {
    let mut v1 = match envelope.decoded().clone() {
        TransactionEnvelope::Tx(v1) => v1,
        _ => return Err(LedgerError::Simulation("cannot assemble a non-v1 envelope".into())),
    };

    let data_xdr = simulation
        .transaction_data
        .as_deref()
        .ok_or_else(|| LedgerError::Simulation("simulation returned no transaction data".into()))?;
    let data = SorobanTransactionData::from_xdr_base64(data_xdr, Limits::none())?;

    let resource_fee = u32::try_from(simulation.min_resource_fee).map_err(|_| {
        LedgerError::Simulation(format!(
            "resource fee {} out of range",
            simulation.min_resource_fee
        ))
    })?;
    v1.tx.fee = v1
        .tx
        .fee
        .checked_add(resource_fee)
        .ok_or_else(|| LedgerError::Simulation("total fee overflows".into()))?;
    v1.tx.ext = TransactionExt::V1(data);

    let auth = simulation
        .auth
        .iter()
        .map(|entry| SorobanAuthorizationEntry::from_xdr_base64(entry, Limits::none()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut operations = v1.tx.operations.to_vec();
    for op in operations.iter_mut() {
        if let OperationBody::InvokeHostFunction(invoke) = &mut op.body {
            invoke.auth = auth.clone().try_into()?;
        }
    }
    v1.tx.operations = operations.try_into()?;

    Envelope::from_envelope(TransactionEnvelope::Tx(v1))
}

/// Simulate with the retry policy. Transport failures are retried; a
/// simulation error reported by the node is returned immediately.
pub async fn simulate_with_retry(
    rpc: &dyn LedgerRpc,
    envelope: &Envelope,
    policy: RetryPolicy,
) -> LedgerResult<SimulationResult> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match rpc.simulate_transaction(envelope).await {
            Ok(sim) => return Ok(sim),
            Err(e @ LedgerError::Simulation(_)) => return Err(e),
            Err(e) => match policy.delay_after(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Simulation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(e),
            },
        }
    }
}

/// Builds unsigned envelopes for marketplace operations.
pub struct TransactionBuilder {
    rpc: Arc<dyn LedgerRpc>,
    contract_id: String,
    simulation: RetryPolicy,
    next_correlation_id: AtomicU64,
}

impl TransactionBuilder {
    pub fn new(
        rpc: Arc<dyn LedgerRpc>,
        contract_id: impl Into<String>,
        simulation: RetryPolicy,
    ) -> Self {
        Self {
            rpc,
            contract_id: contract_id.into(),
            simulation,
            next_correlation_id: AtomicU64::new(1),
        }
    }

    /// Wrap a payload into a pending operation with a fresh correlation id.
    pub fn prepare(
        &self,
        requester: impl Into<String>,
        payload: OperationPayload,
    ) -> PendingOperation {
        PendingOperation {
            correlation_id: self.next_correlation_id.fetch_add(1, Ordering::Relaxed),
            requester: requester.into(),
            payload,
        }
    }

    /// Build the unsigned envelope for `op`.
    pub async fn build(
        &self,
        op: &PendingOperation,
        mode: TransactionMode,
    ) -> LedgerResult<Envelope> {
        op.validate()?;

        let envelope = match mode {
            TransactionMode::Mock => self.build_mock(op)?,
            TransactionMode::Real => self.build_real(op).await?,
        };

        tracing::debug!(
            correlation_id = op.correlation_id,
            kind = %op.kind(),
            mode = %mode,
            "Transaction built"
        );
        Ok(envelope)
    }

    fn build_mock(&self, op: &PendingOperation) -> LedgerResult<Envelope> {
        let tx = Transaction {
            source_account: muxed_account(parse_account(&op.requester)?),
            fee: BASE_FEE,
            seq_num: SequenceNumber(1),
            cond: time_bounds(MOCK_TX_TIMEOUT_SECS),
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::Payment(PaymentOp {
                    destination: muxed_account(MOCK_SINK_KEY),
                    asset: Asset::Native,
                    amount: MOCK_PAYMENT_STROOPS,
                }),
            }]
            .try_into()?,
            ext: TransactionExt::V0,
        };
        unsigned(tx)
    }

    async fn build_real(&self, op: &PendingOperation) -> LedgerResult<Envelope> {
        let account = self.rpc.get_account(&op.requester).await?;
        let operation = invoke_operation(
            &self.contract_id,
            op.kind().function_name(),
            contract_args(op)?,
        )?;
        let envelope = invocation_transaction(&op.requester, account.sequence + 1, operation)?;

        let simulation = simulate_with_retry(self.rpc.as_ref(), &envelope, self.simulation).await?;
        tracing::debug!(
            correlation_id = op.correlation_id,
            min_resource_fee = simulation.min_resource_fee,
            latest_ledger = simulation.latest_ledger,
            "Simulation complete"
        );
        assemble(&envelope, &simulation)
    }
}
