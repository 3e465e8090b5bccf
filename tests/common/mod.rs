//! Shared utilities for integration tests: programmable HTTP backends that
//! speak just enough HTTP/1.1 for reqwest, in-process ledger fakes, and
//! envelope fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stellar_xdr::curr::{
    AccountEntry, AccountEntryExt, Asset, DecoratedSignature, ExtensionPoint, HostFunction,
    InvokeContractArgs, InvokeHostFunctionOp, LedgerEntryData, LedgerFootprint, Limits, Memo,
    Operation, OperationBody, PaymentOp, Preconditions, ScSymbol, SequenceNumber, Signature,
    SignatureHint, SorobanResources, SorobanTransactionData, String32, Thresholds, Transaction,
    TransactionEnvelope, TransactionExt, TransactionV1Envelope, VecM, WriteXdr,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bookie_ledger::config::schema::{BookieConfig, NetworkPreset};
use bookie_ledger::ledger::envelope::Envelope;
use bookie_ledger::ledger::strkey::{
    account_id, contract_address, encode_account, encode_contract, muxed_account, MOCK_SINK_KEY,
};
use bookie_ledger::ledger::traits::{ClassicLedger, LedgerRpc, Signer};
use bookie_ledger::ledger::types::{
    AccountState, LedgerError, LedgerResult, RpcTxStatus, SendReceipt, SignerError,
    SimulationResult, StatusReport,
};
use bookie_ledger::mode::BuildTag;

/// A request as seen by a programmable backend.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl HttpRequest {
    /// JSON-RPC method name, if the body is a JSON-RPC request.
    pub fn rpc_method(&self) -> Option<String> {
        serde_json::from_str::<Value>(&self.body)
            .ok()?
            .get("method")?
            .as_str()
            .map(str::to_string)
    }
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<HttpRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(HttpRequest { method, path, body })
}

/// Start a programmable backend on an ephemeral port and return its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            504 => "504 Gateway Timeout",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// JSON-RPC success envelope around `result`.
pub fn rpc_result(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

/// Base64 `LedgerEntryData` for an account at `sequence`.
pub fn account_entry_xdr(key: [u8; 32], sequence: i64) -> String {
    LedgerEntryData::Account(AccountEntry {
        account_id: account_id(key),
        balance: 100_000_000,
        seq_num: SequenceNumber(sequence),
        num_sub_entries: 0,
        inflation_dest: None,
        flags: 0,
        home_domain: String32(Default::default()),
        thresholds: Thresholds([1, 0, 0, 0]),
        signers: VecM::default(),
        ext: AccountEntryExt::V0,
    })
    .to_xdr_base64(Limits::none())
    .unwrap()
}

/// Base64 `SorobanTransactionData` as returned by simulation.
pub fn transaction_data_xdr() -> String {
    SorobanTransactionData {
        ext: ExtensionPoint::V0,
        resources: SorobanResources {
            footprint: LedgerFootprint {
                read_only: VecM::default(),
                read_write: VecM::default(),
            },
            instructions: 2_000_000,
            read_bytes: 1_000,
            write_bytes: 500,
        },
        resource_fee: 12_345,
    }
    .to_xdr_base64(Limits::none())
    .unwrap()
}

/// Deterministic secret seed for tests.
pub fn test_secret() -> String {
    stellar_strkey::ed25519::PrivateKey([11u8; 32]).to_string()
}

pub fn valid_contract_id() -> String {
    encode_contract(&[21u8; 32])
}

/// Config that resolves to real mode against the given endpoints.
pub fn real_config(rpc_url: &str, horizon_url: &str) -> BookieConfig {
    let mut config = BookieConfig::default();
    config.network.preset = NetworkPreset::Testnet;
    config.network.rpc_url = rpc_url.to_string();
    config.network.horizon_url = horizon_url.to_string();
    config.network.rpc_timeout_secs = 5;
    config.contract.id = valid_contract_id();
    config.contract.force_real_transactions = true;
    config.contract.build = BuildTag::Production;
    config.polling.interval_ms = 10;
    config.polling.max_delay_ms = 10;
    config.simulation.base_delay_ms = 10;
    config
}

fn signed(tx: Transaction) -> Envelope {
    let signatures: VecM<DecoratedSignature, 20> = vec![DecoratedSignature {
        hint: SignatureHint([1, 2, 3, 4]),
        signature: Signature(vec![7u8; 64].try_into().unwrap()),
    }]
    .try_into()
    .unwrap();
    Envelope::from_envelope(TransactionEnvelope::Tx(TransactionV1Envelope { tx, signatures }))
        .unwrap()
}

fn transaction(body: OperationBody) -> Transaction {
    Transaction {
        source_account: muxed_account([3u8; 32]),
        fee: 100,
        seq_num: SequenceNumber(5),
        cond: Preconditions::None,
        memo: Memo::None,
        operations: vec![Operation {
            source_account: None,
            body,
        }]
        .try_into()
        .unwrap(),
        ext: TransactionExt::V0,
    }
}

/// Signed classic payment (eligible for the Horizon fallback).
pub fn signed_payment() -> Envelope {
    signed(transaction(OperationBody::Payment(PaymentOp {
        destination: muxed_account(MOCK_SINK_KEY),
        asset: Asset::Native,
        amount: 1,
    })))
}

/// Signed contract invocation (never eligible for the fallback).
pub fn signed_invocation() -> Envelope {
    signed(transaction(OperationBody::InvokeHostFunction(
        InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(InvokeContractArgs {
                contract_address: contract_address([21u8; 32]),
                function_name: ScSymbol("purchase_data".try_into().unwrap()),
                args: VecM::default(),
            }),
            auth: VecM::default(),
        },
    )))
}

pub fn sink_account() -> String {
    encode_account(&MOCK_SINK_KEY)
}

/// In-process ledger RPC with scripted answers and per-method call counters.
#[derive(Default)]
pub struct FakeRpc {
    pub send_results: Mutex<VecDeque<LedgerResult<SendReceipt>>>,
    pub statuses: Mutex<VecDeque<RpcTxStatus>>,
    pub send_calls: AtomicU32,
    pub status_calls: AtomicU32,
    pub account_calls: AtomicU32,
    pub simulate_calls: AtomicU32,
}

impl FakeRpc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_send(message: &str) -> Arc<Self> {
        let rpc = Self::default();
        rpc.send_results
            .lock()
            .unwrap()
            .push_back(Err(LedgerError::Rpc(message.to_string())));
        Arc::new(rpc)
    }

    pub fn with_statuses(statuses: Vec<RpcTxStatus>) -> Arc<Self> {
        let rpc = Self::default();
        *rpc.statuses.lock().unwrap() = statuses.into();
        Arc::new(rpc)
    }

    pub fn total_calls(&self) -> u32 {
        self.send_calls.load(Ordering::SeqCst)
            + self.status_calls.load(Ordering::SeqCst)
            + self.account_calls.load(Ordering::SeqCst)
            + self.simulate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRpc for FakeRpc {
    async fn health(&self) -> LedgerResult<String> {
        Ok("healthy".into())
    }

    async fn send_transaction(&self, _: &Envelope) -> LedgerResult<SendReceipt> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SendReceipt { hash: "a1b2c3".into() }))
    }

    async fn get_transaction_status(&self, _: &str) -> LedgerResult<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RpcTxStatus::NotFound);
        Ok(StatusReport {
            status,
            result_detail: None,
            ledger: (status != RpcTxStatus::NotFound).then_some(1234),
        })
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<AccountState> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccountState {
            account_id: account_id.to_string(),
            sequence: 100,
            balance: 100_000_000,
        })
    }

    async fn simulate_transaction(&self, _: &Envelope) -> LedgerResult<SimulationResult> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(SimulationResult {
            transaction_data: Some(transaction_data_xdr()),
            min_resource_fee: 12_345,
            auth: vec![],
            retval: None,
            latest_ledger: 1000,
        })
    }
}

/// What the fake Horizon does when asked to submit.
#[derive(Clone)]
pub enum ClassicBehavior {
    Accept(String),
    Reject(String),
    Unreachable(String),
}

/// In-process Horizon fake.
pub struct FakeClassic {
    pub behavior: ClassicBehavior,
    pub calls: AtomicU32,
}

impl FakeClassic {
    pub fn new(behavior: ClassicBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassicLedger for FakeClassic {
    async fn submit_classic(&self, _: &Envelope) -> LedgerResult<SendReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ClassicBehavior::Accept(hash) => Ok(SendReceipt { hash: hash.clone() }),
            ClassicBehavior::Reject(detail) => Err(LedgerError::TransactionFailed {
                tx_id: String::new(),
                detail: detail.clone(),
            }),
            ClassicBehavior::Unreachable(message) => Err(LedgerError::Rpc(message.clone())),
        }
    }

    async fn is_reachable(&self) -> bool {
        !matches!(self.behavior, ClassicBehavior::Unreachable(_))
    }
}

/// Wallet that refuses every signing request with a fixed error.
pub struct RefusingSigner {
    pub error: SignerError,
    pub calls: AtomicU32,
}

impl RefusingSigner {
    pub fn new(error: SignerError) -> Self {
        Self {
            error,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for RefusingSigner {
    fn account_id(&self) -> String {
        encode_account(&[9u8; 32])
    }

    async fn sign(&self, _: &Envelope, _: &str) -> Result<Envelope, SignerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}
