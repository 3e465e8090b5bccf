//! Soroban JSON-RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Speak JSON-RPC 2.0 to a Soroban RPC endpoint
//! - Submit transactions and query their status
//! - Look up account sequence numbers through `getLedgerEntries`
//! - Simulate contract invocations

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stellar_xdr::curr::{LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, ReadXdr, WriteXdr};
use tokio::time::timeout;

use crate::ledger::envelope::Envelope;
use crate::ledger::strkey::{account_id, parse_account};
use crate::ledger::traits::LedgerRpc;
use crate::ledger::types::{
    AccountState, LedgerError, LedgerResult, RpcTxStatus, SendReceipt, SimulationResult,
    StatusReport,
};
use crate::observability::metrics;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendBody {
    status: String,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTransactionBody {
    status: String,
    #[serde(default)]
    result_xdr: Option<String>,
    #[serde(default)]
    ledger: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntriesBody {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryBody>>,
}

#[derive(Deserialize)]
struct LedgerEntryBody {
    xdr: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    transaction_data: Option<String>,
    #[serde(default)]
    min_resource_fee: Option<String>,
    #[serde(default)]
    results: Option<Vec<SimulateResultBody>>,
    #[serde(default)]
    latest_ledger: u32,
}

#[derive(Deserialize)]
struct SimulateResultBody {
    #[serde(default)]
    auth: Vec<String>,
    #[serde(default)]
    xdr: Option<String>,
}

/// Soroban RPC client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct SorobanRpcClient {
    http: reqwest::Client,
    url: String,
    timeout_duration: Duration,
    next_id: Arc<AtomicU64>,
}

impl SorobanRpcClient {
    /// Create a new client. Does not touch the network.
    pub fn new(rpc_url: &str, timeout_secs: u64) -> LedgerResult<Self> {
        let url: url::Url = rpc_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid RPC URL '{}': {}", rpc_url, e))
        })?;
        let timeout_duration = Duration::from_secs(timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| LedgerError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!(rpc_url = %url, timeout_secs, "Soroban RPC client created");

        Ok(Self {
            http,
            url: url.to_string(),
            timeout_duration,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let fut = async {
            let response = self
                .http
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|e| LedgerError::Rpc(format!("{} request failed: {}", method, e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(LedgerError::Rpc(format!("HTTP error! status: {}", status)));
            }

            response
                .json::<RpcResponse<T>>()
                .await
                .map_err(|e| LedgerError::Rpc(format!("{} returned invalid JSON: {}", method, e)))
        };

        let body = match timeout(self.timeout_duration, fut).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(method, "RPC timeout");
                return Err(LedgerError::Timeout(self.timeout_duration.as_secs()));
            }
        };

        if let Some(err) = body.error {
            return Err(LedgerError::Rpc(format!("{} (code {})", err.message, err.code)));
        }
        body.result
            .ok_or_else(|| LedgerError::Rpc(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl LedgerRpc for SorobanRpcClient {
    async fn health(&self) -> LedgerResult<String> {
        let result = self.call::<HealthBody>("getHealth", Value::Null).await;
        metrics::record_endpoint_health("soroban_rpc", result.is_ok());
        Ok(result?.status)
    }

    async fn send_transaction(&self, envelope: &Envelope) -> LedgerResult<SendReceipt> {
        let body: SendBody = self
            .call("sendTransaction", json!({ "transaction": envelope.as_xdr() }))
            .await?;

        match body.status.as_str() {
            "PENDING" | "DUPLICATE" => body
                .hash
                .filter(|h| !h.is_empty())
                .map(|hash| SendReceipt { hash })
                .ok_or_else(|| LedgerError::Rpc("Invalid transaction response: no hash".into())),
            "TRY_AGAIN_LATER" => Err(LedgerError::Rpc("node asked to try again later".into())),
            other => Err(LedgerError::Rpc(format!(
                "transaction rejected with status {}: {}",
                other,
                body.error_result_xdr.unwrap_or_else(|| "no result".into())
            ))),
        }
    }

    async fn get_transaction_status(&self, tx_id: &str) -> LedgerResult<StatusReport> {
        let body: GetTransactionBody = self.call("getTransaction", json!({ "hash": tx_id })).await?;

        let status = match body.status.as_str() {
            "SUCCESS" => RpcTxStatus::Success,
            "FAILED" => RpcTxStatus::Failed,
            "NOT_FOUND" => RpcTxStatus::NotFound,
            other => {
                return Err(LedgerError::Rpc(format!("unknown transaction status '{}'", other)))
            }
        };

        Ok(StatusReport {
            status,
            result_detail: body.result_xdr,
            ledger: body.ledger,
        })
    }

    async fn get_account(&self, account: &str) -> LedgerResult<AccountState> {
        let key = LedgerKey::Account(LedgerKeyAccount {
            account_id: account_id(parse_account(account)?),
        });
        let key_xdr = key.to_xdr_base64(Limits::none())?;

        let body: LedgerEntriesBody = self
            .call("getLedgerEntries", json!({ "keys": [key_xdr] }))
            .await?;

        let entry = body
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::AccountNotFound(account.to_string()))?;

        match LedgerEntryData::from_xdr_base64(&entry.xdr, Limits::none())? {
            LedgerEntryData::Account(acc) => Ok(AccountState {
                account_id: account.to_string(),
                sequence: acc.seq_num.0,
                balance: acc.balance,
            }),
            _ => Err(LedgerError::Rpc(format!(
                "ledger entry for {} is not an account",
                account
            ))),
        }
    }

    async fn simulate_transaction(&self, envelope: &Envelope) -> LedgerResult<SimulationResult> {
        let body: SimulateBody = self
            .call("simulateTransaction", json!({ "transaction": envelope.as_xdr() }))
            .await?;

        if let Some(err) = body.error {
            return Err(LedgerError::Simulation(err));
        }

        let min_resource_fee = match body.min_resource_fee.as_deref() {
            Some(fee) => fee
                .parse::<i64>()
                .map_err(|e| LedgerError::Simulation(format!("invalid minResourceFee: {}", e)))?,
            None => 0,
        };
        let first = body.results.unwrap_or_default().into_iter().next();

        Ok(SimulationResult {
            transaction_data: body.transaction_data,
            min_resource_fee,
            auth: first.as_ref().map(|r| r.auth.clone()).unwrap_or_default(),
            retval: first.and_then(|r| r.xdr),
            latest_ledger: body.latest_ledger,
        })
    }
}

impl std::fmt::Debug for SorobanRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SorobanRpcClient")
            .field("rpc_url", &self.url)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
