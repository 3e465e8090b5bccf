//! Horizon client for classic transaction submission.
//!
//! Horizon cannot apply Soroban operations, so it is only used as a
//! one-shot fallback for envelopes without contract invocations.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::ledger::envelope::Envelope;
use crate::ledger::traits::ClassicLedger;
use crate::ledger::types::{LedgerError, LedgerResult, SendReceipt};
use crate::observability::metrics;

#[derive(Deserialize)]
struct SubmitBody {
    hash: String,
}

#[derive(Deserialize)]
struct ProblemBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extras: Option<ProblemExtras>,
}

#[derive(Deserialize)]
struct ProblemExtras {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    result_codes: Option<ResultCodes>,
}

#[derive(Deserialize)]
struct ResultCodes {
    #[serde(default)]
    transaction: Option<String>,
    #[serde(default)]
    operations: Vec<String>,
}

impl ProblemBody {
    fn describe(&self) -> String {
        let codes = self.extras.as_ref().and_then(|e| e.result_codes.as_ref());
        match codes {
            Some(codes) if codes.operations.is_empty() => format!(
                "{} ({})",
                self.title,
                codes.transaction.as_deref().unwrap_or("unknown")
            ),
            Some(codes) => format!(
                "{} ({}: {})",
                self.title,
                codes.transaction.as_deref().unwrap_or("unknown"),
                codes.operations.join(", ")
            ),
            None => self.title.clone(),
        }
    }
}

/// Longest slice of a raw error body carried into the error message.
const MAX_BODY_IN_ERROR: usize = 200;

/// Rejection detail for a 4xx answer. Falls back to the status line and raw
/// body when the body is not a problem document.
fn rejection_detail(status: StatusCode, body: &str) -> String {
    let described = serde_json::from_str::<ProblemBody>(body)
        .map(|problem| problem.describe())
        .unwrap_or_default();
    if !described.trim().is_empty() {
        return described.trim().to_string();
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        let snippet: String = body.chars().take(MAX_BODY_IN_ERROR).collect();
        format!("HTTP {}: {}", status, snippet)
    }
}

/// Horizon REST client.
#[derive(Clone)]
pub struct HorizonClient {
    http: reqwest::Client,
    base_url: String,
    timeout_duration: Duration,
}

impl HorizonClient {
    pub fn new(horizon_url: &str, timeout_secs: u64) -> LedgerResult<Self> {
        let url: url::Url = horizon_url.parse().map_err(|e| {
            LedgerError::Rpc(format!("Invalid Horizon URL '{}': {}", horizon_url, e))
        })?;
        let timeout_duration = Duration::from_secs(timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(|e| LedgerError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: url.as_str().trim_end_matches('/').to_string(),
            timeout_duration,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ClassicLedger for HorizonClient {
    async fn submit_classic(&self, envelope: &Envelope) -> LedgerResult<SendReceipt> {
        let endpoint = format!("{}/transactions", self.base_url);

        let fut = async {
            let response = self
                .http
                .post(&endpoint)
                .form(&[("tx", envelope.as_xdr())])
                .send()
                .await
                .map_err(|e| LedgerError::Rpc(format!("Horizon request failed: {}", e)))?;

            let status = response.status();
            if status.is_success() {
                let body: SubmitBody = response.json().await.map_err(|e| {
                    LedgerError::Rpc(format!("Horizon returned invalid JSON: {}", e))
                })?;
                return Ok(SendReceipt { hash: body.hash });
            }

            // Rate limiting says nothing about the transaction.
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LedgerError::Rpc(format!("Horizon rate limited: {}", status)));
            }

            // Any other 4xx: Horizon looked at the transaction and refused it.
            if status.is_client_error() {
                let body = response.text().await.unwrap_or_default();
                let tx_id = serde_json::from_str::<ProblemBody>(&body)
                    .ok()
                    .and_then(|p| p.extras.and_then(|e| e.hash))
                    .unwrap_or_default();
                return Err(LedgerError::TransactionFailed {
                    tx_id,
                    detail: rejection_detail(status, &body),
                });
            }

            Err(LedgerError::Rpc(format!("Horizon HTTP error! status: {}", status)))
        };

        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(endpoint = %endpoint, "Horizon timeout");
                Err(LedgerError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }

    async fn is_reachable(&self) -> bool {
        let request = self.http.get(&self.base_url).send();
        let reachable = match timeout(self.timeout_duration, request).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        };
        metrics::record_endpoint_health("horizon", reachable);
        reachable
    }
}

impl std::fmt::Debug for HorizonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizonClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = HorizonClient::new("https://horizon-testnet.stellar.org/", 5).unwrap();
        assert_eq!(client.base_url(), "https://horizon-testnet.stellar.org");
    }

    #[test]
    fn test_problem_description() {
        let problem: ProblemBody = serde_json::from_str(
            r#"{
                "title": "Transaction Failed",
                "extras": {
                    "hash": "abc",
                    "result_codes": { "transaction": "tx_failed", "operations": ["op_underfunded"] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(
            problem.describe(),
            "Transaction Failed (tx_failed: op_underfunded)"
        );
    }

    #[test]
    fn test_rejection_detail_without_problem_document() {
        assert_eq!(
            rejection_detail(StatusCode::BAD_REQUEST, ""),
            "HTTP 400 Bad Request"
        );
        assert_eq!(
            rejection_detail(StatusCode::BAD_REQUEST, "  bad tx  "),
            "HTTP 400 Bad Request: bad tx"
        );
        // JSON without a title or result codes describes nothing.
        assert_eq!(
            rejection_detail(StatusCode::NOT_FOUND, "{}"),
            "HTTP 404 Not Found: {}"
        );
    }

    #[test]
    fn test_rejection_detail_prefers_problem_document() {
        let body = r#"{"title":"Transaction Failed","extras":{"result_codes":{"transaction":"tx_bad_seq"}}}"#;
        assert_eq!(
            rejection_detail(StatusCode::BAD_REQUEST, body),
            "Transaction Failed (tx_bad_seq)"
        );
    }

    #[tokio::test]
    async fn test_unreachable_horizon() {
        let client = HorizonClient::new("http://127.0.0.1:9", 1).unwrap();
        assert!(!client.is_reachable().await);
    }
}
