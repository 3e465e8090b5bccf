//! Application context.
//!
//! Everything a ledger operation needs, built once from configuration and
//! passed down explicitly: the resolved mode, the RPC and Horizon clients,
//! the asset cache, and the pipeline stages built on top of them.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::schema::BookieConfig;
use crate::ledger::builder::TransactionBuilder;
use crate::ledger::horizon::HorizonClient;
use crate::ledger::rpc::SorobanRpcClient;
use crate::ledger::traits::{ClassicLedger, LedgerRpc};
use crate::ledger::types::{AccountState, LedgerResult};
use crate::marketplace::cache::AssetCache;
use crate::marketplace::catalog::Catalog;
use crate::marketplace::workflow::Workflow;
use crate::mode::{ModeDecision, TransactionMode};
use crate::resilience::RetryPolicy;
use crate::submission::{StatusPoller, Submitter};

/// Shared state for one process.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<BookieConfig>,
    decision: ModeDecision,
    rpc: Arc<dyn LedgerRpc>,
    classic: Arc<dyn ClassicLedger>,
    cache: AssetCache,
    builder: Arc<TransactionBuilder>,
}

impl AppContext {
    /// Build the context with HTTP clients for the configured endpoints.
    /// The cache is loaded from its configured path, if any.
    pub fn from_config(config: BookieConfig) -> LedgerResult<Self> {
        let timeout = config.network.rpc_timeout_secs;
        let rpc = Arc::new(SorobanRpcClient::new(config.network.rpc_url(), timeout)?);
        let classic = Arc::new(HorizonClient::new(config.network.horizon_url(), timeout)?);

        let cache = match &config.cache.path {
            Some(path) => AssetCache::load_from_file(PathBuf::from(path)).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "Cache file unreadable, starting empty");
                AssetCache::new(Some(PathBuf::from(path)))
            }),
            None => AssetCache::new(None),
        };

        Ok(Self::with_clients(config, rpc, classic, cache))
    }

    /// Build the context around existing clients.
    pub fn with_clients(
        config: BookieConfig,
        rpc: Arc<dyn LedgerRpc>,
        classic: Arc<dyn ClassicLedger>,
        cache: AssetCache,
    ) -> Self {
        let decision = ModeDecision::resolve(
            config.contract.force_real_transactions,
            &config.contract.id,
            config.contract.build,
        );

        if decision.mode.is_mock() {
            tracing::warn!(
                reasons = ?decision.mock_reasons(),
                "Mock mode: transactions are simulated locally"
            );
        } else {
            tracing::info!(contract_id = %config.contract.id, "Real transaction mode");
        }

        let builder = Arc::new(TransactionBuilder::new(
            rpc.clone(),
            config.contract.id.clone(),
            RetryPolicy::from_simulation(&config.simulation),
        ));

        Self {
            config: Arc::new(config),
            decision,
            rpc,
            classic,
            cache,
            builder,
        }
    }

    pub fn config(&self) -> &BookieConfig {
        &self.config
    }

    pub fn mode_decision(&self) -> &ModeDecision {
        &self.decision
    }

    pub fn mode(&self) -> TransactionMode {
        self.decision.mode
    }

    pub fn rpc(&self) -> Arc<dyn LedgerRpc> {
        self.rpc.clone()
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    pub fn builder(&self) -> Arc<TransactionBuilder> {
        self.builder.clone()
    }

    pub fn submitter(&self) -> Submitter {
        Submitter::new(self.mode(), self.rpc.clone(), self.classic.clone())
    }

    pub fn poller(&self) -> StatusPoller {
        StatusPoller::new(self.rpc.clone(), RetryPolicy::from_polling(&self.config.polling))
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(
            self.mode(),
            self.rpc.clone(),
            self.config.contract.id.clone(),
            RetryPolicy::from_simulation(&self.config.simulation),
        )
    }

    pub fn workflow(&self) -> Workflow {
        Workflow::new(
            self.mode(),
            self.config.network.passphrase(),
            self.builder.clone(),
            self.submitter(),
            self.poller(),
            self.cache.clone(),
        )
    }

    /// Report mode inputs and endpoint reachability.
    pub async fn diagnose(&self, account: Option<&str>) -> Diagnostics {
        let rpc_health = match self.rpc.health().await {
            Ok(status) => status,
            Err(e) => format!("unreachable: {}", e),
        };
        let horizon_reachable = self.classic.is_reachable().await;

        let account = match account {
            Some(id) => Some(match self.rpc.get_account(id).await {
                Ok(account) => AccountCheck::Found { account },
                Err(e) => AccountCheck::Error {
                    message: e.to_string(),
                },
            }),
            None => None,
        };

        Diagnostics {
            mode: self.decision.clone(),
            mock_reasons: self.decision.mock_reasons(),
            rpc_url: self.config.network.rpc_url().to_string(),
            horizon_url: self.config.network.horizon_url().to_string(),
            network_passphrase: self.config.network.passphrase().to_string(),
            rpc_health,
            horizon_reachable,
            account,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("mode", &self.decision.mode)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Result of an optional account lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AccountCheck {
    Found { account: AccountState },
    Error { message: String },
}

/// Snapshot produced by [`AppContext::diagnose`].
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub mode: ModeDecision,
    pub mock_reasons: Vec<&'static str>,
    pub rpc_url: String,
    pub horizon_url: String,
    pub network_passphrase: String,
    pub rpc_health: String,
    pub horizon_reachable: bool,
    pub account: Option<AccountCheck>,
}
