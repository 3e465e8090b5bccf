//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ledger client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::mode::BuildTag;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BookieConfig {
    /// Ledger network endpoints.
    pub network: NetworkConfig,

    /// Target contract and mode inputs.
    pub contract: ContractConfig,

    /// Transaction status polling.
    pub polling: PollingConfig,

    /// Simulation retries for real-mode contract calls.
    pub simulation: SimulationConfig,

    /// Local listing/purchase cache.
    pub cache: CacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Known Stellar networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkPreset {
    Testnet,
    Futurenet,
    Local,
}

impl NetworkPreset {
    pub fn rpc_url(self) -> &'static str {
        match self {
            NetworkPreset::Testnet => "https://soroban-testnet.stellar.org",
            NetworkPreset::Futurenet => "https://rpc-futurenet.stellar.org",
            NetworkPreset::Local => "http://localhost:8000/soroban/rpc",
        }
    }

    pub fn horizon_url(self) -> &'static str {
        match self {
            NetworkPreset::Testnet => "https://horizon-testnet.stellar.org",
            NetworkPreset::Futurenet => "https://horizon-futurenet.stellar.org",
            NetworkPreset::Local => "http://localhost:8000",
        }
    }

    pub fn passphrase(self) -> &'static str {
        match self {
            NetworkPreset::Testnet => "Test SDF Network ; September 2015",
            NetworkPreset::Futurenet => "Test SDF Future Network ; October 2022",
            NetworkPreset::Local => "Standalone Network ; February 2017",
        }
    }
}

/// Network endpoint configuration.
///
/// Empty URL or passphrase fields fall back to the preset.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub preset: NetworkPreset,

    /// Soroban JSON-RPC endpoint.
    pub rpc_url: String,

    /// Horizon endpoint used as the classic submission fallback.
    pub horizon_url: String,

    /// Network passphrase used for signing.
    pub passphrase: String,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            preset: NetworkPreset::Testnet,
            rpc_url: String::new(),
            horizon_url: String::new(),
            passphrase: String::new(),
            rpc_timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    pub fn rpc_url(&self) -> &str {
        non_empty_or(&self.rpc_url, self.preset.rpc_url())
    }

    pub fn horizon_url(&self) -> &str {
        non_empty_or(&self.horizon_url, self.preset.horizon_url())
    }

    pub fn passphrase(&self) -> &str {
        non_empty_or(&self.passphrase, self.preset.passphrase())
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Target contract and the inputs of the mode decision.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract strkey (`C…`). The placeholder keeps the client in mock mode.
    pub id: String,

    /// Opt-in for real submissions.
    pub force_real_transactions: bool,

    /// Build environment tag.
    pub build: BuildTag,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            id: "YOUR_CONTRACT_ID".to_string(),
            force_real_transactions: false,
            build: BuildTag::Development,
        }
    }
}

/// Delay strategy between status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

/// Transaction status polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Status checks before giving up.
    pub max_attempts: u32,

    /// Delay between checks in milliseconds.
    pub interval_ms: u64,

    pub backoff: BackoffKind,

    /// Upper bound for exponential delays in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval_ms: 2000,
            backoff: BackoffKind::Fixed,
            max_delay_ms: 10_000,
        }
    }
}

/// Simulation retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_attempts: u32,

    /// Delay after attempt `n` is `base_delay_ms * n`.
    pub base_delay_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
        }
    }
}

/// Local cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the cache is loaded from and saved to. In-memory only when unset.
    pub path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
