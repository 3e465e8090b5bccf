//! Local cache of listings and purchases, keyed by account.
//!
//! Convenience only: the ledger is authoritative. Records made in mock mode
//! keep their `dev_` transaction id so they can be told apart.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ledger::types::is_mock_transaction_id;
use crate::observability::metrics;

/// A listed or purchased data asset as seen by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub data_type: String,
    pub price: i128,
    #[serde(default)]
    pub size: String,
    /// Transaction that created the record.
    pub tx_id: String,
    /// Seconds since the Unix epoch.
    pub recorded_at: u64,
}

impl AssetRecord {
    pub fn is_mock(&self) -> bool {
        is_mock_transaction_id(&self.tx_id)
    }
}

/// Everything cached for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecords {
    #[serde(default)]
    pub listings: Vec<AssetRecord>,
    #[serde(default)]
    pub purchases: Vec<AssetRecord>,
}

impl UserRecords {
    fn len(&self) -> usize {
        self.listings.len() + self.purchases.len()
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Thread-safe cache shared through the application context.
#[derive(Clone, Default)]
pub struct AssetCache {
    inner: Arc<DashMap<String, UserRecords>>,
    persistence_path: Option<PathBuf>,
}

impl AssetCache {
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from `path` if it exists; an absent file gives an empty cache
    /// that will persist there.
    pub fn load_from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let cache = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, UserRecords> = serde_json::from_reader(reader)?;
            for (account, records) in map {
                cache.inner.insert(account, records);
            }
            metrics::record_cache_size(cache.count());
            tracing::info!(
                accounts = cache.inner.len(),
                path = %path.display(),
                "Loaded asset cache"
            );
        }
        Ok(cache)
    }

    /// Write the cache to its persistence path, if it has one.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let map: HashMap<String, UserRecords> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();

            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &map)?;
            tracing::debug!(accounts = map.len(), path = %path.display(), "Saved asset cache");
        }
        Ok(())
    }

    pub fn record_listing(&self, account: &str, record: AssetRecord) {
        self.inner
            .entry(account.to_string())
            .or_default()
            .listings
            .push(record);
        metrics::record_cache_size(self.count());
    }

    pub fn record_purchase(&self, account: &str, record: AssetRecord) {
        self.inner
            .entry(account.to_string())
            .or_default()
            .purchases
            .push(record);
        metrics::record_cache_size(self.count());
    }

    pub fn records(&self, account: &str) -> UserRecords {
        self.inner
            .get(account)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn listings(&self, account: &str) -> Vec<AssetRecord> {
        self.records(account).listings
    }

    pub fn purchases(&self, account: &str) -> Vec<AssetRecord> {
        self.records(account).purchases
    }

    /// Total records across all accounts.
    pub fn count(&self) -> usize {
        self.inner.iter().map(|r| r.value().len()).sum()
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("accounts", &self.inner.len())
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}
