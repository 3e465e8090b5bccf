//! Marketplace operations on top of the ledger core.
//!
//! - `workflow.rs`: build → sign → submit → poll → cache for one operation
//! - `catalog.rs`: sample assets and the contract's data-access requests
//! - `cache.rs`: local record of listings and purchases per account

pub mod cache;
pub mod catalog;
pub mod workflow;

pub use cache::{AssetCache, AssetRecord, UserRecords};
pub use catalog::{Catalog, DataAsset, DataRequest};
pub use workflow::{TxOutcome, Workflow};
