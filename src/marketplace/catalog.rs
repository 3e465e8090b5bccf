//! Data catalogue: sample assets and open data-access requests.

use serde::Serialize;
use std::sync::Arc;
use stellar_xdr::curr::{Limits, ReadXdr, ScAddress, ScMapEntry, ScVal};

use crate::ledger::builder::{invocation_transaction, invoke_operation, simulate_with_retry};
use crate::ledger::strkey::{encode_account, encode_contract, MOCK_SINK_KEY};
use crate::ledger::traits::LedgerRpc;
use crate::ledger::types::LedgerResult;
use crate::mode::TransactionMode;
use crate::resilience::RetryPolicy;

/// Contract function returning every data-access request.
pub const GET_REQUESTS_FN: &str = "get_requests";

/// Seller of the sample assets.
pub const SAMPLE_SELLER: &str = "GDDBM35WJ7LRB4U3FJYFNH5JDVTPGLSCR7HSD6XV5GTSTQPOIFPDGJCT";

/// A data asset offered on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataAsset {
    pub id: String,
    pub title: String,
    pub description: String,
    pub data_type: String,
    pub price: i128,
    pub seller: String,
    pub ipfs_cid: String,
    pub size: String,
    pub is_active: bool,
}

/// Fixed assets served in mock mode.
pub fn sample_assets() -> Vec<DataAsset> {
    vec![
        DataAsset {
            id: "mock-1".into(),
            title: "Sample Health Data".into(),
            description: "Anonymized health metrics for research".into(),
            data_type: "health".into(),
            price: 100,
            seller: SAMPLE_SELLER.into(),
            ipfs_cid: "QmX123mockCid".into(),
            size: "2.5MB".into(),
            is_active: true,
        },
        DataAsset {
            id: "mock-2".into(),
            title: "Fitness Tracking Data".into(),
            description: "Daily activity and exercise data".into(),
            data_type: "fitness".into(),
            price: 50,
            seller: SAMPLE_SELLER.into(),
            ipfs_cid: "QmY456mockCid".into(),
            size: "1.2MB".into(),
            is_active: true,
        },
    ]
}

pub fn find_sample_asset(id: &str) -> Option<DataAsset> {
    sample_assets().into_iter().find(|a| a.id == id)
}

/// A buyer's request for access to a kind of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataRequest {
    /// Position in the contract's request list; the argument of `approve_request`.
    pub index: u32,
    pub requester: String,
    pub data_type: String,
    pub price: i128,
    pub duration_days: u32,
    pub approved: bool,
}

/// Requests matching the sample assets, one per asset.
fn sample_requests() -> Vec<DataRequest> {
    sample_assets()
        .into_iter()
        .enumerate()
        .map(|(i, asset)| DataRequest {
            index: i as u32,
            requester: asset.seller,
            data_type: asset.data_type,
            price: asset.price,
            duration_days: 30,
            approved: false,
        })
        .collect()
}

fn address_string(addr: &ScAddress) -> String {
    match addr {
        ScAddress::Account(id) => {
            let stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) = &id.0;
            encode_account(&key.0)
        }
        ScAddress::Contract(hash) => encode_contract(&hash.0),
    }
}

fn field<'a>(entries: &'a [ScMapEntry], name: &str) -> Option<&'a ScVal> {
    entries.iter().find_map(|e| match &e.key {
        ScVal::Symbol(s) if s.0.to_utf8_string_lossy() == name => Some(&e.val),
        _ => None,
    })
}

fn decode_request(index: u32, val: &ScVal) -> Result<DataRequest, String> {
    let entries = match val {
        ScVal::Map(Some(map)) => map.0.as_slice(),
        other => return Err(format!("request {} is not a map: {:?}", index, other)),
    };

    let requester = match field(entries, "requester") {
        Some(ScVal::Address(addr)) => address_string(addr),
        _ => return Err(format!("request {} has no requester", index)),
    };
    let data_type = match field(entries, "data_type") {
        Some(ScVal::Symbol(s)) => s.0.to_utf8_string_lossy(),
        Some(ScVal::String(s)) => s.0.to_utf8_string_lossy(),
        _ => return Err(format!("request {} has no data_type", index)),
    };
    let price = match field(entries, "price") {
        Some(ScVal::I128(parts)) => ((parts.hi as i128) << 64) | parts.lo as i128,
        _ => return Err(format!("request {} has no price", index)),
    };
    let duration_days = match field(entries, "duration_days") {
        Some(ScVal::U32(d)) => *d,
        _ => return Err(format!("request {} has no duration_days", index)),
    };
    let approved = matches!(field(entries, "approved"), Some(ScVal::Bool(true)));

    Ok(DataRequest {
        index,
        requester,
        data_type,
        price,
        duration_days,
        approved,
    })
}

/// Decode the `get_requests` return value (base64 `ScVal`).
pub fn decode_requests(retval: &str) -> Result<Vec<DataRequest>, String> {
    let val = ScVal::from_xdr_base64(retval, Limits::none()).map_err(|e| e.to_string())?;
    let items = match val {
        ScVal::Vec(Some(items)) => items.0.into_vec(),
        ScVal::Vec(None) | ScVal::Void => return Ok(Vec::new()),
        other => return Err(format!("expected a vector of requests, got {:?}", other)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_request(i as u32, item))
        .collect()
}

/// Read-only view of the marketplace contract.
#[derive(Clone)]
pub struct Catalog {
    mode: TransactionMode,
    rpc: Arc<dyn LedgerRpc>,
    contract_id: String,
    simulation: RetryPolicy,
}

impl Catalog {
    pub fn new(
        mode: TransactionMode,
        rpc: Arc<dyn LedgerRpc>,
        contract_id: impl Into<String>,
        simulation: RetryPolicy,
    ) -> Self {
        Self {
            mode,
            rpc,
            contract_id: contract_id.into(),
            simulation,
        }
    }

    /// Every data-access request recorded by the contract.
    ///
    /// Real mode simulates `get_requests`; nothing is submitted. A return
    /// value that cannot be decoded is logged and gives an empty list.
    pub async fn list_data_requests(&self) -> LedgerResult<Vec<DataRequest>> {
        if self.mode.is_mock() {
            tracing::debug!("Mock mode: returning sample data requests");
            return Ok(sample_requests());
        }

        let operation = invoke_operation(&self.contract_id, GET_REQUESTS_FN, Vec::new())?;
        // Simulation does not check the source account, so the sink will do.
        let envelope = invocation_transaction(&encode_account(&MOCK_SINK_KEY), 1, operation)?;
        let simulation = simulate_with_retry(self.rpc.as_ref(), &envelope, self.simulation).await?;

        let Some(retval) = simulation.retval else {
            tracing::warn!("get_requests simulation returned no value");
            return Ok(Vec::new());
        };
        match decode_requests(&retval) {
            Ok(requests) => Ok(requests),
            Err(e) => {
                tracing::error!(error = %e, "Failed to decode data requests");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::strkey::account_address;
    use stellar_xdr::curr::{Int128Parts, ScMap, ScSymbol, ScVec, WriteXdr};

    fn entry(key: &str, val: ScVal) -> ScMapEntry {
        ScMapEntry {
            key: ScVal::Symbol(ScSymbol(key.try_into().unwrap())),
            val,
        }
    }

    fn request_val(price: i128, approved: bool) -> ScVal {
        ScVal::Map(Some(ScMap(
            vec![
                entry("approved", ScVal::Bool(approved)),
                entry("data_type", ScVal::Symbol(ScSymbol("sleep".try_into().unwrap()))),
                entry("duration_days", ScVal::U32(14)),
                entry(
                    "price",
                    ScVal::I128(Int128Parts {
                        hi: (price >> 64) as i64,
                        lo: price as u64,
                    }),
                ),
                entry("requester", ScVal::Address(account_address([6u8; 32]))),
            ]
            .try_into()
            .unwrap(),
        )))
    }

    #[test]
    fn test_sample_assets() {
        let assets = sample_assets();
        assert_eq!(assets.len(), 2);
        assert_eq!(find_sample_asset("mock-2").unwrap().price, 50);
        assert!(find_sample_asset("mock-3").is_none());
        assert!(crate::ledger::strkey::is_valid_account_id(SAMPLE_SELLER));
    }

    #[test]
    fn test_decode_requests() {
        let val = ScVal::Vec(Some(ScVec(
            vec![request_val(250, false), request_val(1 << 70, true)]
                .try_into()
                .unwrap(),
        )));
        let xdr = val.to_xdr_base64(Limits::none()).unwrap();

        let requests = decode_requests(&xdr).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].index, 0);
        assert_eq!(requests[0].price, 250);
        assert_eq!(requests[0].data_type, "sleep");
        assert_eq!(requests[0].requester, encode_account(&[6u8; 32]));
        assert!(!requests[0].approved);
        assert_eq!(requests[1].price, 1 << 70);
        assert!(requests[1].approved);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let xdr = ScVal::U32(5).to_xdr_base64(Limits::none()).unwrap();
        assert!(decode_requests(&xdr).is_err());
        assert!(decode_requests("garbage").is_err());

        let empty = ScVal::Vec(None).to_xdr_base64(Limits::none()).unwrap();
        assert!(decode_requests(&empty).unwrap().is_empty());
    }
}
