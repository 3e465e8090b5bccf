//! Stellar strkey parsing and conversions into XDR address types.

use stellar_strkey::{ed25519, Contract};
use stellar_xdr::curr::{AccountId, Hash, MuxedAccount, PublicKey, ScAddress, Uint256};

use crate::ledger::types::ValidationError;

/// Contract ids that mean "not configured yet".
pub const PLACEHOLDER_CONTRACT_IDS: &[&str] = &["YOUR_CONTRACT_ID", "PLACEHOLDER_CONTRACT_ID"];

/// All-zero ed25519 key. Mock payments are addressed here.
pub const MOCK_SINK_KEY: [u8; 32] = [0u8; 32];

pub fn is_placeholder_contract_id(id: &str) -> bool {
    PLACEHOLDER_CONTRACT_IDS.contains(&id)
}

/// `C…` contract strkey with a valid checksum.
pub fn is_valid_contract_id(id: &str) -> bool {
    Contract::from_string(id).is_ok()
}

/// `G…` account strkey with a valid checksum.
pub fn is_valid_account_id(id: &str) -> bool {
    ed25519::PublicKey::from_string(id).is_ok()
}

pub fn parse_account(id: &str) -> Result<[u8; 32], ValidationError> {
    ed25519::PublicKey::from_string(id)
        .map(|pk| pk.0)
        .map_err(|_| ValidationError::InvalidAccount(id.to_string()))
}

pub fn parse_contract(id: &str) -> Result<[u8; 32], ValidationError> {
    Contract::from_string(id)
        .map(|c| c.0)
        .map_err(|_| ValidationError::InvalidContract(id.to_string()))
}

pub fn encode_account(key: &[u8; 32]) -> String {
    ed25519::PublicKey(*key).to_string()
}

pub fn encode_contract(key: &[u8; 32]) -> String {
    Contract(*key).to_string()
}

pub fn muxed_account(key: [u8; 32]) -> MuxedAccount {
    MuxedAccount::Ed25519(Uint256(key))
}

pub fn account_id(key: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key)))
}

pub fn account_address(key: [u8; 32]) -> ScAddress {
    ScAddress::Account(account_id(key))
}

pub fn contract_address(key: [u8; 32]) -> ScAddress {
    ScAddress::Contract(Hash(key))
}
