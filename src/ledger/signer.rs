//! Local key signing.
//!
//! # Security
//! - Secret seeds are loaded ONLY from environment variables
//! - Seeds are never logged or serialized

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    DecoratedSignature, Hash, Limits, Signature, SignatureHint, Transaction,
    TransactionEnvelope, TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    WriteXdr,
};

use crate::ledger::envelope::Envelope;
use crate::ledger::strkey::encode_account;
use crate::ledger::traits::Signer;
use crate::ledger::types::SignerError;

/// Environment variable holding the `S…` secret seed.
pub const SIGNING_KEY_ENV_VAR: &str = "BOOKIE_SIGNING_KEY";

/// Network id: SHA-256 of the network passphrase.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Hash a transaction is signed over on the given network.
pub fn transaction_hash(tx: &Transaction, passphrase: &str) -> Result<[u8; 32], SignerError> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload
        .to_xdr(Limits::none())
        .map_err(|e| SignerError::Unavailable(format!("cannot encode signature payload: {}", e)))?;
    Ok(Sha256::digest(&bytes).into())
}

/// Signs with an ed25519 seed held in process memory.
pub struct LocalSigner {
    key: SigningKey,
    account_id: String,
}

impl LocalSigner {
    /// Create a signer from an `S…` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, SignerError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|_| SignerError::Unavailable("invalid secret seed format".into()))?;
        let key = SigningKey::from_bytes(&seed.0);
        let account_id = encode_account(&key.verifying_key().to_bytes());

        tracing::info!(account = %account_id, "Local signer initialized");

        Ok(Self { key, account_id })
    }

    /// Load the seed from `BOOKIE_SIGNING_KEY`.
    pub fn from_env() -> Result<Self, SignerError> {
        let secret = std::env::var(SIGNING_KEY_ENV_VAR).map_err(|_| {
            SignerError::Unavailable(format!(
                "Environment variable {} not set",
                SIGNING_KEY_ENV_VAR
            ))
        })?;
        Self::from_secret(&secret)
    }

    /// Throwaway key for mock mode, where nothing signed leaves the process.
    pub fn ephemeral() -> Self {
        let key = SigningKey::from_bytes(&rand::random::<[u8; 32]>());
        let account_id = encode_account(&key.verifying_key().to_bytes());
        tracing::debug!(account = %account_id, "Ephemeral signer created");
        Self { key, account_id }
    }

    fn hint(&self) -> SignatureHint {
        let public = self.key.verifying_key().to_bytes();
        SignatureHint([public[28], public[29], public[30], public[31]])
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn account_id(&self) -> String {
        self.account_id.clone()
    }

    async fn sign(
        &self,
        envelope: &Envelope,
        network_passphrase: &str,
    ) -> Result<Envelope, SignerError> {
        let mut v1 = match envelope.decoded().clone() {
            TransactionEnvelope::Tx(v1) => v1,
            _ => {
                return Err(SignerError::Unavailable(
                    "only v1 transaction envelopes can be signed locally".into(),
                ))
            }
        };

        let hash = transaction_hash(&v1.tx, network_passphrase)?;
        let signature = self.key.sign(&hash);

        let mut signatures = v1.signatures.to_vec();
        signatures.push(DecoratedSignature {
            hint: self.hint(),
            signature: Signature(
                signature
                    .to_bytes()
                    .to_vec()
                    .try_into()
                    .map_err(|e| SignerError::Unavailable(format!("bad signature: {}", e)))?,
            ),
        });
        v1.signatures = signatures
            .try_into()
            .map_err(|_| SignerError::Unavailable("too many signatures".into()))?;

        tracing::debug!(account = %self.account_id, "Transaction signed");

        Envelope::from_envelope(TransactionEnvelope::Tx(v1))
            .map_err(|e| SignerError::Unavailable(e.to_string()))
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}
