//! Transaction envelopes.
//!
//! The envelope format belongs to the Stellar XDR definitions. The submission
//! core only needs three facts about it: that it decodes, how many signatures
//! it carries, and whether any operation invokes a contract.

use stellar_xdr::curr::{
    DecoratedSignature, FeeBumpTransactionInnerTx, Limits, Operation, OperationBody, ReadXdr,
    TransactionEnvelope, WriteXdr,
};

use crate::ledger::types::{LedgerResult, ValidationError};

/// A base64 XDR envelope that has passed structural decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    xdr: String,
    decoded: TransactionEnvelope,
}

impl Envelope {
    /// Decode a base64 XDR envelope. Fails with `MalformedEnvelope` when the
    /// input is empty or is not a transaction envelope.
    pub fn from_xdr(xdr: &str) -> Result<Self, ValidationError> {
        let trimmed = xdr.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MalformedEnvelope("empty transaction XDR".into()));
        }
        let decoded = TransactionEnvelope::from_xdr_base64(trimmed, Limits::none())
            .map_err(|e| ValidationError::MalformedEnvelope(e.to_string()))?;
        Ok(Self {
            xdr: trimmed.to_string(),
            decoded,
        })
    }

    pub fn from_envelope(decoded: TransactionEnvelope) -> LedgerResult<Self> {
        let xdr = decoded.to_xdr_base64(Limits::none())?;
        Ok(Self { xdr, decoded })
    }

    pub fn as_xdr(&self) -> &str {
        &self.xdr
    }

    pub fn decoded(&self) -> &TransactionEnvelope {
        &self.decoded
    }

    pub fn into_decoded(self) -> TransactionEnvelope {
        self.decoded
    }

    pub fn signatures(&self) -> &[DecoratedSignature] {
        match &self.decoded {
            TransactionEnvelope::TxV0(e) => e.signatures.as_slice(),
            TransactionEnvelope::Tx(e) => e.signatures.as_slice(),
            TransactionEnvelope::TxFeeBump(e) => e.signatures.as_slice(),
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures().is_empty()
    }

    /// Operations of the (inner) transaction.
    pub fn operations(&self) -> &[Operation] {
        match &self.decoded {
            TransactionEnvelope::TxV0(e) => e.tx.operations.as_slice(),
            TransactionEnvelope::Tx(e) => e.tx.operations.as_slice(),
            TransactionEnvelope::TxFeeBump(e) => match &e.tx.inner_tx {
                FeeBumpTransactionInnerTx::Tx(inner) => inner.tx.operations.as_slice(),
            },
        }
    }

    /// True when any operation touches Soroban. Such envelopes cannot be
    /// submitted through Horizon.
    pub fn has_contract_invocation(&self) -> bool {
        self.operations().iter().any(|op| {
            matches!(
                op.body,
                OperationBody::InvokeHostFunction(_)
                    | OperationBody::ExtendFootprintTtl(_)
                    | OperationBody::RestoreFootprint(_)
            )
        })
    }
}
