//! Mock ledger: finality, uniqueness, and the notary-swap primitive
//!
//! One ledger is shared by every node of a [`crate::TestNetwork`]. It
//! consults the core contract before accepting a transaction, checks every
//! attached signature cryptographically, and enforces single consumption of
//! records. The swap primitive refuses replacements the way a real notary
//! cluster would: unknown replacement notaries and already-consumed records
//! are rejected.

use ed25519_dalek::{Signature as EdSignature, VerifyingKey};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use yo_core::{
    verify, FinalizedTransaction, Party, PartyId, RecordRef, SignedTransaction, TxHash,
};
use yo_protocol::{ProtocolError, ProtocolResult};

/// Key identifying one output of one transaction.
pub(crate) type StateKey = (TxHash, u32);

/// The network-wide finality and uniqueness service.
pub(crate) struct Ledger {
    notaries: Vec<Party>,
    notary_ids: HashSet<PartyId>,
    transactions: Mutex<HashMap<TxHash, FinalizedTransaction>>,
    consumed: Mutex<HashSet<StateKey>>,
}

impl Ledger {
    pub(crate) fn new(notaries: Vec<Party>) -> Self {
        let notary_ids = notaries.iter().map(|notary| notary.id()).collect();
        Self {
            notaries,
            notary_ids,
            transactions: Mutex::new(HashMap::new()),
            consumed: Mutex::new(HashSet::new()),
        }
    }

    /// The notary used when a flow does not name one.
    pub(crate) fn default_notary(&self) -> Option<Party> {
        self.notaries.last().cloned()
    }

    /// Accept a fully signed transaction or reject it with a reason.
    pub(crate) fn commit(&self, signed: SignedTransaction) -> ProtocolResult<FinalizedTransaction> {
        let hash = signed.hash();
        let tx = &signed.transaction;

        verify(tx).map_err(|failure| ProtocolError::FinalityRejected(failure.to_string()))?;

        if !self.notary_ids.contains(&tx.notary.id()) {
            return Err(ProtocolError::FinalityRejected(format!(
                "{} is not a notary on this network",
                tx.notary
            )));
        }
        for input in &tx.inputs {
            if input.notary != tx.notary {
                return Err(ProtocolError::FinalityRejected(format!(
                    "input {input} is assigned to a different notary"
                )));
            }
        }
        for signature in &tx.signatures {
            if !signature_checks_out(&hash, &signature.signer, &signature.bytes) {
                return Err(ProtocolError::FinalityRejected(format!(
                    "invalid signature from {}",
                    signature.signer
                )));
            }
        }

        let mut consumed = self.consumed.lock().unwrap();
        for input in &tx.inputs {
            if consumed.contains(&(input.tx_hash, input.index)) {
                return Err(ProtocolError::FinalityRejected(format!(
                    "input {input} already consumed"
                )));
            }
        }
        for input in &tx.inputs {
            consumed.insert((input.tx_hash, input.index));
        }
        drop(consumed);

        let finalized = FinalizedTransaction::new(signed.transaction);
        self.transactions
            .lock()
            .unwrap()
            .insert(finalized.hash, finalized.clone());
        Ok(finalized)
    }

    /// The notary-swap primitive: consume the record and reissue it under
    /// the replacement notary.
    pub(crate) fn swap(
        &self,
        record: &RecordRef,
        new_notary: &Party,
    ) -> ProtocolResult<RecordRef> {
        if !self.notary_ids.contains(&new_notary.id()) {
            return Err(ProtocolError::StateReplacement {
                tx_hash: record.tx_hash,
                index: record.index,
                reason: format!("{new_notary} is not a notary on this network"),
            });
        }
        let mut consumed = self.consumed.lock().unwrap();
        let key = (record.tx_hash, record.index);
        if consumed.contains(&key) {
            return Err(ProtocolError::StateReplacement {
                tx_hash: record.tx_hash,
                index: record.index,
                reason: "record already consumed".to_string(),
            });
        }
        consumed.insert(key);
        drop(consumed);

        // Back-reference for the reissued record. Notary changes are not
        // commands of the contract, so the reference is derived rather than
        // pointing at a stored transaction.
        let mut hasher = Sha256::new();
        hasher.update(record.tx_hash.as_bytes());
        hasher.update(record.index.to_be_bytes());
        hasher.update(new_notary.id().as_bytes());
        hasher.update(b"notary-change");
        let tx_hash = TxHash::from_bytes(hasher.finalize().into());

        Ok(RecordRef {
            yo: record.yo.clone(),
            notary: new_notary.clone(),
            tx_hash,
            index: 0,
        })
    }
}

fn signature_checks_out(hash: &TxHash, signer: &PartyId, bytes: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
        return false;
    };
    let Ok(signature) = EdSignature::from_slice(bytes) else {
        return false;
    };
    key.verify_strict(hash.as_bytes(), &signature).is_ok()
}
