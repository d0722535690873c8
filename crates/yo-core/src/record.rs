//! The Yo record and references to finalized records

use crate::party::Party;
use crate::transaction::TxHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// The record being transferred: an immutable payload sent from `origin`
/// to `target`.
///
/// A record never changes once produced; transferring it means consuming
/// the old record and producing a new one. For every record in a valid
/// transaction output, `origin != target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Yo {
    /// The party that produced this record.
    pub origin: Party,
    /// The party currently holding this record.
    pub target: Party,
    /// The record content.
    pub payload: String,
}

impl Yo {
    /// The payload used when none is given.
    pub const DEFAULT_PAYLOAD: &'static str = "Yo!";

    /// Create a record.
    pub fn new(origin: Party, target: Party, payload: impl Into<String>) -> Self {
        Self {
            origin,
            target,
            payload: payload.into(),
        }
    }

    /// The content hash this record is looked up by.
    ///
    /// Hashes the payload only: two records with the same payload collide,
    /// which is why lookups surface an ambiguity error rather than picking
    /// one of the matches.
    pub fn payload_hash(&self) -> PayloadHash {
        PayloadHash::of(&self.payload)
    }

    /// Parties with a stake in this record, target first.
    pub fn participants(&self) -> [&Party; 2] {
        [&self.target, &self.origin]
    }
}

impl fmt::Display for Yo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "From {} to {}: {}", self.origin, self.target, self.payload)
    }
}

/// Content hash of a record payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Hash a payload string.
    pub fn of(payload: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A reference to a record produced by a finalized transaction.
///
/// Carries the record itself, the notary assignment recorded by the
/// producing transaction, and the back-reference used to consume the
/// record later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    /// The referenced record.
    pub yo: Yo,
    /// The notary assigned to the record when it was produced.
    pub notary: Party,
    /// Hash of the transaction that produced the record.
    pub tx_hash: TxHash,
    /// Output position within the producing transaction.
    pub index: u32,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn party(seed: u8, name: &str) -> Party {
        Party::new(name, SigningKey::from_bytes(&[seed; 32]).verifying_key())
    }

    #[test]
    fn payload_hash_ignores_participants() {
        let a = Yo::new(party(1, "Alice"), party(2, "Bob"), "Yo!");
        let b = Yo::new(party(3, "Carol"), party(4, "Dan"), "Yo!");
        assert_eq!(a.payload_hash(), b.payload_hash());

        let c = Yo::new(party(1, "Alice"), party(2, "Bob"), "Oy!");
        assert_ne!(a.payload_hash(), c.payload_hash());
    }

    #[test]
    fn participants_list_target_first() {
        let yo = Yo::new(party(1, "Alice"), party(2, "Bob"), "Yo!");
        let [first, second] = yo.participants();
        assert_eq!(first.name(), "Bob");
        assert_eq!(second.name(), "Alice");
    }

    #[test]
    fn display_reads_like_a_message() {
        let yo = Yo::new(party(1, "Alice"), party(2, "Bob"), "Yo!");
        assert_eq!(yo.to_string(), "From Alice to Bob: Yo!");
    }
}
