//! Party identity types
//!
//! A party is a network participant identified by an ed25519 public key.
//! Equality, ordering, and hashing all go through the key-derived
//! [`PartyId`], so two `Party` values with the same key are the same party
//! no matter how they were obtained.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Unique identifier for a party: the raw bytes of its verifying key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId([u8; 32]);

impl PartyId {
    /// Build an identifier from raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short hex prefix is enough to tell parties apart in logs.
        write!(f, "{}", &hex::encode(self.0)[..16])
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({self})")
    }
}

/// A well-known network participant.
///
/// The display name is informational only; identity is the public key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    id: PartyId,
    name: String,
    public_key: VerifyingKey,
}

impl Party {
    /// Create a party from a display name and its verifying key.
    pub fn new(name: impl Into<String>, public_key: VerifyingKey) -> Self {
        Self {
            id: PartyId::from_bytes(public_key.to_bytes()),
            name: name.into(),
            public_key,
        }
    }

    /// The key-derived identifier.
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The verifying key backing this identity.
    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Party {}

impl Hash for Party {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A participant reference as it appears inside protocol calls.
///
/// Anonymous participants carry only a key identifier and must be resolved
/// to a well-known [`Party`] through the identity service before any
/// session is opened to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participant {
    /// A party whose identity is already known.
    Known(Party),
    /// A key identifier with no attached identity.
    Anonymous(PartyId),
}

impl Participant {
    /// The key identifier, regardless of resolution state.
    pub fn id(&self) -> PartyId {
        match self {
            Participant::Known(party) => party.id(),
            Participant::Anonymous(id) => *id,
        }
    }
}

impl From<Party> for Participant {
    fn from(party: Party) -> Self {
        Participant::Known(party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn key(seed: u8) -> VerifyingKey {
        SigningKey::from_bytes(&[seed; 32]).verifying_key()
    }

    #[test]
    fn equality_is_by_identity_not_name() {
        let a = Party::new("Alice", key(1));
        let also_a = Party::new("Alice (settlement desk)", key(1));
        let b = Party::new("Alice", key(2));

        assert_eq!(a, also_a);
        assert_ne!(a, b);
    }

    #[test]
    fn ordering_follows_key_bytes() {
        let low = Party::new("Zed", key(1));
        let high = Party::new("Abe", key(9));
        assert!(low.id() < high.id());
        assert!(low < high);
    }

    #[test]
    fn participant_id_matches_underlying_party() {
        let party = Party::new("Bob", key(3));
        let known = Participant::from(party.clone());
        let anonymous = Participant::Anonymous(party.id());
        assert_eq!(known.id(), anonymous.id());
    }
}
