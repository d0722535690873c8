//! Deterministic test identities
//!
//! Keys are derived from the identity's name, so the same name always
//! produces the same party across test runs.

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use yo_core::{Party, Signature, TxHash};

/// A test party together with its signing key.
#[derive(Debug, Clone)]
pub struct TestIdentity {
    signing_key: SigningKey,
    party: Party,
}

impl TestIdentity {
    /// Create an identity with a key derived from the name.
    pub fn new(name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        Self::from_seed(name, hasher.finalize().into())
    }

    /// Create an identity from an explicit key seed.
    pub fn from_seed(name: &str, seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let party = Party::new(name, signing_key.verifying_key());
        Self { signing_key, party }
    }

    /// The party this identity acts as.
    pub fn party(&self) -> &Party {
        &self.party
    }

    /// Sign a transaction hash.
    pub fn sign(&self, hash: &TxHash) -> Signature {
        let signature = self.signing_key.sign(hash.as_bytes());
        Signature {
            signer: self.party.id(),
            bytes: signature.to_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_are_deterministic_by_name() {
        let a = TestIdentity::new("Alice");
        let b = TestIdentity::new("Alice");
        let c = TestIdentity::new("Bob");
        assert_eq!(a.party(), b.party());
        assert_ne!(a.party(), c.party());
    }
}
