//! Collaborator contracts consumed by the protocols
//!
//! The protocols never talk to the network, the ledger, or a key store
//! directly; every external capability is a trait injected at the call
//! site. Production nodes and the test network implement the same traits,
//! so protocol logic is identical in both.
//!
//! All cross-party steps are synchronous exchanges: send, then block
//! awaiting the reply. Suspension happens exactly at these awaits and at
//! sub-protocol boundaries; counterparties are never contacted in parallel
//! within one protocol run.

use crate::error::ProtocolResult;
use crate::messages::ProtocolMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use yo_core::{
    FinalizedTransaction, Participant, Party, PartyId, PayloadHash, RecordRef, SignedTransaction,
    Transaction, TxHash,
};

/// Identifier for one protocol session, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a fresh random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// A point-to-point message exchange channel for one protocol run.
#[async_trait]
pub trait Session: Send {
    /// This session's identifier.
    fn id(&self) -> SessionId;

    /// Send a message to the peer.
    async fn send(&mut self, message: ProtocolMessage) -> ProtocolResult<()>;

    /// Block until the peer's next message arrives.
    async fn receive(&mut self) -> ProtocolResult<ProtocolMessage>;
}

/// Opens sessions to well-known parties.
#[async_trait]
pub trait SessionEffects: Send + Sync {
    /// Open a session to the given party.
    ///
    /// Fails with `PeerUnreachable` when no route to the party exists.
    async fn open(&self, party: &Party) -> ProtocolResult<Box<dyn Session>>;
}

/// Identity resolution and key ownership.
#[async_trait]
pub trait IdentityEffects: Send + Sync {
    /// The identity this node acts as.
    fn local_identity(&self) -> Party;

    /// Resolve a participant to a well-known party.
    ///
    /// Fails with `UnresolvableParty` when no identity mapping exists.
    async fn resolve(&self, participant: &Participant) -> ProtocolResult<Party>;

    /// Whether this node holds a signing key for the given party.
    async fn holds_key_for(&self, id: &PartyId) -> bool;
}

/// The local notary registry and the external notary-swap primitive.
#[async_trait]
pub trait NotaryEffects: Send + Sync {
    /// The notaries this node trusts.
    async fn trusted_notaries(&self) -> BTreeSet<Party>;

    /// The network's default notary.
    async fn default_notary(&self) -> ProtocolResult<Party>;

    /// Ask the record's current notary to reassign it.
    ///
    /// Fails with `StateReplacement` when the currently assigned notary
    /// refuses the swap.
    async fn swap_notary(&self, record: &RecordRef, new_notary: &Party)
        -> ProtocolResult<RecordRef>;
}

/// Signing with the local key and countersignature collection.
#[async_trait]
pub trait SignatureEffects: Send + Sync {
    /// Attach this node's signature to the transaction.
    async fn sign(&self, transaction: Transaction) -> ProtocolResult<Transaction>;

    /// Gather signatures from every listed signer.
    ///
    /// Fails with `SignatureRefused` if any required signer declines.
    async fn collect(
        &self,
        transaction: Transaction,
        signers: &[Party],
    ) -> ProtocolResult<SignedTransaction>;
}

/// Submission to the ledger's finality service.
#[async_trait]
pub trait FinalityEffects: Send + Sync {
    /// Submit a fully signed transaction and distribute it to recipients.
    ///
    /// Fails with `FinalityRejected` when the uniqueness service refuses,
    /// e.g. on a double-spend or a stale reference.
    async fn finalize(
        &self,
        transaction: SignedTransaction,
        recipients: &[Party],
    ) -> ProtocolResult<FinalizedTransaction>;
}

/// Queries against the local record store.
#[async_trait]
pub trait VaultEffects: Send + Sync {
    /// Look up a finalized transaction by hash.
    async fn transaction(&self, hash: &TxHash) -> Option<FinalizedTransaction>;

    /// All live records whose payload hashes to the given value.
    async fn live_by_payload(&self, hash: &PayloadHash) -> Vec<RecordRef>;
}

/// Everything a transition flow needs from its environment.
pub trait YoEffects:
    SessionEffects
    + IdentityEffects
    + NotaryEffects
    + SignatureEffects
    + FinalityEffects
    + VaultEffects
{
}

impl<T> YoEffects for T where
    T: SessionEffects
        + IdentityEffects
        + NotaryEffects
        + SignatureEffects
        + FinalityEffects
        + VaultEffects
{
}

#[async_trait]
impl<T: SessionEffects + ?Sized> SessionEffects for Arc<T> {
    async fn open(&self, party: &Party) -> ProtocolResult<Box<dyn Session>> {
        (**self).open(party).await
    }
}

#[async_trait]
impl<T: IdentityEffects + ?Sized> IdentityEffects for Arc<T> {
    fn local_identity(&self) -> Party {
        (**self).local_identity()
    }

    async fn resolve(&self, participant: &Participant) -> ProtocolResult<Party> {
        (**self).resolve(participant).await
    }

    async fn holds_key_for(&self, id: &PartyId) -> bool {
        (**self).holds_key_for(id).await
    }
}

#[async_trait]
impl<T: NotaryEffects + ?Sized> NotaryEffects for Arc<T> {
    async fn trusted_notaries(&self) -> BTreeSet<Party> {
        (**self).trusted_notaries().await
    }

    async fn default_notary(&self) -> ProtocolResult<Party> {
        (**self).default_notary().await
    }

    async fn swap_notary(
        &self,
        record: &RecordRef,
        new_notary: &Party,
    ) -> ProtocolResult<RecordRef> {
        (**self).swap_notary(record, new_notary).await
    }
}

#[async_trait]
impl<T: SignatureEffects + ?Sized> SignatureEffects for Arc<T> {
    async fn sign(&self, transaction: Transaction) -> ProtocolResult<Transaction> {
        (**self).sign(transaction).await
    }

    async fn collect(
        &self,
        transaction: Transaction,
        signers: &[Party],
    ) -> ProtocolResult<SignedTransaction> {
        (**self).collect(transaction, signers).await
    }
}

#[async_trait]
impl<T: FinalityEffects + ?Sized> FinalityEffects for Arc<T> {
    async fn finalize(
        &self,
        transaction: SignedTransaction,
        recipients: &[Party],
    ) -> ProtocolResult<FinalizedTransaction> {
        (**self).finalize(transaction, recipients).await
    }
}

#[async_trait]
impl<T: VaultEffects + ?Sized> VaultEffects for Arc<T> {
    async fn transaction(&self, hash: &TxHash) -> Option<FinalizedTransaction> {
        (**self).transaction(hash).await
    }

    async fn live_by_payload(&self, hash: &PayloadHash) -> Vec<RecordRef> {
        (**self).live_by_payload(hash).await
    }
}
