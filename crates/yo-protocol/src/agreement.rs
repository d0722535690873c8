//! Notary agreement protocol
//!
//! Negotiates, among mutually distrustful parties, a set of notaries they
//! all accept. The initiator starts from its own proposal set and narrows
//! it through one session exchange per counterparty; each responder
//! intersects what it receives with its own trusted registry and never
//! simply echoes the proposal. The protocol is cooperative: a requester can
//! renegotiate or discard the result, so nothing here defends against a
//! dishonest initiator.

use crate::effects::{IdentityEffects, NotaryEffects, Session, SessionEffects};
use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::ProtocolMessage;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;
use yo_core::Party;

/// The outcome of a negotiation: every notary acceptable to the initiator
/// and all responding counterparties, possibly none.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgreedNotaries(BTreeSet<Party>);

impl AgreedNotaries {
    /// Wrap a negotiated set.
    pub fn new(notaries: BTreeSet<Party>) -> Self {
        Self(notaries)
    }

    /// The empty outcome.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether no notary was acceptable to everyone.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deterministic pick when several notaries remain acceptable: the one
    /// with the smallest party identifier. No ordering is promised beyond
    /// that, and callers wanting a different tie-break can iterate the set.
    pub fn preferred(&self) -> Option<&Party> {
        self.0.iter().next()
    }

    /// Borrow the agreed set.
    pub fn as_set(&self) -> &BTreeSet<Party> {
        &self.0
    }

    /// Consume into the agreed set.
    pub fn into_set(self) -> BTreeSet<Party> {
        self.0
    }
}

/// The initiating half of the agreement protocol.
pub struct NotaryAgreement<E> {
    effects: Arc<E>,
}

impl<E> NotaryAgreement<E>
where
    E: SessionEffects + IdentityEffects,
{
    /// Create an initiator over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Negotiate with an unordered set of counterparties.
    pub async fn negotiate(
        &self,
        counterparties: &BTreeSet<Party>,
        proposed: &BTreeSet<Party>,
    ) -> ProtocolResult<AgreedNotaries> {
        self.run(counterparties.iter(), proposed).await
    }

    /// Negotiate with counterparties in the given order.
    pub async fn negotiate_ordered(
        &self,
        counterparties: &[Party],
        proposed: &BTreeSet<Party>,
    ) -> ProtocolResult<AgreedNotaries> {
        self.run(counterparties.iter(), proposed).await
    }

    async fn run<'a, I>(&self, counterparties: I, proposed: &BTreeSet<Party>) -> ProtocolResult<AgreedNotaries>
    where
        I: Iterator<Item = &'a Party>,
    {
        let me = self.effects.local_identity();
        let mut accepted = proposed.clone();
        if accepted.is_empty() {
            return Ok(AgreedNotaries::empty());
        }

        for counterparty in counterparties {
            if *counterparty == me {
                continue;
            }
            let reply = self
                .exchange(counterparty, &accepted)
                .await
                .map_err(|err| ProtocolError::NegotiationFailed {
                    counterparty: counterparty.id(),
                    reason: err.to_string(),
                })?;
            accepted = accepted.intersection(&reply).cloned().collect();
            debug!(
                counterparty = %counterparty,
                remaining = accepted.len(),
                "notary proposal narrowed"
            );
            if accepted.is_empty() {
                // Nothing left that everyone could accept; stop contacting
                // the remaining counterparties.
                return Ok(AgreedNotaries::empty());
            }
        }
        Ok(AgreedNotaries::new(accepted))
    }

    async fn exchange(
        &self,
        counterparty: &Party,
        accepted: &BTreeSet<Party>,
    ) -> ProtocolResult<BTreeSet<Party>> {
        let mut session = self.effects.open(counterparty).await?;
        debug!(session = %session.id(), counterparty = %counterparty, "proposing notaries");
        session
            .send(ProtocolMessage::NotaryProposal(accepted.clone()))
            .await?;
        match session.receive().await? {
            ProtocolMessage::NotaryReply(reply) => Ok(reply),
            _ => Err(ProtocolError::CorruptedResponse),
        }
    }
}

/// The responding half of the agreement protocol.
///
/// Answers a proposal with its intersection against the local trusted
/// registry.
pub struct AgreementResponder<E> {
    effects: Arc<E>,
}

impl<E> AgreementResponder<E>
where
    E: NotaryEffects,
{
    /// Create a responder over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Compute the reply to a single proposal.
    pub async fn answer(&self, proposal: &BTreeSet<Party>) -> BTreeSet<Party> {
        let registry = self.effects.trusted_notaries().await;
        proposal.intersection(&registry).cloned().collect()
    }

    /// Drive one full exchange over an accepted session.
    pub async fn respond(&self, session: &mut dyn Session) -> ProtocolResult<BTreeSet<Party>> {
        let proposal = match session.receive().await? {
            ProtocolMessage::NotaryProposal(proposal) => proposal,
            _ => return Err(ProtocolError::CorruptedResponse),
        };
        let reply = self.answer(&proposal).await;
        debug!(
            session = %session.id(),
            proposed = proposal.len(),
            accepted = reply.len(),
            "answering notary proposal"
        );
        session
            .send(ProtocolMessage::NotaryReply(reply.clone()))
            .await?;
        Ok(reply)
    }
}
