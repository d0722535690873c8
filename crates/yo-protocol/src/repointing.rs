//! Repointing coordinator
//!
//! Changes the notary assignment of a set of records in two strictly
//! ordered phases. The consent phase asks every affected participant for an
//! affirmative answer and aborts the whole batch on a single rejection; no
//! swap begins before every consent is in. The execute phase then asks the
//! ledger to swap each record independently: a late refusal by a record's
//! current notary does not roll back swaps already completed.
//!
//! The coordination is cooperative: nothing stops a requester from
//! gathering consent and then submitting a different change. Consent is a
//! courtesy protocol among parties that already trust the ledger layer to
//! enforce the actual swap rules.

use crate::agreement::NotaryAgreement;
use crate::effects::{IdentityEffects, NotaryEffects, Session, SessionEffects};
use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{ChangeRequest, ChangeResponse, ProtocolMessage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use yo_core::{Participant, Party, PartyId, RecordRef, Transaction};

/// Coordinates notary changes across records and their participants.
pub struct RepointingCoordinator<E> {
    effects: Arc<E>,
}

impl<E> RepointingCoordinator<E>
where
    E: SessionEffects + IdentityEffects + NotaryEffects,
{
    /// Create a coordinator over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Repoint finalized records to `new_notary`.
    ///
    /// Consent is requested from every participant of every record; any
    /// rejection aborts with `ChangeDenied` before a single swap happens.
    pub async fn repoint_records(
        &self,
        records: &[RecordRef],
        new_notary: &Party,
    ) -> ProtocolResult<Vec<RecordRef>> {
        for record in records {
            for participant in record.yo.participants() {
                let resolved = self
                    .effects
                    .resolve(&Participant::from(participant.clone()))
                    .await?;
                self.request_consent(&resolved, record, new_notary).await?;
            }
        }
        self.execute_swaps(records, new_notary).await
    }

    /// Repoint the locally-owned inputs of a draft transaction to
    /// `new_notary`, with consent from every participant of the draft.
    ///
    /// Records the caller holds no signing key for are skipped entirely;
    /// their owners repoint them themselves or not at all.
    pub async fn repoint_draft(
        &self,
        draft: &Transaction,
        new_notary: &Party,
    ) -> ProtocolResult<Vec<RecordRef>> {
        let participants = self.draft_participants(draft).await?;
        let owned = self.owned_inputs(draft).await;
        if owned.is_empty() {
            debug!("no locally-owned inputs to repoint");
            return Ok(Vec::new());
        }
        info!(
            records = owned.len(),
            participants = participants.len(),
            notary = %new_notary,
            "requesting consent to repoint"
        );
        for record in &owned {
            for participant in &participants {
                self.request_consent(participant, record, new_notary).await?;
            }
        }
        self.execute_swaps(&owned, new_notary).await
    }

    /// Negotiate a mutually acceptable notary across every participant of
    /// the draft, then repoint the locally-owned inputs to it.
    pub async fn negotiate_and_repoint_draft(
        &self,
        draft: &Transaction,
        proposed: &BTreeSet<Party>,
    ) -> ProtocolResult<Vec<RecordRef>> {
        let participants = self.draft_participants(draft).await?;
        let agreement = NotaryAgreement::new(Arc::clone(&self.effects));
        let agreed = agreement.negotiate(&participants, proposed).await?;
        let new_notary = agreed
            .preferred()
            .cloned()
            .ok_or(ProtocolError::NoAgreeableNotary)?;
        info!(notary = %new_notary, "agreed on a notary");
        self.repoint_draft(draft, &new_notary).await
    }

    /// One consent exchange. The echoed request must match what was sent:
    /// a mismatch is a protocol defect, not a rejection.
    async fn request_consent(
        &self,
        participant: &Party,
        record: &RecordRef,
        new_notary: &Party,
    ) -> ProtocolResult<()> {
        let request = ChangeRequest {
            record: record.clone(),
            new_notary: new_notary.clone(),
        };
        let mut session = self.effects.open(participant).await?;
        debug!(
            session = %session.id(),
            participant = %participant,
            record = %record,
            "requesting notary change consent"
        );
        session
            .send(ProtocolMessage::ChangeRequest(request.clone()))
            .await?;
        let response = match session.receive().await? {
            ProtocolMessage::ChangeResponse(response) => response,
            _ => return Err(ProtocolError::CorruptedResponse),
        };
        if response.request != request {
            warn!(participant = %participant, "consent response echoed a different request");
            return Err(ProtocolError::CorruptedResponse);
        }
        if !response.accepted {
            info!(participant = %participant, "notary change rejected");
            return Err(ProtocolError::ChangeDenied);
        }
        Ok(())
    }

    /// Execute phase: swaps are independent per record, so a failure stops
    /// the batch but leaves earlier swaps in place.
    async fn execute_swaps(
        &self,
        records: &[RecordRef],
        new_notary: &Party,
    ) -> ProtocolResult<Vec<RecordRef>> {
        let mut repointed = Vec::with_capacity(records.len());
        for record in records {
            let swapped = self.effects.swap_notary(record, new_notary).await?;
            debug!(record = %record, new = %swapped, "notary swapped");
            repointed.push(swapped);
        }
        Ok(repointed)
    }

    async fn draft_participants(&self, draft: &Transaction) -> ProtocolResult<BTreeSet<Party>> {
        let mut participants = BTreeSet::new();
        let records = draft
            .inputs
            .iter()
            .map(|input| &input.yo)
            .chain(draft.outputs.iter());
        for yo in records {
            for participant in yo.participants() {
                let resolved = self
                    .effects
                    .resolve(&Participant::from(participant.clone()))
                    .await?;
                participants.insert(resolved);
            }
        }
        Ok(participants)
    }

    async fn owned_inputs(&self, draft: &Transaction) -> Vec<RecordRef> {
        let mut owned = Vec::new();
        for input in &draft.inputs {
            if self.owns_record(input).await {
                owned.push(input.clone());
            }
        }
        owned
    }

    async fn owns_record(&self, record: &RecordRef) -> bool {
        for participant in record.yo.participants() {
            if self.effects.holds_key_for(&participant.id()).await {
                return true;
            }
        }
        false
    }
}

/// The local policy a participant consults before consenting to a notary
/// change: the replacement must be a notary the participant trusts and
/// must not be on its denylist.
#[derive(Debug, Clone, Default)]
pub struct ChangePolicy {
    trusted: BTreeSet<PartyId>,
    denied: BTreeSet<PartyId>,
}

impl ChangePolicy {
    /// A policy trusting exactly the given notaries.
    pub fn trusting(notaries: impl IntoIterator<Item = PartyId>) -> Self {
        Self {
            trusted: notaries.into_iter().collect(),
            denied: BTreeSet::new(),
        }
    }

    /// Add a notary to the denylist.
    pub fn deny(mut self, notary: PartyId) -> Self {
        self.denied.insert(notary);
        self
    }

    /// Whether the policy permits repointing to the given notary.
    pub fn permits(&self, new_notary: &Party) -> bool {
        let id = new_notary.id();
        self.trusted.contains(&id) && !self.denied.contains(&id)
    }
}

/// The responding half of the consent phase: evaluates a change request
/// against the local policy and echoes the request with a verdict.
pub struct ChangeResponder {
    policy: ChangePolicy,
}

impl ChangeResponder {
    /// Create a responder with the given policy.
    pub fn new(policy: ChangePolicy) -> Self {
        Self { policy }
    }

    /// Evaluate a single change request.
    pub fn answer(&self, request: ChangeRequest) -> ChangeResponse {
        let accepted = self.policy.permits(&request.new_notary);
        ChangeResponse { accepted, request }
    }

    /// Drive one full exchange over an accepted session.
    pub async fn respond(&self, session: &mut dyn Session) -> ProtocolResult<ChangeResponse> {
        let request = match session.receive().await? {
            ProtocolMessage::ChangeRequest(request) => request,
            _ => return Err(ProtocolError::CorruptedResponse),
        };
        let response = self.answer(request);
        debug!(
            session = %session.id(),
            accepted = response.accepted,
            "answering notary change request"
        );
        session
            .send(ProtocolMessage::ChangeResponse(response.clone()))
            .await?;
        Ok(response)
    }
}
