//! Wire messages exchanged over sessions
//!
//! One enum covers both protocols; a session exchange is always a single
//! request followed by a single reply. Responders echo the change request
//! they evaluated so the requester can detect tampering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use yo_core::{Party, RecordRef};

/// Messages crossing a protocol session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolMessage {
    /// Notary agreement: the initiator's current accepted set.
    NotaryProposal(BTreeSet<Party>),
    /// Notary agreement: the responder's intersection of the proposal with
    /// its own trusted registry.
    NotaryReply(BTreeSet<Party>),
    /// Repointing: ask one participant to consent to a notary change.
    ChangeRequest(ChangeRequest),
    /// Repointing: the participant's verdict, echoing the evaluated request.
    ChangeResponse(ChangeResponse),
}

/// A request to repoint one record to a new notary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// The record whose notary assignment would change.
    pub record: RecordRef,
    /// The proposed replacement notary.
    pub new_notary: Party,
}

/// A participant's reply to a [`ChangeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeResponse {
    /// The request the responder evaluated, echoed back verbatim.
    pub request: ChangeRequest,
    /// Whether the responder consents to the change.
    pub accepted: bool,
}
