//! Yo Protocol - notary agreement and repointing coordination
//!
//! This crate implements the two cooperative multi-party protocols of the
//! Yo system:
//!
//! - **Notary agreement** ([`agreement`]): an initiator narrows a proposal
//!   set of notaries to the intersection acceptable to every counterparty,
//!   one synchronous session exchange at a time.
//! - **Repointing** ([`repointing`]): a coordinator gathers unanimous
//!   consent from every participant of a set of records, and only then asks
//!   the ledger to swap each record's notary assignment. Consent is
//!   all-or-nothing; the swaps themselves are independent per record.
//!
//! Everything the protocols need from the outside world - sessions,
//! identity resolution, the notary registry, signature collection,
//! finality, and vault lookups - is injected through the effect traits in
//! [`effects`]. There is no ambient state: each protocol run owns its own
//! accumulators and suspends only at session and sub-protocol boundaries.

#![forbid(unsafe_code)]

/// Notary agreement protocol (initiating and responding halves)
pub mod agreement;

/// Collaborator contracts consumed by the protocols
pub mod effects;

/// Protocol error taxonomy
pub mod error;

/// Wire messages exchanged over sessions
pub mod messages;

/// Repointing coordinator (consent phase, execute phase, responder policy)
pub mod repointing;

pub use agreement::{AgreedNotaries, AgreementResponder, NotaryAgreement};
pub use effects::{
    FinalityEffects, IdentityEffects, NotaryEffects, Session, SessionEffects, SessionId,
    SignatureEffects, VaultEffects, YoEffects,
};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{ChangeRequest, ChangeResponse, ProtocolMessage};
pub use repointing::{ChangePolicy, ChangeResponder, RepointingCoordinator};
