//! Protocol error taxonomy
//!
//! Every failure is surfaced to the immediate caller as a typed outcome;
//! nothing in this crate retries automatically. `CorruptedResponse` is a
//! protocol-integrity defect and deliberately distinct from `ChangeDenied`,
//! which is a participant's legitimate "no".

use serde::{Deserialize, Serialize};
use yo_core::{PartyId, PayloadHash, TxHash, UnknownCommand, ValidationFailure};

/// Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced by the Yo protocols and their collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ProtocolError {
    /// A transaction broke a contract rule.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A counterparty was unreachable or errored during negotiation.
    #[error("notary negotiation failed with {counterparty}: {reason}")]
    NegotiationFailed {
        /// The counterparty whose exchange failed.
        counterparty: PartyId,
        /// What went wrong with the exchange.
        reason: String,
    },

    /// Negotiation completed but no notary was acceptable to everyone.
    #[error("no notary is acceptable to every participant")]
    NoAgreeableNotary,

    /// A participant rejected a notary change request.
    #[error("notary change request was rejected by a participant")]
    ChangeDenied,

    /// A consent response did not echo the request that was sent.
    #[error("change response did not echo the request that was sent")]
    CorruptedResponse,

    /// The record's current notary refused to replace the record.
    #[error("notary refused to replace record {tx_hash}:{index}: {reason}")]
    StateReplacement {
        /// Producing transaction of the record that failed to swap.
        tx_hash: TxHash,
        /// Output position of the record that failed to swap.
        index: u32,
        /// The notary's refusal reason.
        reason: String,
    },

    /// A participant could not be resolved to a well-known identity.
    #[error("could not resolve {0} to a well-known party")]
    UnresolvableParty(PartyId),

    /// A session could not be opened because the peer is unreachable.
    #[error("peer {0} is unreachable")]
    PeerUnreachable(PartyId),

    /// The session transport failed mid-exchange.
    #[error("session transport failed: {0}")]
    Transport(String),

    /// A required signer refused to countersign.
    #[error("required signer {0} refused to sign")]
    SignatureRefused(PartyId),

    /// The ledger's finality service rejected the transaction.
    #[error("ledger rejected the transaction: {0}")]
    FinalityRejected(String),

    /// The located source transaction cannot back the requested transition.
    #[error("source transaction is not a send or a move of the record")]
    InvalidSourceTransaction,

    /// A command name outside the contract's command set.
    #[error(transparent)]
    UnknownCommand(#[from] UnknownCommand),

    /// No live record matches the payload hash.
    #[error("no live record with payload hash {0}")]
    RecordNotFound(PayloadHash),

    /// More than one live record matches the payload hash.
    #[error("multiple live records share payload hash {0}")]
    AmbiguousRecord(PayloadHash),
}
