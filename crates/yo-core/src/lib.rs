//! Yo Core - record and transition model
//!
//! This crate provides the data types shared by every Yo protocol: parties,
//! records, transactions, and the pure validity predicate that decides which
//! state transitions are legal. It performs no I/O and holds no state; the
//! ledger layer consults [`verify`] before a transaction is considered final,
//! and the protocol crates build on the same types.
//!
//! # Model
//!
//! - A [`Party`] is a network participant identified by its public key.
//! - A [`Yo`] is the immutable record being transferred: origin, target, and
//!   a payload string. Records are content-addressed by payload hash.
//! - A [`Transaction`] consumes record references, produces records, carries
//!   exactly one [`CommandKind`], names a notary, and accumulates signatures.
//! - [`verify`] is the deterministic contract: given a well-typed
//!   transaction it returns `Ok` or a [`ValidationFailure`] with a specific
//!   human-readable reason. It never panics and never touches the outside
//!   world.

#![forbid(unsafe_code)]

/// Party identity types
pub mod party;

/// The Yo record and references to finalized records
pub mod record;

/// Transactions, commands, signatures, and lifecycle wrappers
pub mod transaction;

/// The pure state-transition contract
pub mod contract;

/// Error types for the core model
pub mod errors;

pub use contract::verify;
pub use errors::{UnknownCommand, ValidationFailure};
pub use party::{Participant, Party, PartyId};
pub use record::{PayloadHash, RecordRef, Yo};
pub use transaction::{
    CommandKind, FinalizedTransaction, SignedTransaction, Signature, Transaction,
    TransactionBuilder, TxHash,
};
