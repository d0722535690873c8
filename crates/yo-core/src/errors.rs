//! Error types for the core model

use serde::{Deserialize, Serialize};

/// A state transition broke a contract rule.
///
/// The reason is the exact human-readable rule that failed; callers can
/// rebuild a correct transaction and try again, nothing is retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{reason}")]
pub struct ValidationFailure {
    /// The rule that was violated, verbatim.
    pub reason: String,
}

impl ValidationFailure {
    /// Create a failure with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A command name outside the contract's command set.
///
/// Commands enter the system as text only at the outer boundary (shell,
/// RPC); inside the model they are always a [`crate::CommandKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("unknown command: {0}")]
pub struct UnknownCommand(pub String);
