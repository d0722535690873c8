//! Transactions, commands, signatures, and lifecycle wrappers
//!
//! A transaction consumes record references, produces records, and carries
//! exactly one command. It starts unsigned, accumulates signatures, and
//! becomes a [`FinalizedTransaction`] only once the ledger's finality
//! service accepts it. The transaction hash covers inputs, outputs, command,
//! and notary; signatures are excluded so the hash is stable while
//! signatures are being gathered.

use crate::errors::{UnknownCommand, ValidationFailure};
use crate::party::{Party, PartyId};
use crate::record::{RecordRef, Yo};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// The declared intent of a transaction.
///
/// Dispatch in the contract is an exhaustive match: introducing a new kind
/// is a compile-checked change everywhere a command is inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Produce a fresh record with no inputs.
    Send,
    /// Consume a record and produce it re-addressed to a new target.
    Move,
}

impl CommandKind {
    /// Stable name, used for display and command parsing.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Send => "send",
            CommandKind::Move => "move",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            CommandKind::Send => 0,
            CommandKind::Move => 1,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "send" => Ok(CommandKind::Send),
            // "forward" is the historical spelling of a move.
            "move" | "forward" => Ok(CommandKind::Move),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Hash identifying a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Build a hash from raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short hex prefix is enough to tell transactions apart in logs.
        write!(f, "{}", &hex::encode(self.0)[..16])
    }
}

/// An ed25519 signature over a transaction hash, tagged with its signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// The party that produced the signature.
    pub signer: PartyId,
    /// Raw signature bytes over the transaction hash.
    pub bytes: Vec<u8>,
}

/// A bundle of consumed inputs, produced outputs, one command, a notary,
/// and the signatures gathered so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Record references consumed by this transaction.
    pub inputs: Vec<RecordRef>,
    /// Records produced by this transaction.
    pub outputs: Vec<Yo>,
    /// The single command declaring this transaction's intent.
    pub command: CommandKind,
    /// The notary assigned to every output of this transaction.
    pub notary: Party,
    /// Signatures collected so far, at most one per signer.
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Start building a transaction against the given notary.
    pub fn builder(notary: Party) -> TransactionBuilder {
        TransactionBuilder::new(notary)
    }

    /// The transaction hash: inputs, outputs, command, and notary.
    ///
    /// Signatures are excluded so that signing does not move the hash.
    pub fn hash(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update((self.inputs.len() as u64).to_be_bytes());
        for input in &self.inputs {
            hasher.update(input.tx_hash.as_bytes());
            hasher.update(input.index.to_be_bytes());
        }
        hasher.update((self.outputs.len() as u64).to_be_bytes());
        for output in &self.outputs {
            hasher.update(output.origin.id().as_bytes());
            hasher.update(output.target.id().as_bytes());
            hasher.update((output.payload.len() as u64).to_be_bytes());
            hasher.update(output.payload.as_bytes());
        }
        hasher.update([self.command.tag()]);
        hasher.update(self.notary.id().as_bytes());
        TxHash(hasher.finalize().into())
    }

    /// Whether a signature from the given party is attached.
    pub fn is_signed_by(&self, id: &PartyId) -> bool {
        self.signatures.iter().any(|sig| sig.signer == *id)
    }

    /// Attach a signature, replacing any earlier one from the same signer.
    pub fn add_signature(&mut self, signature: Signature) {
        self.signatures.retain(|sig| sig.signer != signature.signer);
        self.signatures.push(signature);
    }
}

/// Builder for a transaction draft.
pub struct TransactionBuilder {
    notary: Party,
    inputs: Vec<RecordRef>,
    outputs: Vec<Yo>,
    command: Option<CommandKind>,
}

impl TransactionBuilder {
    /// Start a draft against the given notary.
    pub fn new(notary: Party) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            command: None,
        }
    }

    /// Add an input record reference.
    pub fn input(mut self, record: RecordRef) -> Self {
        self.inputs.push(record);
        self
    }

    /// Add an output record.
    pub fn output(mut self, yo: Yo) -> Self {
        self.outputs.push(yo);
        self
    }

    /// Set the command. A transaction carries exactly one.
    pub fn command(mut self, command: CommandKind) -> Self {
        self.command = Some(command);
        self
    }

    /// Assemble the unsigned transaction.
    pub fn build(self) -> Result<Transaction, ValidationFailure> {
        let command = self
            .command
            .ok_or_else(|| ValidationFailure::new("transaction requires a command"))?;
        Ok(Transaction {
            inputs: self.inputs,
            outputs: self.outputs,
            command,
            notary: self.notary,
            signatures: Vec::new(),
        })
    }
}

/// A transaction for which every required signature has been collected.
///
/// Produced by the signature-collection service; consumed by finality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The fully signed transaction.
    pub transaction: Transaction,
}

impl SignedTransaction {
    /// Wrap a transaction whose signature set is complete.
    pub fn new(transaction: Transaction) -> Self {
        Self { transaction }
    }

    /// The transaction hash.
    pub fn hash(&self) -> TxHash {
        self.transaction.hash()
    }
}

/// A transaction accepted by the ledger's finality service.
///
/// Its outputs are spendable records; its inputs are consumed and can never
/// be referenced again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTransaction {
    /// The finalized transaction.
    pub transaction: Transaction,
    /// Cached transaction hash.
    pub hash: TxHash,
}

impl FinalizedTransaction {
    /// Wrap an accepted transaction, caching its hash.
    pub fn new(transaction: Transaction) -> Self {
        let hash = transaction.hash();
        Self { transaction, hash }
    }

    /// A reference to the output at the given position, if any.
    pub fn output_ref(&self, index: u32) -> Option<RecordRef> {
        let yo = self.transaction.outputs.get(index as usize)?.clone();
        Some(RecordRef {
            yo,
            notary: self.transaction.notary.clone(),
            tx_hash: self.hash,
            index,
        })
    }
}
