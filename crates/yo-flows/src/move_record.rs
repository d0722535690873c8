//! Moving a record to a new target

use crate::lookup::locate_record;
use std::sync::Arc;
use tracing::debug;
use yo_core::{verify, CommandKind, FinalizedTransaction, Party, PayloadHash, Transaction, Yo};
use yo_protocol::{ProtocolResult, YoEffects};

/// Moves a live record to a new target party.
///
/// The record is located by payload content hash, consumed, and reissued
/// with this node as origin and the new party as target. A move keeps the
/// record's notary assignment; changing it is a separate transition (see
/// [`crate::MoveWithNotaryChangeFlow`]).
pub struct MoveFlow<E> {
    effects: Arc<E>,
}

impl<E: YoEffects> MoveFlow<E> {
    /// Create the flow over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Move the record with the given payload hash to `new_target`.
    pub async fn run(
        &self,
        payload_hash: &PayloadHash,
        new_target: &Party,
    ) -> ProtocolResult<FinalizedTransaction> {
        debug!(payload = %payload_hash, "finding the original yo");
        let original = locate_record(self.effects.as_ref(), payload_hash).await?;

        debug!(record = %original, to = %new_target, "creating the new yo");
        let me = self.effects.local_identity();
        let moved = Yo::new(me, new_target.clone(), original.yo.payload.clone());
        let origin = original.yo.origin.clone();
        let notary = original.notary.clone();
        let transaction = Transaction::builder(notary)
            .command(CommandKind::Move)
            .input(original)
            .output(moved)
            .build()?;

        debug!("signing the move");
        let signed = self.effects.sign(transaction).await?;
        let fully_signed = self
            .effects
            .collect(signed, &[new_target.clone(), origin])
            .await?;

        debug!("finalising the move");
        let finalized = self
            .effects
            .finalize(fully_signed, std::slice::from_ref(new_target))
            .await?;

        debug!(tx = %finalized.hash, "verifying the move");
        verify(&finalized.transaction)?;
        Ok(finalized)
    }
}
