//! Moving a record while changing its notary assignment

use crate::lookup::locate_record;
use std::sync::Arc;
use tracing::{debug, info};
use yo_core::{verify, CommandKind, FinalizedTransaction, Party, PayloadHash, Transaction, Yo};
use yo_protocol::{ProtocolError, ProtocolResult, RepointingCoordinator, YoEffects};

/// Moves a record to a new target, repointing it to a new notary first.
///
/// The repointing coordinator gathers consent from everyone with a stake
/// in the move - the record's participants and the new target - before the
/// record is swapped; any rejection aborts the whole flow and the record
/// stays on its current notary.
pub struct MoveWithNotaryChangeFlow<E> {
    effects: Arc<E>,
}

impl<E: YoEffects> MoveWithNotaryChangeFlow<E> {
    /// Create the flow over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Move the record with the given payload hash to `new_target`,
    /// notarized by `new_notary`.
    pub async fn run(
        &self,
        payload_hash: &PayloadHash,
        new_target: &Party,
        new_notary: &Party,
    ) -> ProtocolResult<FinalizedTransaction> {
        debug!(payload = %payload_hash, "finding the original yo");
        let original = locate_record(self.effects.as_ref(), payload_hash).await?;

        info!(record = %original, notary = %new_notary, "renotarising the original yo");
        let me = self.effects.local_identity();
        let moved = Yo::new(me, new_target.clone(), original.yo.payload.clone());
        // The draft names everyone with a stake in the move, so consent is
        // gathered from the new target as well as the record's parties.
        let draft = Transaction::builder(new_notary.clone())
            .command(CommandKind::Move)
            .input(original.clone())
            .output(moved.clone())
            .build()?;
        let coordinator = RepointingCoordinator::new(Arc::clone(&self.effects));
        let repointed = coordinator
            .repoint_draft(&draft, new_notary)
            .await?
            .pop()
            .ok_or_else(|| ProtocolError::StateReplacement {
                tx_hash: original.tx_hash,
                index: original.index,
                reason: "record was not repointed".to_string(),
            })?;

        debug!(record = %repointed, "creating the yo move");
        let origin = original.yo.origin.clone();
        let transaction = Transaction::builder(new_notary.clone())
            .command(CommandKind::Move)
            .input(repointed)
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
