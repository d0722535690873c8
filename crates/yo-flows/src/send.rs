//! Sending a fresh record

use std::sync::Arc;
use tracing::debug;
use yo_core::{verify, CommandKind, FinalizedTransaction, Party, Transaction, Yo};
use yo_protocol::{ProtocolResult, YoEffects};

/// Sends a record to a target party, optionally via a specific notary.
///
/// Falls back to the network's default notary when none is named. The
/// resulting transaction is signed by both the sender and the target.
pub struct SendFlow<E> {
    effects: Arc<E>,
}

impl<E: YoEffects> SendFlow<E> {
    /// Create the flow over the given effect handle.
    pub fn new(effects: Arc<E>) -> Self {
        Self { effects }
    }

    /// Send `payload` to `target` and return the finalized transaction.
    pub async fn run(
        &self,
        target: &Party,
        payload: impl Into<String>,
        notary: Option<Party>,
    ) -> ProtocolResult<FinalizedTransaction> {
        let me = self.effects.local_identity();
        let notary = match notary {
            Some(notary) => notary,
            None => self.effects.default_notary().await?,
        };

        debug!(to = %target, notary = %notary, "creating yo");
        let yo = Yo::new(me, target.clone(), payload);
        let transaction = Transaction::builder(notary)
            .command(CommandKind::Send)
            .output(yo)
            .build()?;

        debug!("signing yo");
        let signed = self.effects.sign(transaction).await?;
        let fully_signed = self
            .effects
            .collect(signed, std::slice::from_ref(target))
            .await?;

        debug!("finalising yo");
        let finalized = self
            .effects
            .finalize(fully_signed, std::slice::from_ref(target))
            .await?;

        debug!(tx = %finalized.hash, "verifying yo");
        verify(&finalized.transaction)?;
        Ok(finalized)
    }
}
