//! Locating live records by payload content hash
//!
//! Records are addressed by the hash of their payload alone, so distinct
//! records can collide. A collision surfaces as `AmbiguousRecord` rather
//! than silently picking one of the matches.

use yo_core::{CommandKind, PayloadHash, RecordRef};
use yo_protocol::{ProtocolError, ProtocolResult, VaultEffects};

/// Find the single live record with the given payload hash and check that
/// the transaction that produced it can back a move.
pub(crate) async fn locate_record<E>(
    effects: &E,
    payload_hash: &PayloadHash,
) -> ProtocolResult<RecordRef>
where
    E: VaultEffects + ?Sized,
{
    let mut matches = effects.live_by_payload(payload_hash).await;
    let record = match matches.len() {
        0 => return Err(ProtocolError::RecordNotFound(*payload_hash)),
        1 => matches.remove(0),
        _ => return Err(ProtocolError::AmbiguousRecord(*payload_hash)),
    };

    let source = effects
        .transaction(&record.tx_hash)
        .await
        .ok_or(ProtocolError::InvalidSourceTransaction)?;
    // Only a send or a move can back a further move.
    if !matches!(
        source.transaction.command,
        CommandKind::Send | CommandKind::Move
    ) {
        return Err(ProtocolError::InvalidSourceTransaction);
    }
    if source.transaction.outputs.get(record.index as usize) != Some(&record.yo) {
        return Err(ProtocolError::InvalidSourceTransaction);
    }
    Ok(record)
}
