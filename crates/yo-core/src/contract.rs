//! The pure state-transition contract
//!
//! [`verify`] decides whether a transaction is a legal transformation of
//! the records it touches. It is deterministic, side-effect free, and total
//! over well-typed input: every unmet rule maps to exactly one reason
//! string, returned verbatim.

use crate::errors::ValidationFailure;
use crate::transaction::{CommandKind, Transaction};

/// Check a transaction against the rules of its command.
pub fn verify(tx: &Transaction) -> Result<(), ValidationFailure> {
    match tx.command {
        CommandKind::Send => verify_send(tx),
        CommandKind::Move => verify_move(tx),
    }
}

fn require(condition: bool, reason: &str) -> Result<(), ValidationFailure> {
    if condition {
        Ok(())
    } else {
        Err(ValidationFailure::new(reason))
    }
}

fn verify_send(tx: &Transaction) -> Result<(), ValidationFailure> {
    require(tx.inputs.is_empty(), "no inputs allowed when sending")?;
    require(tx.outputs.len() == 1, "exactly one output required when sending")?;
    let yo = &tx.outputs[0];
    require(yo.target != yo.origin, "must not send to self")?;
    require(tx.is_signed_by(&yo.origin.id()), "missing origin signature")?;
    Ok(())
}

fn verify_move(tx: &Transaction) -> Result<(), ValidationFailure> {
    require(tx.inputs.len() == 1, "exactly one input required when moving")?;
    require(tx.outputs.len() == 1, "exactly one output required when moving")?;
    let input = &tx.inputs[0].yo;
    let output = &tx.outputs[0];
    require(
        input.payload == output.payload,
        "payload must not change when moving",
    )?;
    require(input.target != output.target, "move must change the target")?;
    require(output.target != output.origin, "must not move to self")?;
    // The current holder authorizes the move.
    require(
        tx.is_signed_by(&input.target.id()),
        "missing holder signature",
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::party::Party;
    use crate::record::{RecordRef, Yo};
    use crate::transaction::Signature;
    use ed25519_dalek::SigningKey;

    fn party(seed: u8, name: &str) -> Party {
        Party::new(name, SigningKey::from_bytes(&[seed; 32]).verifying_key())
    }

    fn alice() -> Party {
        party(1, "Alice")
    }

    fn bob() -> Party {
        party(2, "Bob")
    }

    fn carol() -> Party {
        party(3, "Carol")
    }

    fn notary() -> Party {
        party(10, "Notary")
    }

    // Presence is what the contract checks; signature bytes are the
    // ledger's concern.
    fn signed_by(mut tx: Transaction, party: &Party) -> Transaction {
        tx.add_signature(Signature {
            signer: party.id(),
            bytes: vec![0; 64],
        });
        tx
    }

    fn reference(yo: Yo) -> RecordRef {
        let produced = Transaction::builder(notary())
            .command(CommandKind::Send)
            .output(yo.clone())
            .build()
            .unwrap();
        RecordRef {
            yo,
            notary: notary(),
            tx_hash: produced.hash(),
            index: 0,
        }
    }

    fn valid_send() -> Transaction {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Send)
            .output(Yo::new(alice(), bob(), "Yo!"))
            .build()
            .unwrap();
        signed_by(tx, &alice())
    }

    fn valid_move() -> Transaction {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Move)
            .input(reference(Yo::new(alice(), bob(), "Yo!")))
            .output(Yo::new(bob(), carol(), "Yo!"))
            .build()
            .unwrap();
        signed_by(tx, &bob())
    }

    fn reason(result: Result<(), ValidationFailure>) -> String {
        result.unwrap_err().reason
    }

    #[test]
    fn well_formed_send_verifies() {
        assert_eq!(verify(&valid_send()), Ok(()));
    }

    #[test]
    fn send_rejects_inputs() {
        let mut tx = valid_send();
        tx.inputs.push(reference(Yo::new(carol(), alice(), "old")));
        assert_eq!(reason(verify(&tx)), "no inputs allowed when sending");
    }

    #[test]
    fn send_requires_exactly_one_output() {
        let mut tx = valid_send();
        tx.outputs.push(Yo::new(alice(), carol(), "Yo!"));
        assert_eq!(reason(verify(&tx)), "exactly one output required when sending");

        let mut empty = valid_send();
        empty.outputs.clear();
        assert_eq!(
            reason(verify(&empty)),
            "exactly one output required when sending"
        );
    }

    #[test]
    fn send_rejects_sending_to_self() {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Send)
            .output(Yo::new(alice(), alice(), "Yo!"))
            .build()
            .unwrap();
        let tx = signed_by(tx, &alice());
        assert_eq!(reason(verify(&tx)), "must not send to self");
    }

    #[test]
    fn send_requires_the_origin_signature() {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Send)
            .output(Yo::new(alice(), bob(), "Yo!"))
            .build()
            .unwrap();
        // A stranger's signature does not count.
        let tx = signed_by(tx, &carol());
        assert_eq!(reason(verify(&tx)), "missing origin signature");
    }

    #[test]
    fn well_formed_move_verifies() {
        assert_eq!(verify(&valid_move()), Ok(()));
    }

    #[test]
    fn move_requires_exactly_one_input() {
        let mut tx = valid_move();
        tx.inputs.clear();
        assert_eq!(reason(verify(&tx)), "exactly one input required when moving");
    }

    #[test]
    fn move_requires_exactly_one_output() {
        let mut tx = valid_move();
        tx.outputs.clear();
        assert_eq!(reason(verify(&tx)), "exactly one output required when moving");
    }

    #[test]
    fn move_keeps_the_payload() {
        let mut tx = valid_move();
        tx.outputs[0].payload = "What".to_string();
        assert_eq!(reason(verify(&tx)), "payload must not change when moving");
    }

    #[test]
    fn move_must_change_the_target() {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Move)
            .input(reference(Yo::new(alice(), bob(), "Yo!")))
            .output(Yo::new(alice(), bob(), "Yo!"))
            .build()
            .unwrap();
        let tx = signed_by(tx, &bob());
        assert_eq!(reason(verify(&tx)), "move must change the target");
    }

    #[test]
    fn move_rejects_moving_to_self() {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Move)
            .input(reference(Yo::new(alice(), bob(), "Yo!")))
            .output(Yo::new(carol(), carol(), "Yo!"))
            .build()
            .unwrap();
        let tx = signed_by(tx, &bob());
        assert_eq!(reason(verify(&tx)), "must not move to self");
    }

    #[test]
    fn move_requires_the_holder_signature() {
        let tx = Transaction::builder(notary())
            .command(CommandKind::Move)
            .input(reference(Yo::new(alice(), bob(), "Yo!")))
            .output(Yo::new(bob(), carol(), "Yo!"))
            .build()
            .unwrap();
        // Signed by the origin instead of the current holder.
        let tx = signed_by(tx, &alice());
        assert_eq!(reason(verify(&tx)), "missing holder signature");
    }

    #[test]
    fn verify_is_idempotent() {
        let good = valid_send();
        assert_eq!(verify(&good), verify(&good));

        let mut bad = valid_move();
        bad.outputs[0].payload = "tampered".to_string();
        assert_eq!(verify(&bad), verify(&bad));
    }
}
