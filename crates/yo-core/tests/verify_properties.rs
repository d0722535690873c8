//! Property tests for the transition contract
//!
//! `verify` is a pure predicate: it must be deterministic, total over
//! well-typed transactions, and every `Ok` must actually satisfy the
//! command's invariants.

#![allow(clippy::unwrap_used)]

use ed25519_dalek::SigningKey;
use proptest::prelude::*;
use yo_core::{verify, CommandKind, Party, RecordRef, Signature, Transaction, TxHash, Yo};

fn party(seed: u8) -> Party {
    let names = ["Alice", "Bob", "Carol", "Dan"];
    Party::new(
        names[seed as usize % names.len()],
        SigningKey::from_bytes(&[seed; 32]).verifying_key(),
    )
}

prop_compose! {
    fn arb_yo()(
        origin in 0u8..4,
        target in 0u8..4,
        payload in prop::sample::select(vec!["", "Yo!", "What", "ping"]),
    ) -> Yo {
        Yo::new(party(origin), party(target), payload)
    }
}

prop_compose! {
    fn arb_record_ref()(yo in arb_yo(), notary in 8u8..10, hash in any::<[u8; 32]>(), index in 0u32..3) -> RecordRef {
        RecordRef { yo, notary: party(notary), tx_hash: TxHash::from_bytes(hash), index }
    }
}

prop_compose! {
    fn arb_transaction()(
        inputs in prop::collection::vec(arb_record_ref(), 0..3),
        outputs in prop::collection::vec(arb_yo(), 0..3),
        command in prop::sample::select(vec![CommandKind::Send, CommandKind::Move]),
        notary in 8u8..10,
        signers in prop::collection::btree_set(0u8..4, 0..3),
    ) -> Transaction {
        let mut tx = Transaction {
            inputs,
            outputs,
            command,
            notary: party(notary),
            signatures: Vec::new(),
        };
        for signer in signers {
            tx.add_signature(Signature { signer: party(signer).id(), bytes: vec![0; 64] });
        }
        tx
    }
}

proptest! {
    #[test]
    fn verify_is_deterministic(tx in arb_transaction()) {
        prop_assert_eq!(verify(&tx), verify(&tx));
    }

    #[test]
    fn accepted_sends_satisfy_the_send_rules(tx in arb_transaction()) {
        if tx.command == CommandKind::Send && verify(&tx).is_ok() {
            prop_assert!(tx.inputs.is_empty());
            prop_assert_eq!(tx.outputs.len(), 1);
            let yo = &tx.outputs[0];
            prop_assert_ne!(&yo.origin, &yo.target);
            prop_assert!(tx.is_signed_by(&yo.origin.id()));
        }
    }

    #[test]
    fn accepted_moves_satisfy_the_move_rules(tx in arb_transaction()) {
        if tx.command == CommandKind::Move && verify(&tx).is_ok() {
            prop_assert_eq!(tx.inputs.len(), 1);
            prop_assert_eq!(tx.outputs.len(), 1);
            let input = &tx.inputs[0].yo;
            let output = &tx.outputs[0];
            prop_assert_eq!(&input.payload, &output.payload);
            prop_assert_ne!(&input.target, &output.target);
            prop_assert_ne!(&output.origin, &output.target);
            prop_assert!(tx.is_signed_by(&input.target.id()));
        }
    }

    #[test]
    fn no_accepted_output_is_self_addressed(tx in arb_transaction()) {
        if verify(&tx).is_ok() {
            for yo in &tx.outputs {
                prop_assert_ne!(&yo.origin, &yo.target);
            }
        }
    }
}
