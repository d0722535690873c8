//! Repointing coordinator tests
//!
//! The consent phase must be all-or-nothing across the whole batch - a
//! single rejection, corruption, or unresolvable participant leaves the
//! swap primitive uninvoked - while the execute phase is independent per
//! record.

#![allow(clippy::unwrap_used)]

use assert_matches::assert_matches;
use std::collections::BTreeSet;
use yo_core::{CommandKind, Party, RecordRef, Transaction, Yo};
use yo_protocol::{ProtocolError, RepointingCoordinator};
use yo_testkit::{TestIdentity, TestNetwork};

fn two_notary_network() -> TestNetwork {
    TestNetwork::builder()
        .notaries(["NotaryA", "NotaryB"])
        .parties(["Alice", "Bob", "Carol"])
        .build()
}

#[tokio::test]
async fn consent_from_every_participant_repoints_the_record() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let record = network.issue_record("Alice", "Bob", "Yo!", &na);

    let bob = network.node("Bob");
    let coordinator = RepointingCoordinator::new(bob.clone());
    let repointed = coordinator
        .repoint_records(std::slice::from_ref(&record), &nb)
        .await
        .unwrap();

    assert_eq!(repointed.len(), 1);
    assert_eq!(repointed[0].notary, nb);
    assert_eq!(repointed[0].yo, record.yo);
    assert_eq!(bob.swap_count(), 1);

    // Both vaults now hold the repointed record instead of the original.
    for name in ["Alice", "Bob"] {
        let live = network.node(name).live_records();
        assert!(live.contains(&repointed[0]));
        assert!(!live.contains(&record));
    }
}

#[tokio::test]
async fn one_rejection_means_nothing_is_swapped() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let first = network.issue_record("Alice", "Bob", "one", &na);
    let second = network.issue_record("Carol", "Bob", "two", &na);
    // Alice vetoes the replacement notary; the whole batch must abort even
    // though Carol and Bob would have accepted.
    network.node("Alice").deny_notary(&nb);

    let bob = network.node("Bob");
    let coordinator = RepointingCoordinator::new(bob.clone());
    let err = coordinator
        .repoint_records(&[second.clone(), first.clone()], &nb)
        .await
        .unwrap_err();

    assert_matches!(err, ProtocolError::ChangeDenied);
    assert_eq!(bob.swap_count(), 0);
    let live = bob.live_records();
    assert!(live.contains(&first));
    assert!(live.contains(&second));
}

#[tokio::test]
async fn a_corrupted_echo_is_a_defect_not_a_rejection() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let record = network.issue_record("Alice", "Bob", "Yo!", &na);
    network.node("Alice").set_corrupt_change_echo(true);

    let bob = network.node("Bob");
    let coordinator = RepointingCoordinator::new(bob.clone());
    let err = coordinator
        .repoint_records(std::slice::from_ref(&record), &nb)
        .await
        .unwrap_err();

    assert_matches!(err, ProtocolError::CorruptedResponse);
    assert_eq!(bob.swap_count(), 0);
}

#[tokio::test]
async fn an_unresolvable_participant_aborts_the_consent_phase() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let bob = network.node("Bob");

    // A record naming a party the network has no identity mapping for.
    let stranger = TestIdentity::new("Mallory");
    let yo = Yo::new(stranger.party().clone(), bob.party(), "Yo!");
    let produced = Transaction::builder(na)
        .command(CommandKind::Send)
        .output(yo.clone())
        .build()
        .unwrap();
    let record = RecordRef {
        yo,
        notary: produced.notary.clone(),
        tx_hash: produced.hash(),
        index: 0,
    };

    let coordinator = RepointingCoordinator::new(bob.clone());
    let err = coordinator
        .repoint_records(std::slice::from_ref(&record), &nb)
        .await
        .unwrap_err();

    assert_matches!(err, ProtocolError::UnresolvableParty(id) if id == stranger.party().id());
    assert_eq!(bob.swap_count(), 0);
}

#[tokio::test]
async fn the_current_notary_can_still_refuse_the_swap() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let record = network.issue_record("Alice", "Bob", "Yo!", &na);

    // Every participant consents to the fake notary, but the ledger layer
    // refuses to replace state with a notary it does not know.
    let fake = TestIdentity::new("FakeNotary").party().clone();
    let trusted = [na, network.notary("NotaryB"), fake.clone()];
    network.node("Alice").set_trusted_notaries(trusted.clone());
    network.node("Bob").set_trusted_notaries(trusted);

    let bob = network.node("Bob");
    let coordinator = RepointingCoordinator::new(bob.clone());
    let err = coordinator
        .repoint_records(std::slice::from_ref(&record), &fake)
        .await
        .unwrap_err();

    assert_matches!(err, ProtocolError::StateReplacement { .. });
    assert_eq!(bob.swap_count(), 1);
}

#[tokio::test]
async fn draft_repointing_skips_records_without_a_local_stake() {
    let network = TestNetwork::builder()
        .notaries(["NotaryA", "NotaryB"])
        .parties(["Alice", "Bob", "Carol", "Dan"])
        .build();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let mine = network.issue_record("Alice", "Bob", "one", &na);
    let theirs = network.issue_record("Alice", "Carol", "two", &na);

    let bob = network.node("Bob");
    let draft = Transaction::builder(nb.clone())
        .command(CommandKind::Move)
        .input(mine.clone())
        .input(theirs.clone())
        .output(Yo::new(bob.party(), network.node("Dan").party(), "one"))
        .build()
        .unwrap();

    let coordinator = RepointingCoordinator::new(bob.clone());
    let repointed = coordinator.repoint_draft(&draft, &nb).await.unwrap();

    // Only the record Bob holds a key for was repointed.
    assert_eq!(repointed.len(), 1);
    assert_eq!(repointed[0].yo, mine.yo);
    assert_eq!(repointed[0].notary, nb);
    assert_eq!(bob.swap_count(), 1);
    assert!(network.node("Carol").live_records().contains(&theirs));
}

#[tokio::test]
async fn negotiated_draft_repointing_uses_the_agreed_notary() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let record = network.issue_record("Alice", "Bob", "Yo!", &na);
    // Alice only accepts NotaryB, so the agreement narrows to it.
    network.node("Alice").set_trusted_notaries([nb.clone()]);

    let bob = network.node("Bob");
    let draft = Transaction::builder(nb.clone())
        .command(CommandKind::Move)
        .input(record.clone())
        .build()
        .unwrap();

    let coordinator = RepointingCoordinator::new(bob.clone());
    let proposed: BTreeSet<Party> = [na, nb.clone()].into_iter().collect();
    let repointed = coordinator
        .negotiate_and_repoint_draft(&draft, &proposed)
        .await
        .unwrap();

    assert_eq!(repointed.len(), 1);
    assert_eq!(repointed[0].notary, nb);
}

#[tokio::test]
async fn no_agreeable_notary_means_no_consent_round_and_no_swap() {
    let network = two_notary_network();
    let na = network.notary("NotaryA");
    let nb = network.notary("NotaryB");
    let record = network.issue_record("Alice", "Bob", "Yo!", &na);
    network
        .node("Alice")
        .set_trusted_notaries(std::iter::empty());

    let bob = network.node("Bob");
    let draft = Transaction::builder(nb.clone())
        .command(CommandKind::Move)
        .input(record)
        .build()
        .unwrap();

    let coordinator = RepointingCoordinator::new(bob.clone());
    let proposed: BTreeSet<Party> = [na, nb].into_iter().collect();
    let err = coordinator
        .negotiate_and_repoint_draft(&draft, &proposed)
        .await
        .unwrap_err();

    assert_matches!(err, ProtocolError::NoAgreeableNotary);
    assert_eq!(bob.swap_count(), 0);
}
