//! In-memory test network
//!
//! Nodes exchange protocol messages over synchronous in-memory sessions:
//! a send is answered immediately by the peer's responder half, and the
//! reply waits in the session until received. Messages still round-trip
//! through the wire encoding so every exchange proves it serializes.
//!
//! Nodes record which peers they opened sessions to and how often they
//! invoked the notary-swap primitive; the short-circuit and all-or-nothing
//! properties of the protocols are asserted against these counters.

use crate::identity::TestIdentity;
use crate::ledger::{Ledger, StateKey};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use yo_core::{
    CommandKind, FinalizedTransaction, Participant, Party, PartyId, PayloadHash, RecordRef,
    SignedTransaction, Transaction, TxHash, Yo,
};
use yo_protocol::{
    AgreementResponder, ChangePolicy, ChangeResponder, FinalityEffects, IdentityEffects,
    NotaryEffects, ProtocolError, ProtocolMessage, ProtocolResult, Session, SessionEffects,
    SessionId, SignatureEffects, VaultEffects,
};

/// Builder for a [`TestNetwork`].
#[derive(Default)]
pub struct TestNetworkBuilder {
    parties: Vec<String>,
    notaries: Vec<String>,
}

impl TestNetworkBuilder {
    /// Add a party node.
    pub fn party(mut self, name: &str) -> Self {
        self.parties.push(name.to_string());
        self
    }

    /// Add several party nodes.
    pub fn parties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parties.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add a notary.
    pub fn notary(mut self, name: &str) -> Self {
        self.notaries.push(name.to_string());
        self
    }

    /// Add several notaries.
    pub fn notaries<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notaries.extend(names.into_iter().map(Into::into));
        self
    }

    /// Assemble the network. Every node starts out trusting every notary.
    pub fn build(self) -> TestNetwork {
        assert!(
            !self.notaries.is_empty(),
            "a test network needs at least one notary"
        );
        let notaries: Vec<Party> = self
            .notaries
            .iter()
            .map(|name| TestIdentity::new(name).party().clone())
            .collect();
        let state = Arc::new(NetworkState {
            nodes: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            notaries: notaries.clone(),
            ledger: Ledger::new(notaries.clone()),
        });
        for name in &self.parties {
            let identity = TestIdentity::new(name);
            let id = identity.party().id();
            let node = Arc::new(TestNode {
                identity,
                state: Arc::clone(&state),
                trusted: RwLock::new(notaries.iter().cloned().collect()),
                denied: RwLock::new(BTreeSet::new()),
                vault: Mutex::new(Vault::default()),
                opened: Mutex::new(Vec::new()),
                corrupt_echo: AtomicBool::new(false),
                swaps: AtomicUsize::new(0),
            });
            state.nodes.write().unwrap().insert(id, node);
            state.names.write().unwrap().insert(name.clone(), id);
        }
        TestNetwork { state }
    }
}

/// A network of in-memory nodes sharing one ledger.
pub struct TestNetwork {
    state: Arc<NetworkState>,
}

impl TestNetwork {
    /// Start building a network.
    pub fn builder() -> TestNetworkBuilder {
        TestNetworkBuilder::default()
    }

    /// The node registered under the given name.
    pub fn node(&self, name: &str) -> Arc<TestNode> {
        let id = *self
            .state
            .names
            .read()
            .unwrap()
            .get(name)
            .unwrap_or_else(|| panic!("no node named {name}"));
        self.state
            .nodes
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_else(|| panic!("no node named {name}"))
    }

    /// The notary registered under the given name.
    pub fn notary(&self, name: &str) -> Party {
        self.state
            .notaries
            .iter()
            .find(|notary| notary.name() == name)
            .cloned()
            .unwrap_or_else(|| panic!("no notary named {name}"))
    }

    /// The notary flows fall back to when none is named.
    pub fn default_notary(&self) -> Party {
        self.state
            .ledger
            .default_notary()
            .expect("network has no notaries")
    }

    /// Issue a finalized record directly through the ledger, bypassing the
    /// flows. Useful for seeding protocol-level tests.
    pub fn issue_record(&self, from: &str, to: &str, payload: &str, notary: &Party) -> RecordRef {
        let sender = self.node(from);
        let receiver = self.node(to);
        let mut tx = Transaction::builder(notary.clone())
            .command(CommandKind::Send)
            .output(Yo::new(
                sender.party(),
                receiver.party(),
                payload,
            ))
            .build()
            .expect("send transaction");
        let hash = tx.hash();
        tx.add_signature(sender.identity.sign(&hash));
        tx.add_signature(receiver.identity.sign(&hash));
        let finalized = self
            .state
            .ledger
            .commit(SignedTransaction::new(tx))
            .expect("issue record");
        self.state
            .deliver(&finalized, &[sender.party().id(), receiver.party().id()]);
        finalized.output_ref(0).expect("single output")
    }
}

struct NetworkState {
    nodes: RwLock<HashMap<PartyId, Arc<TestNode>>>,
    names: RwLock<HashMap<String, PartyId>>,
    notaries: Vec<Party>,
    ledger: Ledger,
}

impl NetworkState {
    fn deliver(&self, finalized: &FinalizedTransaction, recipients: &[PartyId]) {
        let nodes = self.nodes.read().unwrap();
        // Consumed inputs vanish from every vault that held them.
        for node in nodes.values() {
            node.remove_consumed(&finalized.transaction.inputs);
        }
        for id in recipients {
            if let Some(node) = nodes.get(id) {
                node.store(finalized);
            }
        }
    }

    fn replace_record(&self, old: &RecordRef, new: &RecordRef) {
        let nodes = self.nodes.read().unwrap();
        for node in nodes.values() {
            let mut vault = node.vault.lock().unwrap();
            if vault.live.remove(&(old.tx_hash, old.index)).is_some() {
                vault.live.insert((new.tx_hash, new.index), new.clone());
            }
        }
    }
}

#[derive(Default)]
struct Vault {
    transactions: HashMap<TxHash, FinalizedTransaction>,
    live: HashMap<StateKey, RecordRef>,
}

/// One party node: identity, vault, notary registry, and change policy.
pub struct TestNode {
    identity: TestIdentity,
    state: Arc<NetworkState>,
    trusted: RwLock<BTreeSet<Party>>,
    denied: RwLock<BTreeSet<PartyId>>,
    vault: Mutex<Vault>,
    opened: Mutex<Vec<PartyId>>,
    corrupt_echo: AtomicBool,
    swaps: AtomicUsize,
}

impl TestNode {
    /// The party this node acts as.
    pub fn party(&self) -> Party {
        self.identity.party().clone()
    }

    /// Replace this node's trusted-notary registry.
    pub fn set_trusted_notaries(&self, notaries: impl IntoIterator<Item = Party>) {
        *self.trusted.write().unwrap() = notaries.into_iter().collect();
    }

    /// Add a notary to this node's change-policy denylist.
    pub fn deny_notary(&self, notary: &Party) {
        self.denied.write().unwrap().insert(notary.id());
    }

    /// Make this node mangle the echo in its consent responses.
    pub fn set_corrupt_change_echo(&self, corrupt: bool) {
        self.corrupt_echo.store(corrupt, Ordering::Relaxed);
    }

    /// Peers this node opened sessions to, in order.
    pub fn opened_sessions(&self) -> Vec<PartyId> {
        self.opened.lock().unwrap().clone()
    }

    /// How often this node invoked the notary-swap primitive.
    pub fn swap_count(&self) -> usize {
        self.swaps.load(Ordering::Relaxed)
    }

    /// All live records in this node's vault.
    pub fn live_records(&self) -> Vec<RecordRef> {
        self.vault.lock().unwrap().live.values().cloned().collect()
    }

    fn change_policy(&self) -> ChangePolicy {
        let trusted: Vec<PartyId> = self
            .trusted
            .read()
            .unwrap()
            .iter()
            .map(|notary| notary.id())
            .collect();
        let mut policy = ChangePolicy::trusting(trusted);
        for denied in self.denied.read().unwrap().iter() {
            policy = policy.deny(*denied);
        }
        policy
    }

    fn remove_consumed(&self, inputs: &[RecordRef]) {
        let mut vault = self.vault.lock().unwrap();
        for input in inputs {
            vault.live.remove(&(input.tx_hash, input.index));
        }
    }

    fn store(&self, finalized: &FinalizedTransaction) {
        let mut vault = self.vault.lock().unwrap();
        vault.transactions.insert(finalized.hash, finalized.clone());
        for index in 0..finalized.transaction.outputs.len() as u32 {
            if let Some(record) = finalized.output_ref(index) {
                vault.live.insert((finalized.hash, index), record);
            }
        }
    }

    /// Answer one incoming request with this node's responder halves.
    async fn answer(
        node: &Arc<TestNode>,
        message: ProtocolMessage,
    ) -> ProtocolResult<ProtocolMessage> {
        match message {
            ProtocolMessage::NotaryProposal(proposal) => {
                let responder = AgreementResponder::new(Arc::clone(node));
                Ok(ProtocolMessage::NotaryReply(responder.answer(&proposal).await))
            }
            ProtocolMessage::ChangeRequest(request) => {
                let responder = ChangeResponder::new(node.change_policy());
                let mut response = responder.answer(request);
                if node.corrupt_echo.load(Ordering::Relaxed) {
                    // Mangle the echo so requesters can exercise tamper
                    // detection.
                    response.request.record.index = response.request.record.index.wrapping_add(1);
                }
                Ok(ProtocolMessage::ChangeResponse(response))
            }
            other => Err(ProtocolError::Transport(format!(
                "unexpected request: {other:?}"
            ))),
        }
    }
}

struct TestSession {
    id: SessionId,
    peer: Arc<TestNode>,
    pending: VecDeque<ProtocolMessage>,
}

#[async_trait]
impl Session for TestSession {
    fn id(&self) -> SessionId {
        self.id
    }

    async fn send(&mut self, message: ProtocolMessage) -> ProtocolResult<()> {
        // Round-trip through the wire encoding so every message that
        // crosses a session proves it serializes.
        let bytes =
            serde_json::to_vec(&message).map_err(|err| ProtocolError::Transport(err.to_string()))?;
        let delivered: ProtocolMessage = serde_json::from_slice(&bytes)
            .map_err(|err| ProtocolError::Transport(err.to_string()))?;
        let reply = TestNode::answer(&self.peer, delivered).await?;
        self.pending.push_back(reply);
        Ok(())
    }

    async fn receive(&mut self) -> ProtocolResult<ProtocolMessage> {
        self.pending
            .pop_front()
            .ok_or_else(|| ProtocolError::Transport("no reply pending on session".to_string()))
    }
}

#[async_trait]
impl SessionEffects for TestNode {
    async fn open(&self, party: &Party) -> ProtocolResult<Box<dyn Session>> {
        let peer = self
            .state
            .nodes
            .read()
            .unwrap()
            .get(&party.id())
            .cloned()
            .ok_or_else(|| ProtocolError::PeerUnreachable(party.id()))?;
        self.opened.lock().unwrap().push(party.id());
        Ok(Box::new(TestSession {
            id: SessionId::new(),
            peer,
            pending: VecDeque::new(),
        }))
    }
}

#[async_trait]
impl IdentityEffects for TestNode {
    fn local_identity(&self) -> Party {
        self.identity.party().clone()
    }

    async fn resolve(&self, participant: &Participant) -> ProtocolResult<Party> {
        let id = participant.id();
        self.state
            .nodes
            .read()
            .unwrap()
            .get(&id)
            .map(|node| node.identity.party().clone())
            .ok_or(ProtocolError::UnresolvableParty(id))
    }

    async fn holds_key_for(&self, id: &PartyId) -> bool {
        self.identity.party().id() == *id
    }
}

#[async_trait]
impl NotaryEffects for TestNode {
    async fn trusted_notaries(&self) -> BTreeSet<Party> {
        self.trusted.read().unwrap().clone()
    }

    async fn default_notary(&self) -> ProtocolResult<Party> {
        Ok(self
            .state
            .ledger
            .default_notary()
            .expect("network has no notaries"))
    }

    async fn swap_notary(
        &self,
        record: &RecordRef,
        new_notary: &Party,
    ) -> ProtocolResult<RecordRef> {
        self.swaps.fetch_add(1, Ordering::Relaxed);
        let swapped = self.state.ledger.swap(record, new_notary)?;
        self.state.replace_record(record, &swapped);
        Ok(swapped)
    }
}

#[async_trait]
impl SignatureEffects for TestNode {
    async fn sign(&self, mut transaction: Transaction) -> ProtocolResult<Transaction> {
        let hash = transaction.hash();
        transaction.add_signature(self.identity.sign(&hash));
        Ok(transaction)
    }

    async fn collect(
        &self,
        mut transaction: Transaction,
        signers: &[Party],
    ) -> ProtocolResult<SignedTransaction> {
        let hash = transaction.hash();
        for signer in signers {
            if transaction.is_signed_by(&signer.id()) {
                continue;
            }
            let node = self
                .state
                .nodes
                .read()
                .unwrap()
                .get(&signer.id())
                .cloned()
                .ok_or(ProtocolError::SignatureRefused(signer.id()))?;
            transaction.add_signature(node.identity.sign(&hash));
        }
        Ok(SignedTransaction::new(transaction))
    }
}

#[async_trait]
impl FinalityEffects for TestNode {
    async fn finalize(
        &self,
        transaction: SignedTransaction,
        recipients: &[Party],
    ) -> ProtocolResult<FinalizedTransaction> {
        let finalized = self.state.ledger.commit(transaction)?;
        let mut ids: Vec<PartyId> = recipients.iter().map(|party| party.id()).collect();
        ids.push(self.identity.party().id());
        self.state.deliver(&finalized, &ids);
        Ok(finalized)
    }
}

#[async_trait]
impl VaultEffects for TestNode {
    async fn transaction(&self, hash: &TxHash) -> Option<FinalizedTransaction> {
        self.vault.lock().unwrap().transactions.get(hash).cloned()
    }

    async fn live_by_payload(&self, hash: &PayloadHash) -> Vec<RecordRef> {
        self.vault
            .lock()
            .unwrap()
            .live
            .values()
            .filter(|record| record.yo.payload_hash() == *hash)
            .cloned()
            .collect()
    }
}
