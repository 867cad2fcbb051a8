//! In-memory effect handlers.

use async_trait::async_trait;
use facet_core::{
    AccessControlEffects, EffectError, EnvironmentEffects, LedgerEffects, ParticipantId,
    PaymentEffects, RendererEffects, TokenArt, TokenId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Token ledger backed by a hash map. Ids are assigned sequentially from 1.
/// Minting can be told to refuse, for failure-path tests.
#[derive(Debug)]
pub struct MemoryLedger {
    owners: Mutex<HashMap<TokenId, ParticipantId>>,
    next_id: AtomicU64,
    refusing_mints: AtomicBool,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            owners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            refusing_mints: AtomicBool::new(false),
        }
    }

    /// Refuse all future mints.
    pub fn refuse_mints(&self) {
        self.refusing_mints.store(true, Ordering::SeqCst);
    }

    /// Accept mints again.
    pub fn accept_mints(&self) {
        self.refusing_mints.store(false, Ordering::SeqCst);
    }

    /// Number of minted tokens.
    pub fn minted(&self) -> usize {
        self.owners.lock().expect("ledger lock").len()
    }
}

#[async_trait]
impl LedgerEffects for MemoryLedger {
    async fn mint(&self, owner: ParticipantId) -> Result<TokenId, EffectError> {
        if self.refusing_mints.load(Ordering::SeqCst) {
            return Err(EffectError::ledger("mint refused"));
        }
        let id = TokenId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.owners.lock().expect("ledger lock").insert(id, owner);
        Ok(id)
    }

    async fn exists(&self, id: TokenId) -> Result<bool, EffectError> {
        Ok(self.owners.lock().expect("ledger lock").contains_key(&id))
    }

    async fn owner_of(&self, id: TokenId) -> Result<ParticipantId, EffectError> {
        self.owners
            .lock()
            .expect("ledger lock")
            .get(&id)
            .copied()
            .ok_or_else(|| EffectError::ledger(format!("{id} does not exist")))
    }

    async fn transfer(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        id: TokenId,
    ) -> Result<(), EffectError> {
        let mut owners = self.owners.lock().expect("ledger lock");
        match owners.get(&id) {
            Some(owner) if *owner == from => {
                owners.insert(id, to);
                Ok(())
            }
            Some(_) => Err(EffectError::ledger(format!("{from} does not own {id}"))),
            None => Err(EffectError::ledger(format!("{id} does not exist"))),
        }
    }
}

/// Payment rail that records every successful leg and can be told to refuse
/// specific recipients.
#[derive(Debug, Default)]
pub struct RecordingPayments {
    ledger: Mutex<Vec<(ParticipantId, u128)>>,
    refusing: Mutex<HashSet<ParticipantId>>,
}

impl RecordingPayments {
    /// Create a payment rail that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse all future payments to `recipient`.
    pub fn refuse(&self, recipient: ParticipantId) {
        self.refusing.lock().expect("refusal lock").insert(recipient);
    }

    /// Accept payments to `recipient` again.
    pub fn accept(&self, recipient: ParticipantId) {
        self.refusing.lock().expect("refusal lock").remove(&recipient);
    }

    /// Every successful payment, in execution order.
    pub fn payments(&self) -> Vec<(ParticipantId, u128)> {
        self.ledger.lock().expect("payment lock").clone()
    }

    /// Sum of all successful payments.
    pub fn total_paid(&self) -> u128 {
        self.payments().iter().map(|(_, amount)| amount).sum()
    }

    /// Sum paid to one recipient.
    pub fn paid_to(&self, recipient: ParticipantId) -> u128 {
        self.payments()
            .iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, amount)| amount)
            .sum()
    }
}

#[async_trait]
impl PaymentEffects for RecordingPayments {
    async fn pay(&self, recipient: ParticipantId, amount: u128) -> Result<(), EffectError> {
        if self.refusing.lock().expect("refusal lock").contains(&recipient) {
            return Err(EffectError::payment(format!("{recipient} refused payment")));
        }
        self.ledger
            .lock()
            .expect("payment lock")
            .push((recipient, amount));
        Ok(())
    }
}

/// Access control with a static admin set.
#[derive(Debug, Default)]
pub struct StaticAccessControl {
    admins: HashSet<ParticipantId>,
}

impl StaticAccessControl {
    /// Create with the given admins.
    pub fn with_admins(admins: impl IntoIterator<Item = ParticipantId>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl AccessControlEffects for StaticAccessControl {
    async fn is_admin(&self, caller: ParticipantId) -> Result<bool, EffectError> {
        Ok(self.admins.contains(&caller))
    }
}

/// Renderer producing a placeholder SVG and a one-attribute JSON document.
#[derive(Debug, Default)]
pub struct StubRenderer;

#[async_trait]
impl RendererEffects for StubRenderer {
    async fn render(&self, id: TokenId) -> Result<TokenArt, EffectError> {
        let image = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>{id}</text></svg>"
        )
        .into_bytes();
        let attributes_json =
            serde_json::json!([{ "trait_type": "id", "value": id.value() }]).to_string();
        Ok(TokenArt {
            image,
            attributes_json,
        })
    }
}

/// Deterministic environment with a manually advanced clock and fixed salt.
#[derive(Debug)]
pub struct ManualEnvironment {
    now_ms: AtomicU64,
    salt: [u8; 32],
}

impl ManualEnvironment {
    /// Start the clock at `now_ms` with a fixed salt.
    pub fn new(now_ms: u64, salt: [u8; 32]) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
            salt,
        }
    }

    /// Advance the clock.
    pub fn advance_ms(&self, delta: u64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Default for ManualEnvironment {
    fn default() -> Self {
        Self::new(1_700_000_000_000, [0x5a; 32])
    }
}

#[async_trait]
impl EnvironmentEffects for ManualEnvironment {
    async fn now_ms(&self) -> Result<u64, EffectError> {
        Ok(self.now_ms.load(Ordering::SeqCst))
    }

    async fn chain_salt(&self) -> Result<[u8; 32], EffectError> {
        Ok(self.salt)
    }
}
