//! `CollectionService`: wires the pure state machines to the injected
//! effect handlers and enforces phase, supply, and admin gating.
//!
//! The service is the single owner of all mutable protocol state
//! (handshake registry, phase controller, randomness engine, fund
//! distributor). Each public method runs to completion over `&mut self`,
//! so operations are serialized by the caller's total order and no
//! interleaving is observable mid-operation.

use crate::error::CollectionError;
use crate::phase::{Phase, PhaseController};
use crate::randomness::RandomnessEngine;
use facet_core::{
    AccessControlEffects, CollectionConfig, Digest32, EnvironmentEffects, HandshakeId,
    LedgerEffects, ParticipantId, PaymentEffects, RendererEffects, Secret, TokenArt, TokenId,
};
use facet_distributor::{DistributionPlan, DistributionReport, DistributorError, FundDistributor};
use facet_handshake::{EntropySalt, HandshakeRegistry};
use std::sync::Arc;
use tracing::info;

/// A fund commitment attached to a mint: the depositor's commitment digest
/// plus the deposited amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositAttachment {
    /// Commitment digest over the depositor's distribution secret.
    pub commitment: Digest32,
    /// Deposited amount.
    pub amount: u128,
}

/// Orchestrates one collection: phases, entropy, token seeds, funds.
pub struct CollectionService {
    config: CollectionConfig,
    ledger: Arc<dyn LedgerEffects>,
    renderer: Arc<dyn RendererEffects>,
    access: Arc<dyn AccessControlEffects>,
    payments: Arc<dyn PaymentEffects>,
    environment: Arc<dyn EnvironmentEffects>,
    phase: PhaseController,
    handshakes: HandshakeRegistry,
    collection_round: HandshakeId,
    engine: Option<RandomnessEngine>,
    distributor: FundDistributor,
    minted: u64,
    reveal_nonce: u64,
}

impl std::fmt::Debug for CollectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionService").finish_non_exhaustive()
    }
}

impl CollectionService {
    /// Validate `config`, open the collection entropy round, and start in
    /// `Closed`.
    pub fn new(
        config: CollectionConfig,
        ledger: Arc<dyn LedgerEffects>,
        renderer: Arc<dyn RendererEffects>,
        access: Arc<dyn AccessControlEffects>,
        payments: Arc<dyn PaymentEffects>,
        environment: Arc<dyn EnvironmentEffects>,
    ) -> Result<Self, CollectionError> {
        config.validate()?;
        let mut handshakes = HandshakeRegistry::new();
        let collection_round = HandshakeId::new();
        handshakes.create(collection_round, config.entropy_quorum)?;
        let distributor = FundDistributor::new(
            DistributionPlan::new(config.treasury),
            config.maturity_window_ms,
        );
        info!(name = %config.name, round = %collection_round, "collection service created");
        Ok(Self {
            config,
            ledger,
            renderer,
            access,
            payments,
            environment,
            phase: PhaseController::new(),
            handshakes,
            collection_round,
            engine: None,
            distributor,
            minted: 0,
            reveal_nonce: 0,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    /// Tokens minted so far.
    pub fn minted(&self) -> u64 {
        self.minted
    }

    /// Id of the collection entropy round.
    pub fn collection_round(&self) -> HandshakeId {
        self.collection_round
    }

    async fn require_admin(&self, caller: ParticipantId) -> Result<(), CollectionError> {
        if self.access.is_admin(caller).await? {
            Ok(())
        } else {
            Err(CollectionError::Unauthorized { caller })
        }
    }

    // ---- phase management ----

    /// Advance the phase one step (admin only). Entering Reveal constructs
    /// the randomness engine from the completed round entropy and a salt
    /// fixed at this moment.
    pub async fn advance_phase(&mut self, caller: ParticipantId) -> Result<Phase, CollectionError> {
        self.require_admin(caller).await?;
        let complete = self
            .handshakes
            .get(self.collection_round)
            .is_some_and(|round| round.is_complete());
        let phase = self.phase.advance(complete)?;
        if phase == Phase::Reveal {
            let entropy = self.handshakes.entropy_of(self.collection_round)?;
            let salt = self.environment.chain_salt().await?;
            self.engine = Some(RandomnessEngine::new(entropy, salt));
        }
        Ok(phase)
    }

    // ---- minting ----

    /// Mint a token to `to`, optionally attaching a fund commitment from
    /// the caller. Premint is admin-only; Public is open. The supply
    /// ceiling applies to both.
    pub async fn mint(
        &mut self,
        caller: ParticipantId,
        to: ParticipantId,
        deposit: Option<DepositAttachment>,
    ) -> Result<TokenId, CollectionError> {
        let phase = self.phase.phase();
        if !phase.allows_minting() {
            return Err(CollectionError::WrongPhase { phase });
        }
        if phase == Phase::Premint {
            self.require_admin(caller).await?;
        }
        if self.minted >= self.config.max_supply {
            return Err(CollectionError::SupplyExhausted {
                cap: self.config.max_supply,
            });
        }
        // The attachment is validated before the mint and recorded after it,
        // so a failing mint leaves the distributor untouched and a bad
        // attachment never strands a minted token. After these prechecks the
        // commit below cannot fail.
        let now_ms = if let Some(deposit) = deposit {
            if deposit.amount == 0 {
                return Err(DistributorError::EmptyDeposit.into());
            }
            if self
                .distributor
                .commitment_of(caller)
                .is_some_and(|entry| entry.is_revealed())
            {
                return Err(DistributorError::AlreadyRevealed { depositor: caller }.into());
            }
            Some(self.environment.now_ms().await?)
        } else {
            None
        };
        let token = self.ledger.mint(to).await?;
        self.minted += 1;
        if let (Some(deposit), Some(now_ms)) = (deposit, now_ms) {
            self.distributor
                .commit(caller, deposit.commitment, deposit.amount, now_ms)?;
        }
        info!(%token, owner = %to, minted = self.minted, "token minted");
        Ok(token)
    }

    // ---- entropy round ----

    /// Record an entropy commitment from `participant`.
    pub fn commit_entropy(
        &mut self,
        participant: ParticipantId,
        commitment: Digest32,
    ) -> Result<(), CollectionError> {
        self.handshakes
            .commit(self.collection_round, participant, commitment)?;
        Ok(())
    }

    /// Reveal an entropy secret. Returns the combined entropy when this
    /// reveal completes the round.
    pub async fn reveal_entropy(
        &mut self,
        participant: ParticipantId,
        secret: Secret,
    ) -> Result<Option<Digest32>, CollectionError> {
        let salt = EntropySalt {
            anchor: self.environment.chain_salt().await?,
            timestamp_ms: self.environment.now_ms().await?,
            nonce: self.reveal_nonce,
        };
        self.reveal_nonce += 1;
        let outcome = self
            .handshakes
            .reveal(self.collection_round, participant, secret, &salt)?;
        Ok(outcome)
    }

    /// Whether the entropy round is one reveal away from finalizing.
    pub fn is_handshake_ready(&self) -> Result<bool, CollectionError> {
        Ok(self.handshakes.is_ready(self.collection_round)?)
    }

    /// Entropy of the completed round.
    pub fn entropy_of(&self) -> Result<Digest32, CollectionError> {
        Ok(self.handshakes.entropy_of(self.collection_round)?)
    }

    // ---- token randomness ----

    /// Derive the seed for one token. Reveal phase only; the token must
    /// exist and must not already be seeded.
    pub async fn derive_token_seed(
        &mut self,
        token: TokenId,
    ) -> Result<Digest32, CollectionError> {
        let phase = self.phase.phase();
        let engine = self
            .engine
            .as_mut()
            .ok_or(CollectionError::WrongPhase { phase })?;
        if !self.ledger.exists(token).await? {
            return Err(CollectionError::UnknownToken { token });
        }
        engine.derive_token_seed(token)
    }

    /// Derive seeds for many tokens, silently skipping ids that do not
    /// exist or are already seeded. Not atomic: earlier derivations stand
    /// regardless of later ids. Returns the tokens actually seeded.
    pub async fn batch_derive(
        &mut self,
        tokens: &[TokenId],
    ) -> Result<Vec<TokenId>, CollectionError> {
        let phase = self.phase.phase();
        let engine = self
            .engine
            .as_mut()
            .ok_or(CollectionError::WrongPhase { phase })?;
        let mut derived = Vec::new();
        for &token in tokens {
            if engine.has_seed(token) || !self.ledger.exists(token).await? {
                continue;
            }
            engine.derive_token_seed(token)?;
            derived.push(token);
        }
        Ok(derived)
    }

    /// Sample an integer in `[min, max]` from a token's seed.
    pub fn get_random_in_range(
        &self,
        token: TokenId,
        min: u64,
        max: u64,
    ) -> Result<u64, CollectionError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or(CollectionError::SeedNotReady { token })?;
        engine.sample_range(token, min, max)
    }

    // ---- fund distribution ----

    /// Accumulate a standalone deposit (outside of a mint).
    pub async fn commit_funds(
        &mut self,
        depositor: ParticipantId,
        commitment: Digest32,
        amount: u128,
    ) -> Result<(), CollectionError> {
        let now_ms = self.environment.now_ms().await?;
        self.distributor
            .commit(depositor, commitment, amount, now_ms)?;
        Ok(())
    }

    /// Reveal a distribution secret and distribute the accumulated amount.
    pub async fn reveal_funds(
        &mut self,
        depositor: ParticipantId,
        secret: Secret,
    ) -> Result<DistributionReport, CollectionError> {
        let now_ms = self.environment.now_ms().await?;
        let report = self
            .distributor
            .reveal(depositor, secret, now_ms, self.payments.as_ref())
            .await?;
        Ok(report)
    }

    /// Admin emergency path for matured, unrevealed deposits.
    pub async fn force_distribute(
        &mut self,
        caller: ParticipantId,
        depositor: ParticipantId,
        default_seed: Secret,
    ) -> Result<DistributionReport, CollectionError> {
        self.require_admin(caller).await?;
        let now_ms = self.environment.now_ms().await?;
        let report = self
            .distributor
            .force_distribute(depositor, default_seed, now_ms, self.payments.as_ref())
            .await?;
        Ok(report)
    }

    /// Add a distribution recipient (admin only).
    pub async fn add_fund_distribution(
        &mut self,
        caller: ParticipantId,
        recipient: ParticipantId,
        percentage_bp: u16,
        fixed: bool,
    ) -> Result<(), CollectionError> {
        self.require_admin(caller).await?;
        self.distributor
            .plan_mut()
            .add_entry(recipient, percentage_bp, fixed)?;
        Ok(())
    }

    /// Update a distribution entry in place (admin only).
    pub async fn update_fund_distribution(
        &mut self,
        caller: ParticipantId,
        index: usize,
        percentage_bp: u16,
        fixed: bool,
    ) -> Result<(), CollectionError> {
        self.require_admin(caller).await?;
        self.distributor
            .plan_mut()
            .update_entry(index, percentage_bp, fixed)?;
        Ok(())
    }

    /// Redirect distribution residues to a new treasury (admin only).
    pub async fn update_treasury_address(
        &mut self,
        caller: ParticipantId,
        treasury: ParticipantId,
    ) -> Result<(), CollectionError> {
        self.require_admin(caller).await?;
        self.distributor.plan_mut().set_treasury(treasury);
        info!(%treasury, "treasury address updated");
        Ok(())
    }

    /// Number of distribution entries.
    pub fn get_fund_distributions_count(&self) -> usize {
        self.distributor.plan().len()
    }

    /// Current owner of an existing token, per the ledger.
    pub async fn token_owner(&self, token: TokenId) -> Result<ParticipantId, CollectionError> {
        if !self.ledger.exists(token).await? {
            return Err(CollectionError::UnknownToken { token });
        }
        Ok(self.ledger.owner_of(token).await?)
    }

    // ---- rendering ----

    /// Render image and attributes for an existing token.
    pub async fn token_metadata(&self, token: TokenId) -> Result<TokenArt, CollectionError> {
        if !self.ledger.exists(token).await? {
            return Err(CollectionError::UnknownToken { token });
        }
        Ok(self.renderer.render(token).await?)
    }

    /// Hot-swap the renderer (admin only).
    pub async fn set_renderer(
        &mut self,
        caller: ParticipantId,
        renderer: Arc<dyn RendererEffects>,
    ) -> Result<(), CollectionError> {
        self.require_admin(caller).await?;
        self.renderer = renderer;
        info!("renderer replaced");
        Ok(())
    }
}
