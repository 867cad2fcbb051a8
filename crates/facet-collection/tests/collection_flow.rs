//! Full lifecycle tests for the collection service.

use assert_matches::assert_matches;
use facet_collection::{CollectionError, CollectionService, DepositAttachment, Phase};
use facet_core::hash::commitment_digest;
use facet_core::{CollectionConfig, TokenId};
use facet_distributor::DistributorError;
use facet_handshake::HandshakeError;
use facet_testkit::{
    commitment_for, participant, secret, ManualEnvironment, MemoryLedger, RecordingPayments,
    StaticAccessControl, StubRenderer,
};
use std::sync::Arc;

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

struct Harness {
    service: CollectionService,
    ledger: Arc<MemoryLedger>,
    payments: Arc<RecordingPayments>,
    environment: Arc<ManualEnvironment>,
}

fn admin() -> facet_core::ParticipantId {
    participant(0xad)
}

fn harness(config: CollectionConfig) -> Harness {
    let ledger = Arc::new(MemoryLedger::new());
    let payments = Arc::new(RecordingPayments::new());
    let environment = Arc::new(ManualEnvironment::default());
    let service = CollectionService::new(
        config,
        ledger.clone(),
        Arc::new(StubRenderer),
        Arc::new(StaticAccessControl::with_admins([admin()])),
        payments.clone(),
        environment.clone(),
    )
    .expect("valid config");
    Harness {
        service,
        ledger,
        payments,
        environment,
    }
}

fn default_harness() -> Harness {
    harness(CollectionConfig::new("glyphs", 100, 3, participant(0xfe)))
}

/// Run the quorum-3 entropy round to completion with participants 1..=3.
async fn complete_entropy_round(service: &mut CollectionService) {
    for seed in 1u8..=3 {
        let p = participant(seed);
        service
            .commit_entropy(p, commitment_for(seed, p))
            .expect("commit entropy");
    }
    for seed in 1u8..=3 {
        service
            .reveal_entropy(participant(seed), secret(seed))
            .await
            .expect("reveal entropy");
    }
}

#[tokio::test]
async fn phases_gate_minting_and_reveal() {
    let mut h = default_harness();
    let minter = participant(1);

    // Closed: nobody mints.
    assert_matches!(
        h.service.mint(minter, minter, None).await,
        Err(CollectionError::WrongPhase { phase: Phase::Closed })
    );

    // Premint: admin only.
    h.service.advance_phase(admin()).await.expect("to premint");
    assert_matches!(
        h.service.mint(minter, minter, None).await,
        Err(CollectionError::Unauthorized { .. })
    );
    h.service.mint(admin(), minter, None).await.expect("admin premint");

    // Public: open.
    h.service.advance_phase(admin()).await.expect("to public");
    h.service.mint(minter, minter, None).await.expect("public mint");
    assert_eq!(h.service.minted(), 2);

    // Reveal is unreachable while the entropy round is incomplete.
    assert_matches!(
        h.service.advance_phase(admin()).await,
        Err(CollectionError::HandshakeIncomplete)
    );
    complete_entropy_round(&mut h.service).await;
    assert_eq!(
        h.service.advance_phase(admin()).await.expect("to reveal"),
        Phase::Reveal
    );

    // No minting after Reveal, no advancing past it.
    assert_matches!(
        h.service.mint(minter, minter, None).await,
        Err(CollectionError::WrongPhase { phase: Phase::Reveal })
    );
    assert_matches!(
        h.service.advance_phase(admin()).await,
        Err(CollectionError::WrongPhase { phase: Phase::Reveal })
    );
}

#[tokio::test]
async fn advance_phase_requires_admin() {
    let mut h = default_harness();
    assert_matches!(
        h.service.advance_phase(participant(1)).await,
        Err(CollectionError::Unauthorized { .. })
    );
    assert_eq!(h.service.phase(), Phase::Closed);
}

#[tokio::test]
async fn supply_ceiling_is_enforced() {
    let mut h = harness(CollectionConfig::new("tiny", 2, 1, participant(0xfe)));
    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");

    let minter = participant(1);
    h.service.mint(minter, minter, None).await.expect("first");
    h.service.mint(minter, minter, None).await.expect("second");
    assert_matches!(
        h.service.mint(minter, minter, None).await,
        Err(CollectionError::SupplyExhausted { cap: 2 })
    );
}

#[tokio::test]
async fn entropy_round_readiness_and_idempotent_entropy() {
    let mut h = default_harness();
    for seed in 1u8..=3 {
        let p = participant(seed);
        h.service.commit_entropy(p, commitment_for(seed, p)).expect("commit");
    }
    assert!(!h.service.is_handshake_ready().expect("ready"));

    // Reveal in order B, A, C.
    h.service.reveal_entropy(participant(2), secret(2)).await.expect("B");
    assert!(!h.service.is_handshake_ready().expect("ready"));
    h.service.reveal_entropy(participant(1), secret(1)).await.expect("A");
    assert!(h.service.is_handshake_ready().expect("ready"));
    assert_matches!(
        h.service.entropy_of(),
        Err(CollectionError::Handshake(HandshakeError::NotComplete { .. }))
    );

    let entropy = h
        .service
        .reveal_entropy(participant(3), secret(3))
        .await
        .expect("C")
        .expect("completing reveal");
    assert_eq!(h.service.entropy_of().expect("entropy"), entropy);
    assert_eq!(h.service.entropy_of().expect("entropy"), entropy);
    assert!(!h.service.is_handshake_ready().expect("ready"));
}

#[tokio::test]
async fn token_seeds_only_in_reveal_and_set_once() {
    let mut h = default_harness();
    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");
    let minter = participant(7);
    let token = h.service.mint(minter, minter, None).await.expect("mint");

    assert_matches!(
        h.service.derive_token_seed(token).await,
        Err(CollectionError::WrongPhase { phase: Phase::Public })
    );
    assert_matches!(
        h.service.get_random_in_range(token, 0, 10),
        Err(CollectionError::SeedNotReady { .. })
    );

    complete_entropy_round(&mut h.service).await;
    h.service.advance_phase(admin()).await.expect("to reveal");

    h.service.derive_token_seed(token).await.expect("derive");
    assert_matches!(
        h.service.derive_token_seed(token).await,
        Err(CollectionError::AlreadyGenerated { .. })
    );
    assert_matches!(
        h.service.derive_token_seed(TokenId(999)).await,
        Err(CollectionError::UnknownToken { token: TokenId(999) })
    );

    // Sampling stays in range and is deterministic for a fixed seed.
    for (min, max) in [(0u64, 0u64), (0, 9), (10, 11), (5, u64::MAX)] {
        let sample = h.service.get_random_in_range(token, min, max).expect("sample");
        assert!(sample >= min && sample <= max);
        assert_eq!(
            h.service.get_random_in_range(token, min, max).expect("sample"),
            sample
        );
    }
}

#[tokio::test]
async fn batch_derive_skips_and_continues() {
    let mut h = default_harness();
    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");
    let minter = participant(7);
    let first = h.service.mint(minter, minter, None).await.expect("mint");
    let second = h.service.mint(minter, minter, None).await.expect("mint");

    complete_entropy_round(&mut h.service).await;
    h.service.advance_phase(admin()).await.expect("to reveal");
    h.service.derive_token_seed(first).await.expect("pre-seed first");

    // Already-seeded and nonexistent ids are skipped, later ids still run.
    let derived = h
        .service
        .batch_derive(&[first, TokenId(999), second])
        .await
        .expect("batch");
    assert_eq!(derived, vec![second]);
}

#[tokio::test]
async fn mint_with_deposit_feeds_the_distributor() {
    let mut h = default_harness();
    h.service
        .add_fund_distribution(admin(), participant(0x51), 2500, true)
        .await
        .expect("fixed recipient");
    h.service
        .add_fund_distribution(admin(), participant(0x52), 5000, false)
        .await
        .expect("random recipient");
    assert_eq!(h.service.get_fund_distributions_count(), 2);

    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");

    let depositor = participant(9);
    let attachment = DepositAttachment {
        commitment: commitment_digest(&secret(9), &depositor),
        amount: 100,
    };
    h.service
        .mint(depositor, depositor, Some(attachment))
        .await
        .expect("mint with deposit");

    let report = h
        .service
        .reveal_funds(depositor, secret(9))
        .await
        .expect("reveal distributes");
    assert_eq!(report.total, 100);
    assert_eq!(h.payments.paid_to(participant(0x51)), 25);
    let random_paid = h.payments.paid_to(participant(0x52));
    assert!(random_paid <= 75);
    assert_eq!(h.payments.paid_to(participant(0xfe)), 75 - random_paid);
    assert_eq!(h.payments.total_paid(), 100);
}

#[tokio::test]
async fn failed_mint_leaves_the_deposit_unrecorded() {
    let mut h = default_harness();
    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");

    let depositor = participant(9);
    let attachment = DepositAttachment {
        commitment: commitment_digest(&secret(9), &depositor),
        amount: 100,
    };

    h.ledger.refuse_mints();
    assert_matches!(
        h.service.mint(depositor, depositor, Some(attachment)).await,
        Err(CollectionError::Effect(_))
    );
    assert_eq!(h.service.minted(), 0);

    // Nothing was committed to the distributor by the failed mint.
    assert_matches!(
        h.service.reveal_funds(depositor, secret(9)).await,
        Err(CollectionError::Distributor(DistributorError::NoCommitment { .. }))
    );
    assert_eq!(h.payments.total_paid(), 0);

    // The same attachment goes through once the ledger recovers.
    h.ledger.accept_mints();
    h.service
        .mint(depositor, depositor, Some(attachment))
        .await
        .expect("mint after recovery");
    let report = h
        .service
        .reveal_funds(depositor, secret(9))
        .await
        .expect("reveal distributes");
    assert_eq!(report.total, 100);
}

#[tokio::test]
async fn bad_deposit_attachment_rejected_before_minting() {
    let mut h = default_harness();
    h.service.advance_phase(admin()).await.expect("to premint");
    h.service.advance_phase(admin()).await.expect("to public");

    let depositor = participant(9);
    let empty = DepositAttachment {
        commitment: commitment_digest(&secret(9), &depositor),
        amount: 0,
    };
    assert_matches!(
        h.service.mint(depositor, depositor, Some(empty)).await,
        Err(CollectionError::Distributor(DistributorError::EmptyDeposit))
    );
    assert_eq!(h.service.minted(), 0);

    // A depositor who already revealed cannot attach another deposit, and
    // the refused mint issues no token.
    let attachment = DepositAttachment {
        commitment: commitment_digest(&secret(9), &depositor),
        amount: 100,
    };
    h.service
        .mint(depositor, depositor, Some(attachment))
        .await
        .expect("mint with deposit");
    h.service
        .reveal_funds(depositor, secret(9))
        .await
        .expect("reveal distributes");
    assert_matches!(
        h.service.mint(depositor, depositor, Some(attachment)).await,
        Err(CollectionError::Distributor(DistributorError::AlreadyRevealed { .. }))
    );
    assert_eq!(h.service.minted(), 1);
}

#[tokio::test]
async fn force_distribute_is_admin_only_and_time_locked() {
    let mut h = default_harness();
    let depositor = participant(9);
    h.service
        .commit_funds(depositor, commitment_digest(&secret(9), &depositor), 50)
        .await
        .expect("deposit");

    assert_matches!(
        h.service.force_distribute(participant(1), depositor, secret(0)).await,
        Err(CollectionError::Unauthorized { .. })
    );

    h.environment.advance_ms(29 * DAY_MS);
    assert_matches!(
        h.service.force_distribute(admin(), depositor, secret(0)).await,
        Err(CollectionError::Distributor(DistributorError::TooEarly { .. }))
    );

    h.environment.advance_ms(2 * DAY_MS);
    let report = h
        .service
        .force_distribute(admin(), depositor, secret(0))
        .await
        .expect("matured");
    assert_eq!(report.total, 50);
    assert_eq!(h.payments.total_paid(), 50);
}

#[tokio::test]
async fn admin_gating_covers_plan_and_treasury_and_renderer() {
    let mut h = default_harness();
    let outsider = participant(1);

    assert_matches!(
        h.service.add_fund_distribution(outsider, participant(2), 100, true).await,
        Err(CollectionError::Unauthorized { .. })
    );
    assert_matches!(
        h.service.update_fund_distribution(outsider, 0, 100, true).await,
        Err(CollectionError::Unauthorized { .. })
    );
    assert_matches!(
        h.service.update_treasury_address(outsider, participant(2)).await,
        Err(CollectionError::Unauthorized { .. })
    );
    assert_matches!(
        h.service.set_renderer(outsider, Arc::new(StubRenderer)).await,
        Err(CollectionError::Unauthorized { .. })
    );

    // The cap violations still surface for admins.
    h.service
        .add_fund_distribution(admin(), participant(2), 5000, true)
        .await
        .expect("at cap");
    assert_matches!(
        h.service.add_fund_distribution(admin(), participant(3), 1, true).await,
        Err(CollectionError::Distributor(
            DistributorError::FixedAllocationExceeded { .. }
        ))
    );
}

#[tokio::test]
async fn metadata_renders_existing_tokens_only() {
    let mut h = default_harness();
    h.service.advance_phase(admin()).await.expect("to premint");
    let token = h.service.mint(admin(), admin(), None).await.expect("mint");

    let art = h.service.token_metadata(token).await.expect("render");
    assert!(!art.image.is_empty());
    assert!(art.attributes_json.contains("trait_type"));

    assert_matches!(
        h.service.token_metadata(TokenId(999)).await,
        Err(CollectionError::UnknownToken { token: TokenId(999) })
    );
}

#[tokio::test]
async fn rejects_invalid_config() {
    let payments = Arc::new(RecordingPayments::new());
    let environment = Arc::new(ManualEnvironment::default());
    let result = CollectionService::new(
        CollectionConfig::new("broken", 0, 3, participant(0xfe)),
        Arc::new(MemoryLedger::new()),
        Arc::new(StubRenderer),
        Arc::new(StaticAccessControl::with_admins([admin()])),
        payments,
        environment,
    );
    assert_matches!(result, Err(CollectionError::Config(_)));
}
