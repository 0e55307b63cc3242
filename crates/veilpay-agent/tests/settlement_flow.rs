// SPDX-License-Identifier: BUSL-1.1
//! End-to-end settlement scenarios driving the orchestrator against the
//! full registry stack with scripted scorer and mock verifier.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use veilpay_agent::{OrchestratorConfig, SettlementOrchestrator};
use veilpay_core::{ActorId, PaymentId, RecipientRef, RiskScore, Timestamp, TokenId};
use veilpay_crypto::EncryptedBlob;
use veilpay_ledger::{CreatePaymentRequest, LedgerError, PaymentLedger, PaymentStatus};
use veilpay_policy::{AgentRegistry, PolicyStore, PrivacyPolicy};
use veilpay_proof::{
    mock::MockVerifier, AttestationState, ProofAttestationRegistry, ProofFingerprint,
};
use veilpay_risk::{
    RiskAssessmentGate, RiskScorer, ScoreReport, ScorerError, TransactionContext,
};

/// Scripted scorer: returns a fixed score, optionally failing the first N
/// calls to exercise the retry/fallback path.
struct ScriptedScorer {
    score: u8,
    failures_remaining: AtomicU32,
}

impl ScriptedScorer {
    fn fixed(score: u8) -> Self {
        Self {
            score,
            failures_remaining: AtomicU32::new(0),
        }
    }

    fn failing_forever() -> Self {
        Self {
            score: 0,
            failures_remaining: AtomicU32::new(u32::MAX),
        }
    }
}

impl RiskScorer for ScriptedScorer {
    fn score(&self, _ctx: &TransactionContext) -> Result<ScoreReport, ScorerError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining
                .store(remaining.saturating_sub(1), Ordering::SeqCst);
            return Err(ScorerError::Unavailable("scripted outage".into()));
        }
        Ok(ScoreReport::bare(RiskScore::new(self.score).unwrap()))
    }
}

struct Stack {
    ledger: Arc<PaymentLedger>,
    policies: Arc<PolicyStore>,
    attestations: Arc<ProofAttestationRegistry>,
    orchestrator: Arc<SettlementOrchestrator<ScriptedScorer, MockVerifier>>,
    payer: ActorId,
}

fn actor(s: &str) -> ActorId {
    ActorId::new(s).unwrap()
}

fn stack(scorer: ScriptedScorer) -> Stack {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let admin = actor("0xadmin");
    let agent = actor("0xagent");
    let agents = Arc::new(AgentRegistry::new(admin.clone()));
    agents.set_authorization(&admin, &agent, true).unwrap();
    let policies = Arc::new(PolicyStore::new());
    let attestations = Arc::new(ProofAttestationRegistry::new());
    let ledger = Arc::new(PaymentLedger::new(
        agents.clone(),
        policies.clone(),
        attestations.clone(),
    ));
    let gate = Arc::new(RiskAssessmentGate::new(ledger.clone(), agents.clone()));

    let config = OrchestratorConfig {
        error_backoff_ms: 1,
        max_backoff_ms: 2,
        ..OrchestratorConfig::default()
    };
    let orchestrator = Arc::new(SettlementOrchestrator::new(
        ledger.clone(),
        gate,
        attestations.clone(),
        agents,
        policies.clone(),
        scorer,
        MockVerifier,
        agent,
        config,
    ));
    Stack {
        ledger,
        policies,
        attestations,
        orchestrator,
        payer: actor("0xpayer"),
    }
}

fn submit_payment(s: &Stack, purpose: &str) -> PaymentId {
    let id = s
        .ledger
        .create_payment(CreatePaymentRequest {
            payer: s.payer.clone(),
            recipient_ref: RecipientRef::new("0xrecipient7f3a").unwrap(),
            token: TokenId::new("USDC").unwrap(),
            amount: 100,
            encrypted_amount: EncryptedBlob::new(vec![1, 2, 3]),
            encrypted_metadata: EncryptedBlob::new(vec![4, 5, 6]),
            expires_at: None,
        })
        .unwrap();

    let mut metadata = serde_json::Map::new();
    metadata.insert("purpose".into(), purpose.into());
    s.orchestrator.register_context(
        id,
        TransactionContext {
            sender: s.payer.clone(),
            recipient_ref: RecipientRef::new("0xrecipient7f3a").unwrap(),
            amount: 100,
            metadata,
        },
    );
    id
}

/// Payer submits proof material; the orchestrator decides it through the
/// verification capability and links it on the next proof cycle.
async fn submit_and_link_proof(s: &Stack, id: PaymentId, material: Vec<u8>) -> ProofFingerprint {
    let fingerprint = ProofFingerprint::from_material(&material);
    s.attestations
        .submit(fingerprint, id.to_hex().into_bytes(), s.payer.clone())
        .unwrap();
    s.orchestrator.register_proof_intent(id, fingerprint);
    s.orchestrator.decide_proof(fingerprint, &material).unwrap();
    s.orchestrator.link_proofs_once().await;
    fingerprint
}

#[tokio::test]
async fn low_risk_payment_settles_end_to_end() {
    let s = stack(ScriptedScorer::fixed(50));
    s.policies.set_policy(
        &s.payer,
        PrivacyPolicy {
            proof_required: true,
            ..PrivacyPolicy::default()
        },
    );

    let id = submit_payment(&s, "invoice payment");
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Pending);

    // Assessment worker: score 50 < threshold 75 → Verified.
    let outcome = s.orchestrator.assess_pending_once().await;
    assert_eq!(outcome.errors, 0);
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Verified);

    // Proof flow: valid material verifies and links.
    let material = MockVerifier::prove(id.to_hex().as_bytes());
    submit_and_link_proof(&s, id, material).await;
    let view = s.ledger.get_payment(id).unwrap();
    assert_eq!(view.status, PaymentStatus::Verified);
    assert!(view.proof.is_some());

    // Payer completes; a second attempt fails on the settled record.
    s.ledger.complete_payment(id, &s.payer).unwrap();
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Completed);
    assert!(matches!(
        s.ledger.complete_payment(id, &s.payer),
        Err(LedgerError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn high_risk_payment_flags_then_refunds() {
    let s = stack(ScriptedScorer::fixed(90));
    let id = submit_payment(&s, "invoice payment");

    s.orchestrator.assess_pending_once().await;
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Flagged);

    // The payer cannot push a flagged payment through.
    assert!(matches!(
        s.ledger.complete_payment(id, &s.payer),
        Err(LedgerError::InvalidState { .. })
    ));

    s.orchestrator.refund_flagged_once().await;
    let view = s.ledger.get_payment(id).unwrap();
    assert_eq!(view.status, PaymentStatus::Refunded);
    assert_eq!(view.refund_reason.as_deref(), Some("high risk"));
}

#[tokio::test]
async fn suspicious_metadata_overrides_scorer() {
    // Scorer says 10, but the metadata mentions a drain.
    let s = stack(ScriptedScorer::fixed(10));
    let id = submit_payment(&s, "drain the pool");

    s.orchestrator.assess_pending_once().await;
    let view = s.ledger.get_payment(id).unwrap();
    assert_eq!(view.status, PaymentStatus::Flagged);
    assert_eq!(view.risk_score, Some(RiskScore::MAX));
}

#[tokio::test]
async fn scorer_outage_applies_conservative_fallback() {
    let s = stack(ScriptedScorer::failing_forever());
    let id = submit_payment(&s, "invoice payment");

    let outcome = s.orchestrator.assess_pending_once().await;
    assert_eq!(outcome.errors, 0);

    // Fallback 50 is below the default threshold 75.
    let view = s.ledger.get_payment(id).unwrap();
    assert_eq!(view.status, PaymentStatus::Verified);
    assert_eq!(view.risk_score, Some(RiskScore::FALLBACK));
}

#[tokio::test]
async fn failed_proof_fails_a_proof_requiring_payment() {
    let s = stack(ScriptedScorer::fixed(20));
    s.policies.set_policy(
        &s.payer,
        PrivacyPolicy {
            proof_required: true,
            ..PrivacyPolicy::default()
        },
    );
    let id = submit_payment(&s, "invoice payment");
    s.orchestrator.assess_pending_once().await;

    // Material that does not match the stored public input.
    let material = MockVerifier::prove(b"wrong public input");
    let fingerprint = ProofFingerprint::from_material(&material);
    s.attestations
        .submit(fingerprint, id.to_hex().into_bytes(), s.payer.clone())
        .unwrap();
    s.orchestrator.register_proof_intent(id, fingerprint);
    let state = s.orchestrator.decide_proof(fingerprint, &material).unwrap();
    assert_eq!(state, AttestationState::Failed);

    s.orchestrator.link_proofs_once().await;
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Failed);
}

#[tokio::test]
async fn failed_proof_leaves_optional_proof_payment_verified() {
    let s = stack(ScriptedScorer::fixed(20));
    // Default policy: proof not required.
    let id = submit_payment(&s, "invoice payment");
    s.orchestrator.assess_pending_once().await;

    let material = MockVerifier::prove(b"wrong public input");
    let fingerprint = ProofFingerprint::from_material(&material);
    s.attestations
        .submit(fingerprint, id.to_hex().into_bytes(), s.payer.clone())
        .unwrap();
    s.orchestrator.register_proof_intent(id, fingerprint);
    s.orchestrator.decide_proof(fingerprint, &material).unwrap();

    s.orchestrator.link_proofs_once().await;
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Verified);
}

#[tokio::test]
async fn expired_pending_payment_is_refunded() {
    let s = stack(ScriptedScorer::fixed(20));
    let id = s
        .ledger
        .create_payment(CreatePaymentRequest {
            payer: s.payer.clone(),
            recipient_ref: RecipientRef::new("0xrecipient").unwrap(),
            token: TokenId::new("USDC").unwrap(),
            amount: 100,
            encrypted_amount: EncryptedBlob::new(vec![1]),
            encrypted_metadata: EncryptedBlob::new(vec![2]),
            expires_at: Some(Timestamp::from_epoch_secs(1_000).unwrap()),
        })
        .unwrap();

    let outcome = s.orchestrator.sweep_expired_once().await;
    assert_eq!(outcome.processed, 1);
    let view = s.ledger.get_payment(id).unwrap();
    assert_eq!(view.status, PaymentStatus::Refunded);
    assert_eq!(view.refund_reason.as_deref(), Some("expired"));
}

#[tokio::test]
async fn reassessment_cycles_are_idempotent() {
    let s = stack(ScriptedScorer::fixed(50));
    let id = submit_payment(&s, "invoice payment");

    s.orchestrator.assess_pending_once().await;
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Verified);
    let events_after_first = s.ledger.events().len();

    // Re-running the cycle scans nothing (the payment has left Pending),
    // so no duplicate transition or event is produced.
    s.orchestrator.assess_pending_once().await;
    assert_eq!(s.ledger.events().len(), events_after_first);
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Verified);
}

#[tokio::test]
async fn workers_spawn_and_shut_down() {
    let s = stack(ScriptedScorer::fixed(50));
    let id = submit_payment(&s, "invoice payment");

    let (tx, rx) = tokio::sync::watch::channel(false);
    let handles = s.orchestrator.spawn(rx);

    // Each worker's first tick fires immediately; give them a moment to act.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(s.ledger.get_payment(id).unwrap().status, PaymentStatus::Verified);

    tx.send(true).unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
}
