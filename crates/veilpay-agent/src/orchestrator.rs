// SPDX-License-Identifier: BUSL-1.1
//! # Settlement Orchestrator
//!
//! Drives payments through the lifecycle by polling the ledger and acting
//! under its own authorized agent identity:
//!
//! - **assessment worker** — scores `Pending` payments through the external
//!   scorer and submits the result via the risk gate. A scorer failure is
//!   retried with bounded backoff, then replaced with the conservative
//!   fallback score rather than blocking the payment.
//! - **proof worker** — links decided attestations to their payments:
//!   verified proofs are attached; a failed proof on a proof-requiring
//!   payment fails the payment terminally.
//! - **expiry worker** — refunds `Pending` payments past their expiry.
//!
//! Permanent rejections (`Unauthorized`, `InvalidState`) are logged and not
//! retried; only transient scorer failures get backoff.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use veilpay_core::{ActorId, PaymentId, RiskScore, Timestamp};
use veilpay_ledger::{LedgerError, PaymentLedger, PaymentStatus};
use veilpay_policy::{AgentRegistry, PolicyStore};
use veilpay_proof::{
    AttestationError, AttestationState, ProofAttestationRegistry, ProofFingerprint, ProofVerifier,
    VerifyError,
};
use veilpay_risk::{RiskAssessmentGate, RiskScorer, ScorerError, TransactionContext};

use crate::config::OrchestratorConfig;
use crate::decision::check_critical_patterns;

/// Errors from orchestrator-initiated proof decisions.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The fingerprint is not in the attestation registry.
    #[error("unknown proof fingerprint: {0}")]
    UnknownProof(ProofFingerprint),

    /// The verification capability rejected the material structurally.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// The attestation registry rejected the outcome write.
    #[error(transparent)]
    Attestation(#[from] AttestationError),
}

/// Summary of one scan-and-act cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Payments acted on this cycle (including deliberate no-ops).
    pub processed: usize,
    /// Payments whose action failed unexpectedly.
    pub errors: usize,
}

/// The off-chain settlement agent.
///
/// Generic over the scoring service and the proof-verification capability so
/// deployments inject real adapters and tests inject scripted ones.
pub struct SettlementOrchestrator<S, V> {
    ledger: Arc<PaymentLedger>,
    gate: Arc<RiskAssessmentGate>,
    attestations: Arc<ProofAttestationRegistry>,
    agents: Arc<AgentRegistry>,
    policies: Arc<PolicyStore>,
    scorer: S,
    verifier: V,
    identity: ActorId,
    config: OrchestratorConfig,
    /// Cleartext transaction contexts, delivered out-of-band at submission
    /// time. A pending payment without a context is scored with the
    /// conservative fallback.
    contexts: DashMap<PaymentId, TransactionContext>,
    /// Fingerprints awaiting linkage, per payment.
    proof_intents: DashMap<PaymentId, ProofFingerprint>,
}

impl<S, V> SettlementOrchestrator<S, V>
where
    S: RiskScorer,
    V: ProofVerifier,
{
    /// Wire an orchestrator to its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ledger: Arc<PaymentLedger>,
        gate: Arc<RiskAssessmentGate>,
        attestations: Arc<ProofAttestationRegistry>,
        agents: Arc<AgentRegistry>,
        policies: Arc<PolicyStore>,
        scorer: S,
        verifier: V,
        identity: ActorId,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ledger,
            gate,
            attestations,
            agents,
            policies,
            scorer,
            verifier,
            identity,
            config,
            contexts: DashMap::new(),
            proof_intents: DashMap::new(),
        }
    }

    /// The agent identity this orchestrator acts under.
    pub fn identity(&self) -> &ActorId {
        &self.identity
    }

    /// Register the cleartext transaction context for a payment, delivered
    /// out-of-band by the submission path.
    pub fn register_context(&self, payment: PaymentId, ctx: TransactionContext) {
        self.contexts.insert(payment, ctx);
    }

    /// Register a proof fingerprint awaiting linkage to a payment.
    pub fn register_proof_intent(&self, payment: PaymentId, fingerprint: ProofFingerprint) {
        self.proof_intents.insert(payment, fingerprint);
    }

    /// Decide a submitted attestation by invoking the verification
    /// capability against the stored public input.
    ///
    /// The outcome the capability returns — valid or not — is what gets
    /// recorded; the orchestrator never assumes success.
    pub fn decide_proof(
        &self,
        fingerprint: ProofFingerprint,
        material: &[u8],
    ) -> Result<AttestationState, OrchestratorError> {
        let attestation = self
            .attestations
            .get(&fingerprint)
            .ok_or(OrchestratorError::UnknownProof(fingerprint))?;

        let is_valid = self.verifier.verify(material, &attestation.public_input)?;
        let state =
            self.attestations
                .verify(fingerprint, &self.identity, is_valid, &self.agents)?;
        tracing::info!(proof = %fingerprint, %state, "attestation decided");
        Ok(state)
    }

    /// Score every `Pending` payment and submit through the gate.
    pub async fn assess_pending_once(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        for view in self.ledger.payments_with_status(PaymentStatus::Pending) {
            // Clone out of the map so no shard lock is held across an await.
            let ctx = self.contexts.get(&view.id).map(|entry| entry.value().clone());
            let score = match ctx {
                Some(ctx) => self.score_context(&ctx).await,
                None => {
                    tracing::warn!(
                        payment = %view.id,
                        "no transaction context registered, applying fallback score"
                    );
                    RiskScore::FALLBACK
                }
            };

            match self.gate.assess(view.id, score, &self.identity) {
                Ok(Some(status)) => {
                    tracing::info!(payment = %view.id, %score, %status, "payment assessed");
                    outcome.processed += 1;
                }
                Ok(None) => outcome.processed += 1,
                Err(e) => {
                    tracing::error!(payment = %view.id, error = %e, "assessment failed");
                    outcome.errors += 1;
                }
            }
        }
        outcome
    }

    /// Score a context: critical patterns short-circuit to the maximum;
    /// otherwise the external scorer is consulted with retry, falling back
    /// to the conservative default when it stays unavailable.
    async fn score_context(&self, ctx: &TransactionContext) -> RiskScore {
        if check_critical_patterns(ctx, self.config.critical_amount_cap) {
            tracing::warn!(sender = %ctx.sender, "critical risk pattern detected");
            return RiskScore::MAX;
        }

        for attempt in 1..=self.config.scorer_retries {
            match self.scorer.score(ctx) {
                Ok(report) => return report.score,
                Err(ScorerError::Rejected(reason)) => {
                    tracing::warn!(reason = %reason, "scoring request rejected, applying fallback");
                    return RiskScore::FALLBACK;
                }
                Err(ScorerError::Unavailable(reason)) => {
                    let delay = self.config.backoff_for(attempt);
                    tracing::warn!(
                        attempt,
                        max = self.config.scorer_retries,
                        reason = %reason,
                        "scoring service unavailable, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
        tracing::warn!("scoring service exhausted retries, applying fallback score");
        RiskScore::FALLBACK
    }

    /// Link decided attestations to their payments.
    ///
    /// A verified attestation is attached through the ledger. A failed
    /// attestation on a payment whose policy requires a proof fails the
    /// payment terminally; when no proof is required, the intent is simply
    /// dropped and the payment stays where it is.
    pub async fn link_proofs_once(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        let intents: Vec<(PaymentId, ProofFingerprint)> = self
            .proof_intents
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        for (payment, fingerprint) in intents {
            let Some(attestation) = self.attestations.get(&fingerprint) else {
                tracing::warn!(payment = %payment, proof = %fingerprint, "intent references unknown proof");
                self.proof_intents.remove(&payment);
                outcome.errors += 1;
                continue;
            };

            match attestation.state {
                AttestationState::Pending => {}
                AttestationState::Verified => {
                    match self.ledger.verify_proof(payment, fingerprint, &self.identity) {
                        Ok(()) => {
                            self.proof_intents.remove(&payment);
                            outcome.processed += 1;
                        }
                        Err(LedgerError::Conflict { .. }) => {
                            // Already attached — a previous cycle got there.
                            self.proof_intents.remove(&payment);
                            outcome.processed += 1;
                        }
                        Err(LedgerError::InvalidState { .. }) => {
                            // Payment not yet Verified; keep the intent for
                            // the next cycle.
                        }
                        Err(e) => {
                            tracing::error!(payment = %payment, error = %e, "proof linkage failed");
                            self.proof_intents.remove(&payment);
                            outcome.errors += 1;
                        }
                    }
                }
                AttestationState::Failed => {
                    match self.handle_failed_proof(payment) {
                        Ok(()) => outcome.processed += 1,
                        Err(e) => {
                            tracing::error!(payment = %payment, error = %e, "failed-proof handling errored");
                            outcome.errors += 1;
                        }
                    }
                    self.proof_intents.remove(&payment);
                }
            }
        }
        outcome
    }

    fn handle_failed_proof(&self, payment: PaymentId) -> Result<(), LedgerError> {
        let view = self.ledger.get_payment(payment)?;
        if self.policies.policy_for(&view.payer).proof_required {
            self.ledger
                .fail_payment(payment, &self.identity, "proof failed verification")
        } else {
            tracing::info!(
                payment = %payment,
                "proof failed but policy does not require one, payment unaffected"
            );
            Ok(())
        }
    }

    /// Refund `Pending` payments past their expiry.
    pub async fn sweep_expired_once(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        for payment in self.ledger.expired_pending(Timestamp::now()) {
            match self.ledger.refund_payment(payment, &self.identity, "expired") {
                Ok(()) => {
                    tracing::info!(payment = %payment, "expired payment refunded");
                    outcome.processed += 1;
                }
                // Lost a race with another transition; nothing to do.
                Err(LedgerError::AlreadyTerminal { .. }) => outcome.processed += 1,
                Err(e) => {
                    tracing::error!(payment = %payment, error = %e, "expiry refund failed");
                    outcome.errors += 1;
                }
            }
        }
        outcome
    }

    /// Refund every `Flagged` payment with reason `"high risk"`.
    ///
    /// Not wired into a worker by default — flagged payments default to
    /// manual review; deployments that want automatic disposal call this on
    /// their own schedule.
    pub async fn refund_flagged_once(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::default();
        for view in self.ledger.payments_with_status(PaymentStatus::Flagged) {
            match self.ledger.refund_payment(view.id, &self.identity, "high risk") {
                Ok(()) => outcome.processed += 1,
                Err(LedgerError::AlreadyTerminal { .. }) => outcome.processed += 1,
                Err(e) => {
                    tracing::error!(payment = %view.id, error = %e, "flagged refund failed");
                    outcome.errors += 1;
                }
            }
        }
        outcome
    }
}

impl<S, V> SettlementOrchestrator<S, V>
where
    S: RiskScorer + 'static,
    V: ProofVerifier + 'static,
{
    /// Spawn the three workers as independent tasks.
    ///
    /// Each worker has its own interval and failure accounting; a cycle
    /// that saw errors delays the next tick with exponential backoff
    /// instead of aborting the loop. Flip the watch channel to `true` to
    /// stop all workers.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let assess = {
            let this = Arc::clone(self);
            spawn_worker(
                "assess",
                self.config.assess_interval(),
                self.config.clone(),
                shutdown.clone(),
                move || {
                    let this = Arc::clone(&this);
                    async move { this.assess_pending_once().await }
                },
            )
        };
        let proofs = {
            let this = Arc::clone(self);
            spawn_worker(
                "proofs",
                self.config.proof_link_interval(),
                self.config.clone(),
                shutdown.clone(),
                move || {
                    let this = Arc::clone(&this);
                    async move { this.link_proofs_once().await }
                },
            )
        };
        let expiry = {
            let this = Arc::clone(self);
            spawn_worker(
                "expiry",
                self.config.expiry_interval(),
                self.config.clone(),
                shutdown,
                move || {
                    let this = Arc::clone(&this);
                    async move { this.sweep_expired_once().await }
                },
            )
        };
        vec![assess, proofs, expiry]
    }
}

impl<S, V> std::fmt::Debug for SettlementOrchestrator<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementOrchestrator")
            .field("identity", &self.identity)
            .field("pending_contexts", &self.contexts.len())
            .field("proof_intents", &self.proof_intents.len())
            .finish_non_exhaustive()
    }
}

/// One polling loop: tick, run the cycle, back off after failing cycles,
/// stop when the shutdown channel flips.
fn spawn_worker<F, Fut>(
    name: &'static str,
    interval: std::time::Duration,
    config: OrchestratorConfig,
    mut shutdown: watch::Receiver<bool>,
    cycle: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = CycleOutcome> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = cycle().await;
                    if outcome.errors > 0 {
                        consecutive_failures += 1;
                        let delay = config.backoff_for(consecutive_failures);
                        tracing::warn!(
                            worker = name,
                            errors = outcome.errors,
                            "cycle saw errors, backing off for {delay:?}"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        consecutive_failures = 0;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!(worker = name, "worker stopping");
                        break;
                    }
                }
            }
        }
    })
}
