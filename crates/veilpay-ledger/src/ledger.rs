// SPDX-License-Identifier: BUSL-1.1
//! # Payment Ledger
//!
//! In-memory payment lifecycle manager backed by `DashMap`. The
//! read-validate-update of every mutating operation runs under a single
//! entry write lock, so a status precondition and its status write are
//! atomic per record (TOCTOU-free).
//!
//! Identifier derivation folds in a monotonically increasing per-ledger
//! sequence counter and a random salt — never payer+timestamp alone — so
//! concurrent creations from the same payer cannot collide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use veilpay_core::{ActorId, PaymentId, RiskScore, Sha256Accumulator, Timestamp};
use veilpay_policy::{AgentRegistry, PolicyStore};
use veilpay_proof::{AttestationState, ProofAttestationRegistry, ProofFingerprint};

use crate::error::LedgerError;
use crate::event::PaymentEvent;
use crate::payment::{CreatePaymentRequest, Payment, PaymentView};
use crate::status::PaymentStatus;

/// Domain separator for payment identifier derivation.
const PAYMENT_ID_DOMAIN: &str = "veilpay/payment-id/v1";

/// The authoritative mapping of payment identity to payment record.
///
/// Holds references to the authorization, policy, and attestation registries
/// and consults them inside each transition — no ambient global state.
pub struct PaymentLedger {
    payments: DashMap<PaymentId, Payment>,
    sequence: AtomicU64,
    agents: Arc<AgentRegistry>,
    policies: Arc<PolicyStore>,
    attestations: Arc<ProofAttestationRegistry>,
    events: RwLock<Vec<PaymentEvent>>,
}

impl PaymentLedger {
    /// Create an empty ledger wired to its collaborating registries.
    pub fn new(
        agents: Arc<AgentRegistry>,
        policies: Arc<PolicyStore>,
        attestations: Arc<ProofAttestationRegistry>,
    ) -> Self {
        Self {
            payments: DashMap::new(),
            sequence: AtomicU64::new(0),
            agents,
            policies,
            attestations,
            events: RwLock::new(Vec::new()),
        }
    }

    /// Create a payment in `Pending`.
    ///
    /// Rejects zero amounts and empty encrypted-amount blobs; when the
    /// payer's policy requires encrypted metadata, an empty metadata blob is
    /// rejected too. Identity fields arrive pre-validated as newtypes.
    pub fn create_payment(&self, req: CreatePaymentRequest) -> Result<PaymentId, LedgerError> {
        if req.amount == 0 {
            return Err(LedgerError::InvalidInput("amount must be non-zero".into()));
        }
        if req.encrypted_amount.is_empty() {
            return Err(LedgerError::InvalidInput(
                "encrypted amount must not be empty".into(),
            ));
        }
        let policy = self.policies.policy_for(&req.payer);
        if policy.metadata_encryption_required && req.encrypted_metadata.is_empty() {
            return Err(LedgerError::InvalidInput(
                "payer policy requires encrypted metadata".into(),
            ));
        }

        let created_at = Timestamp::now();
        // Fresh salt per attempt; the vacant-entry check makes the
        // uniqueness invariant hold even if two derivations ever collide.
        let id = loop {
            let id = self.derive_payment_id(&req);
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.payments.entry(id) {
                slot.insert(Payment {
                    id,
                    payer: req.payer.clone(),
                    recipient_ref: req.recipient_ref.clone(),
                    token: req.token.clone(),
                    amount: req.amount,
                    encrypted_amount: req.encrypted_amount.clone(),
                    encrypted_metadata: req.encrypted_metadata.clone(),
                    status: PaymentStatus::Pending,
                    risk_score: None,
                    proof: None,
                    refund_reason: None,
                    created_at,
                    updated_at: created_at,
                    expires_at: req.expires_at,
                    transitions: Vec::new(),
                });
                break id;
            }
        };

        tracing::info!(payment = %id, payer = %req.payer, "payment created");
        self.record_event(PaymentEvent::Created {
            payment: id,
            payer: req.payer,
            token: req.token,
            at: created_at,
        });
        Ok(id)
    }

    fn derive_payment_id(&self, req: &CreatePaymentRequest) -> PaymentId {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let salt: [u8; 16] = rand::random();

        let mut acc = Sha256Accumulator::with_domain(PAYMENT_ID_DOMAIN);
        acc.update(req.payer.as_str().as_bytes());
        acc.update(req.recipient_ref.as_str().as_bytes());
        acc.update(req.token.as_str().as_bytes());
        acc.update_u64(req.amount);
        acc.update_u64(sequence);
        acc.update(&salt);
        PaymentId::from_bytes(acc.finalize())
    }

    /// Apply a risk score and derive the resulting status.
    ///
    /// Score at or above the payer's policy threshold flags the payment;
    /// below it verifies. The score is recorded regardless of which way the
    /// transition goes, and re-assessment may move a payment between
    /// `Verified` and `Flagged`.
    pub fn apply_risk_score(
        &self,
        id: PaymentId,
        score: RiskScore,
        assessor: &ActorId,
    ) -> Result<PaymentStatus, LedgerError> {
        if !self.agents.is_authorized(assessor) {
            return Err(LedgerError::Unauthorized {
                caller: assessor.clone(),
                action: "apply a risk score".into(),
            });
        }

        let mut entry = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let payment = entry.value_mut();

        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadyTerminal {
                payment: id,
                status: payment.status,
            });
        }

        let threshold = self.policies.policy_for(&payment.payer).risk_threshold;
        let target = if score >= threshold {
            PaymentStatus::Flagged
        } else {
            PaymentStatus::Verified
        };

        payment.risk_score = Some(score);
        if payment.status != target {
            payment.transition(target, Some(format!("risk score {score} by {assessor}")))?;
        } else {
            payment.updated_at = Timestamp::now();
        }
        let status = payment.status;
        let at = payment.updated_at;
        drop(entry);

        tracing::info!(payment = %id, score = %score, status = %status, "risk score applied");
        self.record_event(PaymentEvent::RiskUpdated {
            payment: id,
            score,
            status,
            assessor: assessor.clone(),
            at,
        });
        Ok(status)
    }

    /// Attach a verified proof attestation to a `Verified` payment.
    ///
    /// The attestation must already have latched `Verified` in the
    /// registry — this operation links an externally-checked result, it
    /// never decides one. When the payer's policy sets
    /// `auto_complete_on_proof`, the payment completes directly; otherwise
    /// it stays `Verified` and becomes completion-eligible.
    pub fn verify_proof(
        &self,
        id: PaymentId,
        fingerprint: ProofFingerprint,
        agent: &ActorId,
    ) -> Result<(), LedgerError> {
        if !self.agents.is_authorized(agent) {
            return Err(LedgerError::Unauthorized {
                caller: agent.clone(),
                action: "attach a proof attestation".into(),
            });
        }

        let attestation = self
            .attestations
            .get(&fingerprint)
            .ok_or_else(|| LedgerError::NotFound(fingerprint.to_string()))?;

        let mut entry = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let payment = entry.value_mut();

        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadyTerminal {
                payment: id,
                status: payment.status,
            });
        }
        if payment.status != PaymentStatus::Verified {
            return Err(LedgerError::InvalidState {
                payment: id,
                status: payment.status,
                reason: "proof attachment requires a risk-verified payment".into(),
            });
        }
        match attestation.state {
            AttestationState::Verified => {}
            AttestationState::Pending => {
                return Err(LedgerError::InvalidState {
                    payment: id,
                    status: payment.status,
                    reason: format!("attestation {fingerprint} has not been verified"),
                });
            }
            AttestationState::Failed => {
                return Err(LedgerError::InvalidState {
                    payment: id,
                    status: payment.status,
                    reason: format!("attestation {fingerprint} failed verification"),
                });
            }
        }
        if let Some(existing) = payment.proof {
            return Err(LedgerError::Conflict {
                payment: id,
                reason: format!("proof {existing} is already attached"),
            });
        }

        payment.proof = Some(fingerprint);
        payment.updated_at = Timestamp::now();
        let at = payment.updated_at;

        let auto_complete = self
            .policies
            .policy_for(&payment.payer)
            .auto_complete_on_proof;
        let mut completed_at = None;
        if auto_complete {
            payment.transition(
                PaymentStatus::Completed,
                Some("auto-completed on proof verification".into()),
            )?;
            completed_at = Some(payment.updated_at);
        }
        drop(entry);

        tracing::info!(payment = %id, proof = %fingerprint, "proof attached");
        self.record_event(PaymentEvent::ProofVerified {
            payment: id,
            fingerprint,
            agent: agent.clone(),
            at,
        });
        if let Some(at) = completed_at {
            self.record_event(PaymentEvent::Completed { payment: id, at });
        }
        Ok(())
    }

    /// Settle a payment. Only the original payer may call this.
    ///
    /// Requires status `Verified` and, when the payer's policy demands a
    /// proof, a verified attestation attached.
    pub fn complete_payment(&self, id: PaymentId, caller: &ActorId) -> Result<(), LedgerError> {
        let mut entry = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let payment = entry.value_mut();

        // Identity check comes first: a non-payer is rejected with
        // Unauthorized regardless of payment status.
        if caller != &payment.payer {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
                action: "complete this payment".into(),
            });
        }
        match payment.status {
            PaymentStatus::Completed => {
                return Err(LedgerError::InvalidState {
                    payment: id,
                    status: payment.status,
                    reason: "payment is already completed".into(),
                });
            }
            PaymentStatus::Refunded | PaymentStatus::Failed => {
                return Err(LedgerError::AlreadyTerminal {
                    payment: id,
                    status: payment.status,
                });
            }
            PaymentStatus::Verified => {}
            PaymentStatus::Pending | PaymentStatus::Flagged => {
                return Err(LedgerError::InvalidState {
                    payment: id,
                    status: payment.status,
                    reason: "completion requires a risk-verified payment".into(),
                });
            }
        }
        if self.policies.policy_for(&payment.payer).proof_required && payment.proof.is_none() {
            return Err(LedgerError::InvalidState {
                payment: id,
                status: payment.status,
                reason: "payer policy requires a verified proof before completion".into(),
            });
        }

        payment.transition(PaymentStatus::Completed, Some("completed by payer".into()))?;
        let at = payment.updated_at;
        drop(entry);

        tracing::info!(payment = %id, "payment completed");
        self.record_event(PaymentEvent::Completed { payment: id, at });
        Ok(())
    }

    /// Refund a payment. Agent-authorized; valid from `Pending`, `Verified`,
    /// or `Flagged`.
    pub fn refund_payment(
        &self,
        id: PaymentId,
        agent: &ActorId,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.terminate(id, agent, reason.into(), PaymentStatus::Refunded)
    }

    /// Terminally fail a payment whose required proof definitively failed
    /// verification. Agent-authorized; valid only from `Verified`.
    pub fn fail_payment(
        &self,
        id: PaymentId,
        agent: &ActorId,
        reason: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.terminate(id, agent, reason.into(), PaymentStatus::Failed)
    }

    fn terminate(
        &self,
        id: PaymentId,
        agent: &ActorId,
        reason: String,
        target: PaymentStatus,
    ) -> Result<(), LedgerError> {
        if !self.agents.is_authorized(agent) {
            return Err(LedgerError::Unauthorized {
                caller: agent.clone(),
                action: format!("move a payment to {target}"),
            });
        }

        let mut entry = self
            .payments
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        let payment = entry.value_mut();

        if payment.status.is_terminal() {
            return Err(LedgerError::AlreadyTerminal {
                payment: id,
                status: payment.status,
            });
        }

        payment.transition(target, Some(reason.clone()))?;
        if target == PaymentStatus::Refunded {
            payment.refund_reason = Some(reason.clone());
        }
        let at = payment.updated_at;
        drop(entry);

        tracing::info!(payment = %id, status = %target, reason = %reason, "payment terminated");
        self.record_event(match target {
            PaymentStatus::Refunded => PaymentEvent::Refunded {
                payment: id,
                agent: agent.clone(),
                reason,
                at,
            },
            _ => PaymentEvent::Failed {
                payment: id,
                agent: agent.clone(),
                reason,
                at,
            },
        });
        Ok(())
    }

    /// Read a payment's view. Never exposes the cleartext amount.
    pub fn get_payment(&self, id: PaymentId) -> Result<PaymentView, LedgerError> {
        self.payments
            .get(&id)
            .map(|entry| PaymentView::from(entry.value()))
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// All payments currently in `status`. Scan support for the
    /// orchestrator's polling loops.
    pub fn payments_with_status(&self, status: PaymentStatus) -> Vec<PaymentView> {
        self.payments
            .iter()
            .filter(|entry| entry.value().status == status)
            .map(|entry| PaymentView::from(entry.value()))
            .collect()
    }

    /// `Pending` payments past their expiry at `now`.
    pub fn expired_pending(&self, now: Timestamp) -> Vec<PaymentId> {
        self.payments
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.value().id)
            .collect()
    }

    /// Snapshot of the audit event log.
    pub fn events(&self) -> Vec<PaymentEvent> {
        self.events.read().clone()
    }

    /// Number of payment records (terminal records included).
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Whether the ledger holds no records.
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    fn record_event(&self, event: PaymentEvent) {
        self.events.write().push(event);
    }
}

impl std::fmt::Debug for PaymentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentLedger")
            .field("payments", &self.payments.len())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
