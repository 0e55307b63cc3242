// SPDX-License-Identifier: BUSL-1.1
//! # Risk Assessment Gate
//!
//! Validation and delegation layer between assessors and the ledger.
//!
//! The gate owns the "significant change" re-assessment policy: a new score
//! is forwarded only when it differs from the stored score by more than a
//! configurable delta, avoiding needless state churn from noisy re-scoring.
//! Re-assessment of a terminal payment is a no-op, not an error — a lagging
//! scheduler that re-processes a settled payment must not fail its whole
//! cycle.

use std::sync::Arc;

use thiserror::Error;

use veilpay_core::{ActorId, PaymentId, RiskScore};
use veilpay_ledger::{LedgerError, PaymentLedger, PaymentStatus};
use veilpay_policy::AgentRegistry;

/// Default significant-change threshold, in absolute score points.
pub const DEFAULT_SIGNIFICANT_DELTA: u8 = 5;

/// Errors from the assessment gate.
#[derive(Error, Debug)]
pub enum RiskGateError {
    /// The assessor is not in the agent registry.
    #[error("assessor {assessor} is not authorized")]
    Unauthorized {
        /// The rejected assessor identity.
        assessor: ActorId,
    },

    /// The ledger rejected the forwarded assessment.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Gate that validates and forwards risk assessments to the ledger.
pub struct RiskAssessmentGate {
    ledger: Arc<PaymentLedger>,
    agents: Arc<AgentRegistry>,
    significant_delta: u8,
}

impl RiskAssessmentGate {
    /// Create a gate with the default significant-change delta.
    pub fn new(ledger: Arc<PaymentLedger>, agents: Arc<AgentRegistry>) -> Self {
        Self::with_delta(ledger, agents, DEFAULT_SIGNIFICANT_DELTA)
    }

    /// Create a gate with a custom significant-change delta.
    pub fn with_delta(
        ledger: Arc<PaymentLedger>,
        agents: Arc<AgentRegistry>,
        significant_delta: u8,
    ) -> Self {
        Self {
            ledger,
            agents,
            significant_delta,
        }
    }

    /// The configured significant-change delta.
    pub fn significant_delta(&self) -> u8 {
        self.significant_delta
    }

    /// Submit an assessment for a payment.
    ///
    /// Returns `Ok(Some(status))` when the score was forwarded and a status
    /// derived, `Ok(None)` when the assessment was deliberately not
    /// propagated: the payment is terminal, or the score change is within
    /// the significance delta.
    pub fn assess(
        &self,
        payment: PaymentId,
        score: RiskScore,
        assessor: &ActorId,
    ) -> Result<Option<PaymentStatus>, RiskGateError> {
        if !self.agents.is_authorized(assessor) {
            return Err(RiskGateError::Unauthorized {
                assessor: assessor.clone(),
            });
        }

        let view = self.ledger.get_payment(payment)?;
        if view.status.is_terminal() {
            tracing::debug!(payment = %payment, status = %view.status, "skipping assessment of terminal payment");
            return Ok(None);
        }
        if let Some(stored) = view.risk_score {
            if stored.abs_diff(score) <= self.significant_delta {
                tracing::debug!(
                    payment = %payment,
                    stored = %stored,
                    new = %score,
                    "score change within significance delta, not propagated"
                );
                return Ok(None);
            }
        }

        match self.ledger.apply_risk_score(payment, score, assessor) {
            Ok(status) => Ok(Some(status)),
            // The payment reached a terminal state between the read and the
            // write; the no-op contract covers the race.
            Err(LedgerError::AlreadyTerminal { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for RiskAssessmentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskAssessmentGate")
            .field("significant_delta", &self.significant_delta)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use veilpay_core::{RecipientRef, TokenId};
    use veilpay_crypto::EncryptedBlob;
    use veilpay_ledger::CreatePaymentRequest;
    use veilpay_policy::PolicyStore;
    use veilpay_proof::ProofAttestationRegistry;

    struct Harness {
        gate: RiskAssessmentGate,
        ledger: Arc<PaymentLedger>,
        agent: ActorId,
        payer: ActorId,
    }

    fn actor(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    fn score(value: u8) -> RiskScore {
        RiskScore::new(value).unwrap()
    }

    fn harness() -> Harness {
        let admin = actor("0xadmin");
        let agent = actor("0xagent");
        let agents = Arc::new(AgentRegistry::new(admin.clone()));
        agents.set_authorization(&admin, &agent, true).unwrap();
        let ledger = Arc::new(PaymentLedger::new(
            agents.clone(),
            Arc::new(PolicyStore::new()),
            Arc::new(ProofAttestationRegistry::new()),
        ));
        Harness {
            gate: RiskAssessmentGate::new(ledger.clone(), agents),
            ledger,
            agent,
            payer: actor("0xpayer"),
        }
    }

    fn create_payment(h: &Harness) -> PaymentId {
        h.ledger
            .create_payment(CreatePaymentRequest {
                payer: h.payer.clone(),
                recipient_ref: RecipientRef::new("0xrecipient").unwrap(),
                token: TokenId::new("USDC").unwrap(),
                amount: 100,
                encrypted_amount: EncryptedBlob::new(vec![1]),
                encrypted_metadata: EncryptedBlob::new(vec![2]),
                expires_at: None,
            })
            .unwrap()
    }

    #[test]
    fn first_assessment_always_propagates() {
        let h = harness();
        let id = create_payment(&h);
        let result = h.gate.assess(id, score(40), &h.agent).unwrap();
        assert_eq!(result, Some(PaymentStatus::Verified));
    }

    #[test]
    fn insignificant_rescore_is_suppressed() {
        let h = harness();
        let id = create_payment(&h);
        h.gate.assess(id, score(40), &h.agent).unwrap();

        // Within the default delta of 5: not propagated, stored score stays.
        let result = h.gate.assess(id, score(44), &h.agent).unwrap();
        assert_eq!(result, None);
        assert_eq!(h.ledger.get_payment(id).unwrap().risk_score, Some(score(40)));
    }

    #[test]
    fn boundary_delta_is_not_significant() {
        let h = harness();
        let id = create_payment(&h);
        h.gate.assess(id, score(40), &h.agent).unwrap();

        // Exactly delta points apart: still suppressed.
        assert_eq!(h.gate.assess(id, score(45), &h.agent).unwrap(), None);
        // One past the delta: propagated.
        assert_eq!(
            h.gate.assess(id, score(46), &h.agent).unwrap(),
            Some(PaymentStatus::Verified)
        );
    }

    #[test]
    fn significant_rescore_can_flip_status() {
        let h = harness();
        let id = create_payment(&h);
        h.gate.assess(id, score(40), &h.agent).unwrap();

        let result = h.gate.assess(id, score(90), &h.agent).unwrap();
        assert_eq!(result, Some(PaymentStatus::Flagged));

        let result = h.gate.assess(id, score(10), &h.agent).unwrap();
        assert_eq!(result, Some(PaymentStatus::Verified));
    }

    #[test]
    fn terminal_payment_is_a_no_op() {
        let h = harness();
        let id = create_payment(&h);
        h.gate.assess(id, score(40), &h.agent).unwrap();
        h.ledger.complete_payment(id, &h.payer).unwrap();

        let result = h.gate.assess(id, score(95), &h.agent).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn unauthorized_assessor_rejected_before_forwarding() {
        let h = harness();
        let id = create_payment(&h);
        let outsider = actor("0xoutsider");
        assert!(matches!(
            h.gate.assess(id, score(40), &outsider),
            Err(RiskGateError::Unauthorized { .. })
        ));
    }

    #[test]
    fn unknown_payment_propagates_not_found() {
        let h = harness();
        let unknown = PaymentId::from_bytes([9; 32]);
        assert!(matches!(
            h.gate.assess(unknown, score(40), &h.agent),
            Err(RiskGateError::Ledger(LedgerError::NotFound(_)))
        ));
    }

    #[test]
    fn custom_delta_is_respected() {
        let h = harness();
        let gate = RiskAssessmentGate::with_delta(
            h.ledger.clone(),
            Arc::new(AgentRegistry::new(h.agent.clone())),
            0,
        );
        let id = create_payment(&h);
        gate.assess(id, score(40), &h.agent).unwrap();
        // Delta 0: any change of one point propagates.
        assert_eq!(
            gate.assess(id, score(41), &h.agent).unwrap(),
            Some(PaymentStatus::Verified)
        );
    }
}
