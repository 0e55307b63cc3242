// SPDX-License-Identifier: BUSL-1.1
//! # Payment Events — Audit Surface
//!
//! Every state change emits an event carrying the payment identifier and
//! enough context for an external auditor to reconstruct the full
//! transition history without decrypting payment content. Events are
//! appended to the ledger's in-process log and emitted as structured
//! `tracing` records.

use serde::{Deserialize, Serialize};

use veilpay_core::{ActorId, PaymentId, RiskScore, Timestamp, TokenId};
use veilpay_proof::ProofFingerprint;

use crate::status::PaymentStatus;

/// An audit event on a payment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentEvent {
    /// A payment was created in `Pending`.
    Created {
        /// The new payment.
        payment: PaymentId,
        /// The submitting payer.
        payer: ActorId,
        /// Token the payment is denominated in.
        token: TokenId,
        /// Creation timestamp.
        at: Timestamp,
    },
    /// A risk score was applied and the status re-derived.
    RiskUpdated {
        /// The assessed payment.
        payment: PaymentId,
        /// The recorded score.
        score: RiskScore,
        /// The status after the assessment.
        status: PaymentStatus,
        /// The assessing agent.
        assessor: ActorId,
        /// Assessment timestamp.
        at: Timestamp,
    },
    /// A verified proof attestation was attached.
    ProofVerified {
        /// The payment the proof binds to.
        payment: PaymentId,
        /// The verified proof's fingerprint.
        fingerprint: ProofFingerprint,
        /// The agent that linked the proof.
        agent: ActorId,
        /// Attachment timestamp.
        at: Timestamp,
    },
    /// The payment settled.
    Completed {
        /// The settled payment.
        payment: PaymentId,
        /// Settlement timestamp.
        at: Timestamp,
    },
    /// The payment was refunded.
    Refunded {
        /// The refunded payment.
        payment: PaymentId,
        /// The refunding agent.
        agent: ActorId,
        /// Recorded reason.
        reason: String,
        /// Refund timestamp.
        at: Timestamp,
    },
    /// The payment failed terminally.
    Failed {
        /// The failed payment.
        payment: PaymentId,
        /// The agent that recorded the failure.
        agent: ActorId,
        /// Recorded reason.
        reason: String,
        /// Failure timestamp.
        at: Timestamp,
    },
}

impl PaymentEvent {
    /// The payment this event concerns.
    pub fn payment_id(&self) -> PaymentId {
        match self {
            Self::Created { payment, .. }
            | Self::RiskUpdated { payment, .. }
            | Self::ProofVerified { payment, .. }
            | Self::Completed { payment, .. }
            | Self::Refunded { payment, .. }
            | Self::Failed { payment, .. } => *payment,
        }
    }

    /// Dotted event-kind string for log routing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created { .. } => "payment.created",
            Self::RiskUpdated { .. } => "payment.risk_updated",
            Self::ProofVerified { .. } => "payment.proof_verified",
            Self::Completed { .. } => "payment.completed",
            Self::Refunded { .. } => "payment.refunded",
            Self::Failed { .. } => "payment.failed",
        }
    }
}
