// SPDX-License-Identifier: BUSL-1.1
//! # Payment Records
//!
//! The ledger's unit of state. Once created, payer, recipient reference,
//! token, and amount are immutable — only status, risk score, and proof
//! linkage mutate, and only through [`PaymentLedger`](crate::PaymentLedger)
//! operations. Records are never physically deleted; terminal records stay
//! for audit.
//!
//! [`PaymentView`] is the read surface: it carries the encrypted blobs and
//! status/score but never the cleartext amount, preserving the privacy
//! contract even for authorized readers without decryption capability.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use veilpay_core::{ActorId, PaymentId, RecipientRef, RiskScore, Timestamp, TokenId};
use veilpay_crypto::EncryptedBlob;
use veilpay_proof::ProofFingerprint;

use crate::error::LedgerError;
use crate::status::PaymentStatus;

/// Record of a single status transition, kept on the payment for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Unique identifier of this transition.
    pub transition_id: Uuid,
    /// Status before the transition.
    pub from_status: PaymentStatus,
    /// Status after the transition.
    pub to_status: PaymentStatus,
    /// When the transition occurred (UTC).
    pub at: Timestamp,
    /// Human-readable note (refund reason, assessor identity).
    pub note: Option<String>,
}

/// Inputs for creating a payment. Identity fields arrive as validated
/// newtypes; the ledger checks only what the types cannot express.
#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    /// The submitting payer.
    pub payer: ActorId,
    /// Opaque recipient reference (may be a privacy-preserving hash).
    pub recipient_ref: RecipientRef,
    /// Token the payment is denominated in.
    pub token: TokenId,
    /// Cleartext amount in the token's smallest unit. Folded into the
    /// payment identifier; never exposed through views.
    pub amount: u64,
    /// Encrypted amount blob.
    pub encrypted_amount: EncryptedBlob,
    /// Encrypted metadata blob.
    pub encrypted_metadata: EncryptedBlob,
    /// Optional expiry; a `Pending` payment past this instant is eligible
    /// for the orchestrator's timeout refund.
    pub expires_at: Option<Timestamp>,
}

/// The durable payment record. Serialized shape is the persisted-state
/// boundary — version it for upgrade compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Content-derived identifier, unique for the ledger lifetime.
    pub id: PaymentId,
    /// The original payer. Only this identity may complete the payment.
    pub payer: ActorId,
    /// Opaque recipient reference.
    pub recipient_ref: RecipientRef,
    /// Token identifier.
    pub token: TokenId,
    /// Cleartext amount. Excluded from [`PaymentView`].
    pub amount: u64,
    /// Encrypted amount blob (opaque to the ledger).
    pub encrypted_amount: EncryptedBlob,
    /// Encrypted metadata blob (opaque to the ledger).
    pub encrypted_metadata: EncryptedBlob,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Most recent risk score. Absent until assessed; re-assessment
    /// overwrites.
    pub risk_score: Option<RiskScore>,
    /// Fingerprint of the verified proof attached to this payment.
    pub proof: Option<ProofFingerprint>,
    /// Reason recorded on refund.
    pub refund_reason: Option<String>,
    /// When the payment was created.
    pub created_at: Timestamp,
    /// When the payment last mutated.
    pub updated_at: Timestamp,
    /// Optional expiry for the `Pending` timeout refund.
    pub expires_at: Option<Timestamp>,
    /// Immutable log of all status transitions.
    pub transitions: Vec<TransitionRecord>,
}

impl Payment {
    /// Apply a status transition, validating it against the lifecycle
    /// machine and recording it in the transition log.
    pub(crate) fn transition(
        &mut self,
        to: PaymentStatus,
        note: Option<String>,
    ) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(to) {
            return Err(LedgerError::InvalidState {
                payment: self.id,
                status: self.status,
                reason: format!("transition to {to} is not allowed"),
            });
        }
        let at = Timestamp::now();
        self.transitions.push(TransitionRecord {
            transition_id: Uuid::new_v4(),
            from_status: self.status,
            to_status: to,
            at,
            note,
        });
        self.status = to;
        self.updated_at = at;
        Ok(())
    }

    /// Whether the payment is past its expiry and still `Pending`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.status == PaymentStatus::Pending
            && self.expires_at.map(|deadline| now > deadline).unwrap_or(false)
    }
}

/// Read-only projection of a payment.
///
/// Carries the encrypted blobs, status, and score — never the cleartext
/// amount or decrypted metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentView {
    /// Payment identifier.
    pub id: PaymentId,
    /// The original payer.
    pub payer: ActorId,
    /// Opaque recipient reference.
    pub recipient_ref: RecipientRef,
    /// Token identifier.
    pub token: TokenId,
    /// Encrypted amount blob.
    pub encrypted_amount: EncryptedBlob,
    /// Encrypted metadata blob.
    pub encrypted_metadata: EncryptedBlob,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Most recent risk score, if assessed.
    pub risk_score: Option<RiskScore>,
    /// Attached verified proof, if any.
    pub proof: Option<ProofFingerprint>,
    /// Reason recorded on refund, if refunded.
    pub refund_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last mutation timestamp.
    pub updated_at: Timestamp,
    /// Expiry, if set.
    pub expires_at: Option<Timestamp>,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            payer: payment.payer.clone(),
            recipient_ref: payment.recipient_ref.clone(),
            token: payment.token.clone(),
            encrypted_amount: payment.encrypted_amount.clone(),
            encrypted_metadata: payment.encrypted_metadata.clone(),
            status: payment.status,
            risk_score: payment.risk_score,
            proof: payment.proof,
            refund_reason: payment.refund_reason.clone(),
            created_at: payment.created_at,
            updated_at: payment.updated_at,
            expires_at: payment.expires_at,
        }
    }
}
