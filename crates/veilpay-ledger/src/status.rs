// SPDX-License-Identifier: BUSL-1.1
//! # Payment Lifecycle States
//!
//! Runtime-checked status machine for payment records.
//!
//! ## Allowed Transitions
//!
//! ```text
//! Pending ──▶ Verified ──▶ Completed
//!    │    ╲      │ ▲  ╲──▶ Failed
//!    │     ╲     ▼ │
//!    │      ▶ Flagged
//!    │           │
//!    └───────────┴──────▶ Refunded
//! ```
//!
//! - `Pending → Verified | Flagged` — first risk assessment.
//! - `Verified ↔ Flagged` — risk re-assessment only.
//! - `Verified → Completed` — payer-initiated settlement.
//! - `Verified → Failed` — the required proof definitively failed
//!   verification.
//! - `Pending | Verified | Flagged → Refunded` — agent-initiated refund.
//!
//! A flagged payment can never complete; its only terminal exit is a
//! refund. `Completed`, `Refunded`, and `Failed` are terminal — records in
//! these states are retained forever for audit and never mutate again.

use serde::{Deserialize, Serialize};

/// Status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, awaiting risk assessment.
    Pending,
    /// Risk-assessed below the payer's threshold; completion-eligible once
    /// policy requirements (proof attestation) are met.
    Verified,
    /// Risk-assessed at or above the threshold. Blocks payer completion;
    /// permits agent refund.
    Flagged,
    /// Settled by the payer. Terminal.
    Completed,
    /// Returned by an authorized agent. Terminal.
    Refunded,
    /// Required proof definitively failed verification. Terminal.
    Failed,
}

impl PaymentStatus {
    /// Whether this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded | Self::Failed)
    }

    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Flagged => "FLAGGED",
            Self::Completed => "COMPLETED",
            Self::Refunded => "REFUNDED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether a transition from `self` to `to` is allowed.
    ///
    /// No wildcard on the source side — adding a variant forces this match
    /// to be revisited rather than silently falling through.
    pub fn can_transition_to(&self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Verified)
                | (Self::Pending, Self::Flagged)
                | (Self::Pending, Self::Refunded)
                | (Self::Verified, Self::Flagged)
                | (Self::Verified, Self::Completed)
                | (Self::Verified, Self::Refunded)
                | (Self::Verified, Self::Failed)
                | (Self::Flagged, Self::Verified)
                | (Self::Flagged, Self::Refunded)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
