// SPDX-License-Identifier: BUSL-1.1
//! # Privacy Policy Store
//!
//! Per-payer configuration governing what a payment must pass before it can
//! complete: whether a proof attestation is mandatory, whether risk checking
//! is mandatory, the risk threshold, and whether metadata must arrive
//! encrypted.
//!
//! ## Security Invariant
//!
//! A policy is stored under the *authenticated caller* identity. There is no
//! API that writes a policy for an arbitrary payer — the caller IS the key.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use veilpay_core::{ActorId, RiskScore};

/// Per-payer privacy policy.
///
/// The threshold is a [`RiskScore`], so an out-of-range value is rejected at
/// construction — there is no separate range check at store time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyPolicy {
    /// Whether a verified proof attestation is required before completion.
    pub proof_required: bool,
    /// Whether a risk assessment is mandatory before completion.
    pub risk_check_required: bool,
    /// Scores at or above this threshold flag the payment.
    pub risk_threshold: RiskScore,
    /// Whether payment metadata must be submitted encrypted.
    pub metadata_encryption_required: bool,
    /// Whether a verified proof completes the payment directly, without a
    /// separate payer-initiated completion step. Off by default — proof
    /// verification and completion are distinct, separately-authorized
    /// transitions unless the payer opts in.
    pub auto_complete_on_proof: bool,
}

impl Default for PrivacyPolicy {
    fn default() -> Self {
        Self {
            proof_required: false,
            risk_check_required: true,
            risk_threshold: RiskScore::DEFAULT_THRESHOLD,
            metadata_encryption_required: true,
            auto_complete_on_proof: false,
        }
    }
}

/// Store of per-payer privacy policies. Returns system defaults for payers
/// that never set one.
#[derive(Debug, Default)]
pub struct PolicyStore {
    policies: DashMap<ActorId, PrivacyPolicy>,
}

impl PolicyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the calling payer's own policy.
    ///
    /// The policy is keyed by `caller` — the authenticated identity — so a
    /// payer can never overwrite another payer's policy.
    pub fn set_policy(&self, caller: &ActorId, policy: PrivacyPolicy) {
        self.policies.insert(caller.clone(), policy);
    }

    /// The policy in effect for a payer: stored, or system defaults.
    pub fn policy_for(&self, payer: &ActorId) -> PrivacyPolicy {
        self.policies
            .get(payer)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether the payer has an explicitly stored policy.
    pub fn has_policy(&self, payer: &ActorId) -> bool {
        self.policies.contains_key(payer)
    }
}
