// SPDX-License-Identifier: BUSL-1.1
//! # Proof Attestation Registry
//!
//! Records proof submissions and their verification outcome, keyed by a
//! deterministic fingerprint of the proof's canonical byte encoding.
//!
//! ## Invariants
//!
//! - A fingerprint is submitted at most once — no overwrite, even by the
//!   same submitter. The first submission's public input is what stays.
//! - Verification is decided at most once. Both outcomes (`Verified`,
//!   `Failed`) are one-way latches; a failed proof is never retried under
//!   the same fingerprint — a corrected proof has a different fingerprint
//!   and enters fresh.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilpay_core::{parse_hex32, to_hex, ActorId, Sha256Accumulator, Timestamp};
use veilpay_policy::AgentRegistry;

/// Domain separator for proof fingerprints.
const FINGERPRINT_DOMAIN: &str = "veilpay/proof-fingerprint/v1";

/// Deterministic hash identifying a specific proof submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofFingerprint(pub [u8; 32]);

impl ProofFingerprint {
    /// Derive the fingerprint of a proof's canonical byte encoding.
    pub fn from_material(material: &[u8]) -> Self {
        let mut acc = Sha256Accumulator::with_domain(FINGERPRINT_DOMAIN);
        acc.update(material);
        Self(acc.finalize())
    }

    /// Wrap raw fingerprint bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-character hex string.
    pub fn parse(s: &str) -> Result<Self, veilpay_core::CoreError> {
        Ok(Self(parse_hex32(s)?))
    }

    /// Whether the fingerprint is the all-zero placeholder.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Display for ProofFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "proof:{}", self.to_hex())
    }
}

/// Verification state of an attestation.
///
/// `Pending → Verified | Failed`; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationState {
    /// Submitted, not yet decided by a verifying agent.
    Pending,
    /// The external capability confirmed the proof. Terminal.
    Verified,
    /// The external capability rejected the proof. Terminal.
    Failed,
}

impl AttestationState {
    /// Whether the verification outcome has been decided.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for AttestationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A recorded proof submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofAttestation {
    /// Fingerprint of the proof's canonical byte encoding.
    pub fingerprint: ProofFingerprint,
    /// The public input the proof binds to.
    pub public_input: Vec<u8>,
    /// Identity that submitted the proof.
    pub submitter: ActorId,
    /// The agent that decided verification. Absent until decided.
    pub verifier: Option<ActorId>,
    /// Current verification state.
    pub state: AttestationState,
    /// When the proof was submitted.
    pub submitted_at: Timestamp,
    /// When verification was decided. Absent until decided.
    pub decided_at: Option<Timestamp>,
}

/// Errors from attestation-registry operations.
#[derive(Error, Debug)]
pub enum AttestationError {
    /// Malformed input (all-zero fingerprint, mismatched batch arrays).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The fingerprint is not in the registry.
    #[error("unknown proof fingerprint: {0}")]
    NotFound(ProofFingerprint),

    /// The caller lacks agent authorization.
    #[error("agent {agent} is not authorized to verify proofs")]
    Unauthorized {
        /// The rejected agent identity.
        agent: ActorId,
    },

    /// Write-once violation: resubmission or re-verification.
    #[error("conflict on {fingerprint}: {reason}")]
    Conflict {
        /// The fingerprint involved.
        fingerprint: ProofFingerprint,
        /// What was attempted twice.
        reason: String,
    },
}

/// Per-entry summary of a [`ProofAttestationRegistry::batch_verify`] sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Entries whose verification was recorded.
    pub applied: usize,
    /// Entries skipped: unknown fingerprint or already decided.
    pub skipped: usize,
}

/// Write-once registry of proof submissions and their verification outcome.
#[derive(Debug, Default)]
pub struct ProofAttestationRegistry {
    attestations: DashMap<ProofFingerprint, ProofAttestation>,
}

impl ProofAttestationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a proof submission.
    ///
    /// Write-once: a fingerprint already in the registry conflicts, even
    /// for the same submitter.
    pub fn submit(
        &self,
        fingerprint: ProofFingerprint,
        public_input: Vec<u8>,
        submitter: ActorId,
    ) -> Result<(), AttestationError> {
        if fingerprint.is_zero() {
            return Err(AttestationError::InvalidInput(
                "proof fingerprint must not be all-zero".into(),
            ));
        }

        // Entry API keeps check-and-insert atomic under the shard lock.
        match self.attestations.entry(fingerprint) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AttestationError::Conflict {
                fingerprint,
                reason: "proof already submitted".into(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(ProofAttestation {
                    fingerprint,
                    public_input,
                    submitter,
                    verifier: None,
                    state: AttestationState::Pending,
                    submitted_at: Timestamp::now(),
                    decided_at: None,
                });
                Ok(())
            }
        }
    }

    /// Record a verification outcome for a submitted proof.
    ///
    /// One-way latch: once decided (`Verified` or `Failed`), a fingerprint
    /// can never be re-decided. Returns the resulting state.
    pub fn verify(
        &self,
        fingerprint: ProofFingerprint,
        verifier: &ActorId,
        is_valid: bool,
        agents: &AgentRegistry,
    ) -> Result<AttestationState, AttestationError> {
        if !agents.is_authorized(verifier) {
            return Err(AttestationError::Unauthorized {
                agent: verifier.clone(),
            });
        }

        let mut entry = self
            .attestations
            .get_mut(&fingerprint)
            .ok_or(AttestationError::NotFound(fingerprint))?;

        let attestation = entry.value_mut();
        if attestation.state.is_decided() {
            return Err(AttestationError::Conflict {
                fingerprint,
                reason: format!("verification already decided as {}", attestation.state),
            });
        }

        attestation.state = if is_valid {
            AttestationState::Verified
        } else {
            AttestationState::Failed
        };
        attestation.verifier = Some(verifier.clone());
        attestation.decided_at = Some(Timestamp::now());
        Ok(attestation.state)
    }

    /// Best-effort administrative sweep over many verification results.
    ///
    /// Fails `InvalidInput` only when the arrays differ in length.
    /// Per entry, unknown or already-decided fingerprints are silently
    /// skipped — a batch is not an atomic unit and never rolls back.
    pub fn batch_verify(
        &self,
        fingerprints: &[ProofFingerprint],
        results: &[bool],
        verifier: &ActorId,
        agents: &AgentRegistry,
    ) -> Result<BatchOutcome, AttestationError> {
        if fingerprints.len() != results.len() {
            return Err(AttestationError::InvalidInput(format!(
                "batch length mismatch: {} fingerprints, {} results",
                fingerprints.len(),
                results.len()
            )));
        }
        if !agents.is_authorized(verifier) {
            return Err(AttestationError::Unauthorized {
                agent: verifier.clone(),
            });
        }

        let mut outcome = BatchOutcome::default();
        for (fingerprint, &is_valid) in fingerprints.iter().zip(results) {
            match self.verify(*fingerprint, verifier, is_valid, agents) {
                Ok(_) => outcome.applied += 1,
                Err(AttestationError::NotFound(_) | AttestationError::Conflict { .. }) => {
                    outcome.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    /// Look up an attestation by fingerprint.
    pub fn get(&self, fingerprint: &ProofFingerprint) -> Option<ProofAttestation> {
        self.attestations
            .get(fingerprint)
            .map(|entry| entry.value().clone())
    }

    /// Number of recorded attestations.
    pub fn len(&self) -> usize {
        self.attestations.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(s: &str) -> ActorId {
        ActorId::new(s).unwrap()
    }

    fn registry_with_agent() -> (ProofAttestationRegistry, AgentRegistry, ActorId) {
        let admin = actor("0xadmin");
        let agent = actor("0xagent");
        let agents = AgentRegistry::new(admin.clone());
        agents.set_authorization(&admin, &agent, true).unwrap();
        (ProofAttestationRegistry::new(), agents, agent)
    }

    fn fp(byte: u8) -> ProofFingerprint {
        ProofFingerprint::from_bytes([byte; 32])
    }

    #[test]
    fn submit_rejects_zero_fingerprint() {
        let registry = ProofAttestationRegistry::new();
        let result = registry.submit(fp(0), vec![1], actor("0xsub"));
        assert!(matches!(result, Err(AttestationError::InvalidInput(_))));
    }

    #[test]
    fn resubmission_conflicts_and_keeps_first_public_input() {
        let registry = ProofAttestationRegistry::new();
        let submitter = actor("0xsub");
        registry.submit(fp(1), vec![0xaa], submitter.clone()).unwrap();

        let second = registry.submit(fp(1), vec![0xbb], submitter);
        assert!(matches!(second, Err(AttestationError::Conflict { .. })));

        // The stored attestation still carries the first submission's input.
        let stored = registry.get(&fp(1)).unwrap();
        assert_eq!(stored.public_input, vec![0xaa]);
    }

    #[test]
    fn verify_requires_authorization() {
        let (registry, agents, _agent) = registry_with_agent();
        registry.submit(fp(1), vec![], actor("0xsub")).unwrap();

        let outsider = actor("0xoutsider");
        let result = registry.verify(fp(1), &outsider, true, &agents);
        assert!(matches!(result, Err(AttestationError::Unauthorized { .. })));
    }

    #[test]
    fn verify_unknown_fingerprint_not_found() {
        let (registry, agents, agent) = registry_with_agent();
        let result = registry.verify(fp(9), &agent, true, &agents);
        assert!(matches!(result, Err(AttestationError::NotFound(_))));
    }

    #[test]
    fn verification_latches_one_way() {
        let (registry, agents, agent) = registry_with_agent();
        registry.submit(fp(1), vec![], actor("0xsub")).unwrap();

        let state = registry.verify(fp(1), &agent, true, &agents).unwrap();
        assert_eq!(state, AttestationState::Verified);

        // Neither re-confirmation nor reversal is possible.
        let again = registry.verify(fp(1), &agent, true, &agents);
        assert!(matches!(again, Err(AttestationError::Conflict { .. })));
        let revert = registry.verify(fp(1), &agent, false, &agents);
        assert!(matches!(revert, Err(AttestationError::Conflict { .. })));
        assert_eq!(registry.get(&fp(1)).unwrap().state, AttestationState::Verified);
    }

    #[test]
    fn failed_verification_latches_too() {
        let (registry, agents, agent) = registry_with_agent();
        registry.submit(fp(2), vec![], actor("0xsub")).unwrap();

        let state = registry.verify(fp(2), &agent, false, &agents).unwrap();
        assert_eq!(state, AttestationState::Failed);

        let retry = registry.verify(fp(2), &agent, true, &agents);
        assert!(matches!(retry, Err(AttestationError::Conflict { .. })));
    }

    #[test]
    fn verify_records_the_deciding_agent() {
        let (registry, agents, agent) = registry_with_agent();
        registry.submit(fp(1), vec![], actor("0xsub")).unwrap();
        registry.verify(fp(1), &agent, true, &agents).unwrap();

        let stored = registry.get(&fp(1)).unwrap();
        assert_eq!(stored.verifier, Some(agent));
        assert!(stored.decided_at.is_some());
    }

    #[test]
    fn batch_verify_length_mismatch() {
        let (registry, agents, agent) = registry_with_agent();
        let result = registry.batch_verify(&[fp(1), fp(2)], &[true], &agent, &agents);
        assert!(matches!(result, Err(AttestationError::InvalidInput(_))));
    }

    #[test]
    fn batch_verify_skips_unknown_and_decided() {
        let (registry, agents, agent) = registry_with_agent();
        registry.submit(fp(1), vec![], actor("0xsub")).unwrap();
        registry.submit(fp(2), vec![], actor("0xsub")).unwrap();
        registry.verify(fp(2), &agent, true, &agents).unwrap();

        // fp(1) fresh, fp(2) already decided, fp(3) unknown.
        let outcome = registry
            .batch_verify(&[fp(1), fp(2), fp(3)], &[true, true, false], &agent, &agents)
            .unwrap();
        assert_eq!(outcome, BatchOutcome { applied: 1, skipped: 2 });
        assert_eq!(registry.get(&fp(1)).unwrap().state, AttestationState::Verified);
    }

    #[test]
    fn batch_verify_requires_authorization_up_front() {
        let registry = ProofAttestationRegistry::new();
        let agents = AgentRegistry::new(actor("0xadmin"));
        let outsider = actor("0xoutsider");
        let result = registry.batch_verify(&[fp(1)], &[true], &outsider, &agents);
        assert!(matches!(result, Err(AttestationError::Unauthorized { .. })));
    }

    #[test]
    fn fingerprint_derivation_is_deterministic() {
        let a = ProofFingerprint::from_material(b"proof bytes");
        let b = ProofFingerprint::from_material(b"proof bytes");
        let c = ProofFingerprint::from_material(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_zero());
    }

    #[test]
    fn fingerprint_hex_roundtrip() {
        let fingerprint = ProofFingerprint::from_material(b"proof");
        let parsed = ProofFingerprint::parse(&fingerprint.to_hex()).unwrap();
        assert_eq!(fingerprint, parsed);
    }

    #[test]
    fn attestation_serde_roundtrip() {
        let (registry, agents, agent) = registry_with_agent();
        registry.submit(fp(1), vec![0xab], actor("0xsub")).unwrap();
        registry.verify(fp(1), &agent, true, &agents).unwrap();

        let attestation = registry.get(&fp(1)).unwrap();
        let json = serde_json::to_string(&attestation).unwrap();
        let parsed: ProofAttestation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.fingerprint, attestation.fingerprint);
        assert_eq!(parsed.state, AttestationState::Verified);
        assert_eq!(parsed.public_input, vec![0xab]);
    }
}
