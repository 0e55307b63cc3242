// SPDX-License-Identifier: BUSL-1.1
//! # Mock Proof Verifier (development only)
//!
//! A deterministic, transparent verifier for development and testing.
//! Proof material is the hex-encoded SHA-256 digest of the public input
//! under a fixed domain separator; verification recomputes the digest and
//! checks equality.
//!
//! ## Security Warning
//!
//! **NOT ZERO-KNOWLEDGE.** The mock verifier is transparent — anyone can
//! produce "proof" material from the public input alone. It satisfies the
//! [`ProofVerifier`] contract so the settlement flow can be exercised end to
//! end, and nothing more. It MUST be replaced with a real pairing-check
//! implementation at integration time.

use veilpay_core::Sha256Accumulator;

use crate::traits::{ProofVerifier, VerifyError};

/// Domain separator for mock proof digests.
const MOCK_PROOF_DOMAIN: &str = "veilpay/mock-proof/v1";

/// Deterministic recomputation verifier. Development only.
#[derive(Debug, Default)]
pub struct MockVerifier;

impl MockVerifier {
    /// Produce mock proof material for a public input.
    ///
    /// The returned bytes are what [`ProofVerifier::verify`] accepts as
    /// valid material for the same public input.
    pub fn prove(public_input: &[u8]) -> Vec<u8> {
        let mut acc = Sha256Accumulator::with_domain(MOCK_PROOF_DOMAIN);
        acc.update(public_input);
        acc.finalize_hex().into_bytes()
    }
}

impl ProofVerifier for MockVerifier {
    fn verify(&self, material: &[u8], public_input: &[u8]) -> Result<bool, VerifyError> {
        let material = std::str::from_utf8(material)
            .map_err(|_| VerifyError::MalformedProof("material is not valid UTF-8".into()))?;

        if material.len() != 64 {
            return Err(VerifyError::MalformedProof(format!(
                "expected 64 hex chars, got {}",
                material.len()
            )));
        }
        if !material.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(VerifyError::MalformedProof(
                "material contains non-hex characters".into(),
            ));
        }

        let mut acc = Sha256Accumulator::with_domain(MOCK_PROOF_DOMAIN);
        acc.update(public_input);
        Ok(acc.finalize_hex() == material)
    }
}
