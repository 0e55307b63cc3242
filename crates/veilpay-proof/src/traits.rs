// SPDX-License-Identifier: BUSL-1.1
//! # Proof Verifier Trait
//!
//! Defines the abstract interface for the external proof-verification
//! capability. All implementations (mock, Groth16, PLONK) must satisfy this
//! trait.
//!
//! ## Security Invariant
//!
//! The trait requires `Send + Sync` bounds for safe concurrent access.
//! Verification is deterministic and side-effect-free from the registry's
//! point of view: the same material and public input always yield the same
//! boolean.
//!
//! A production deployment MUST supply an implementation that performs
//! genuine pairing/curve verification. An implementation that
//! unconditionally returns `true` is a critical-severity placeholder — the
//! shipped [`mock`](crate::mock) is deterministic recomputation, clearly
//! labeled, and suitable only for development.

use thiserror::Error;

/// Error during proof verification.
///
/// A structurally invalid input is an error; a well-formed proof that simply
/// does not verify is `Ok(false)`, not an error.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof material is malformed (wrong length, bad encoding).
    #[error("malformed proof material: {0}")]
    MalformedProof(String),

    /// The verifying key is incompatible with the proof.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
}

/// Abstract interface for a zero-knowledge proof verification capability.
pub trait ProofVerifier: Send + Sync {
    /// Verify proof material against a public input.
    ///
    /// Returns `Ok(true)` if the proof verifies, `Ok(false)` if it is
    /// well-formed but invalid, and `Err` only for structurally malformed
    /// input.
    fn verify(&self, material: &[u8], public_input: &[u8]) -> Result<bool, VerifyError>;
}
