// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-proof — Proof Attestation
//!
//! Records zero-knowledge proof submissions and their verification outcome,
//! and prevents re-verification and replay.
//!
//! The cryptographic check itself is a pluggable capability behind the
//! [`ProofVerifier`] trait — this crate places no structural requirement on
//! the proof system beyond "proof material plus public input yields a
//! boolean, deterministically". The registry never assumes success without
//! invoking the capability.

pub mod attestation;
pub mod traits;

#[cfg(feature = "mock")]
pub mod mock;

pub use attestation::{
    AttestationError, AttestationState, BatchOutcome, ProofAttestation, ProofAttestationRegistry,
    ProofFingerprint,
};
pub use traits::{ProofVerifier, VerifyError};
