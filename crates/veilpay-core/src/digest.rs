// SPDX-License-Identifier: BUSL-1.1
//! # Digest Accumulation — Domain-Separated SHA-256
//!
//! Defines [`Sha256Accumulator`], the single digest-computation path for all
//! derived identifiers in the settlement core (payment identifiers, proof
//! fingerprints).
//!
//! ## Security Invariant
//!
//! Every identifier derivation starts the accumulator with a domain
//! separator before feeding content bytes. Two identifiers derived from the
//! same content bytes under different domains can never collide.

use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Incremental SHA-256 accumulator for composite digest inputs.
///
/// Used wherever a digest is computed over a concatenation of heterogeneous
/// fields (identity strings, integers, raw bytes). Callers feed fields in a
/// fixed order; the order is part of the derivation contract.
#[derive(Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Create an accumulator seeded with a domain separator.
    ///
    /// The separator is hashed first, before any content bytes, so digests
    /// computed under different domains are disjoint by construction.
    pub fn with_domain(domain: &str) -> Self {
        let mut acc = Self::new();
        acc.update(domain.as_bytes());
        acc
    }

    /// Feed bytes into the accumulator.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Feed a `u64` in big-endian encoding.
    ///
    /// Fixed-width encoding keeps the byte stream unambiguous — `1u64`
    /// followed by `2u64` cannot collide with `12u64`.
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_be_bytes());
    }

    /// Finalize into a 32-byte digest.
    pub fn finalize(self) -> [u8; 32] {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        bytes
    }

    /// Finalize into a lowercase hex string.
    pub fn finalize_hex(self) -> String {
        to_hex(&self.finalize())
    }
}

impl std::fmt::Debug for Sha256Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256Accumulator").finish_non_exhaustive()
    }
}

/// Render bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a 64-character hex string into a 32-byte array.
pub fn parse_hex32(s: &str) -> Result<[u8; 32], CoreError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    if !s.is_ascii() {
        return Err(CoreError::InvalidHex("non-ASCII input".into()));
    }
    if s.len() != 64 {
        return Err(CoreError::InvalidHex(format!(
            "expected 64 hex chars, got {}",
            s.len()
        )));
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in bytes.iter_mut().enumerate() {
        let pair = &s[i * 2..i * 2 + 2];
        *chunk = u8::from_str_radix(pair, 16)
            .map_err(|_| CoreError::InvalidHex(format!("non-hex characters in {pair:?}")))?;
    }
    Ok(bytes)
}
