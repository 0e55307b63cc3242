// SPDX-License-Identifier: BUSL-1.1
//! # Envelope Cipher Boundary
//!
//! Defines [`EncryptedBlob`] — the opaque ciphertext unit stored on payment
//! records — and [`EnvelopeCipher`], the capability trait a symmetric cipher
//! implementation satisfies.
//!
//! ## Security Invariant
//!
//! The settlement core never inspects, parses, or validates ciphertext
//! content. The only structural check anywhere in the workspace is
//! [`EncryptedBlob::is_empty`], which the ledger uses to reject payments
//! submitted without an encrypted amount.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from cipher operations at the boundary.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed — wrong key material or corrupted ciphertext.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// An opaque ciphertext blob.
///
/// Serialized as lowercase hex so encrypted payloads survive JSON transport
/// without base64 ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    /// Wrap raw ciphertext bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Whether the blob is empty (no ciphertext at all).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ciphertext length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Access the raw ciphertext bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for EncryptedBlob {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let hex: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&hex)
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if !s.is_ascii() {
            return Err(serde::de::Error::custom("non-ASCII hex string"));
        }
        if s.len() % 2 != 0 {
            return Err(serde::de::Error::custom("odd-length hex string"));
        }
        let bytes = (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(serde::de::Error::custom))
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(Self(bytes))
    }
}

/// Capability trait for the symmetric cipher supplied at integration time.
///
/// Cipher correctness is assumed, not re-verified, by the settlement core
/// — implementations own their own nonce/key hygiene. `Send + Sync` so a
/// single cipher instance can serve concurrent actors.
pub trait EnvelopeCipher: Send + Sync {
    /// Encrypt plaintext under the given recipient key material.
    fn encrypt(&self, plaintext: &[u8], key_material: &[u8]) -> Result<EncryptedBlob, CipherError>;

    /// Decrypt a blob with the given key material.
    fn decrypt(&self, blob: &EncryptedBlob, key_material: &[u8]) -> Result<Vec<u8>, CipherError>;
}
