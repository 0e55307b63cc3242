// SPDX-License-Identifier: BUSL-1.1
//! # Transparent Mock Cipher (development only)
//!
//! A pass-through "cipher" that tags and stores the plaintext unchanged.
//! Exists so the settlement flow can be exercised end-to-end in tests and
//! development environments without provisioning a real cipher.
//!
//! ## Security Warning
//!
//! **NOT CONFIDENTIAL.** The mock cipher provides no encryption at all —
//! the plaintext is recoverable by anyone holding the blob. It MUST NOT be
//! used in any context where payload privacy is required. Production
//! deployments supply a real [`EnvelopeCipher`] implementation at
//! integration time.

use crate::cipher::{CipherError, EncryptedBlob, EnvelopeCipher};

/// Prefix marking mock ciphertext so it can never be mistaken for real output.
const MOCK_TAG: &[u8] = b"mock-cipher-v1:";

/// Transparent development cipher. Tags plaintext; decryption strips the tag.
#[derive(Debug, Default)]
pub struct TransparentCipher;

impl EnvelopeCipher for TransparentCipher {
    fn encrypt(&self, plaintext: &[u8], _key_material: &[u8]) -> Result<EncryptedBlob, CipherError> {
        let mut bytes = MOCK_TAG.to_vec();
        bytes.extend_from_slice(plaintext);
        Ok(EncryptedBlob::new(bytes))
    }

    fn decrypt(&self, blob: &EncryptedBlob, _key_material: &[u8]) -> Result<Vec<u8>, CipherError> {
        blob.as_bytes()
            .strip_prefix(MOCK_TAG)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                CipherError::DecryptionFailed("blob was not produced by the mock cipher".into())
            })
    }
}
