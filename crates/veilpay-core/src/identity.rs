// SPDX-License-Identifier: BUSL-1.1
//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the settlement core.
//! These prevent accidental identifier confusion — you cannot pass a
//! `TokenId` where an `ActorId` is expected.
//!
//! ## Security Invariant
//!
//! Type-level distinction between identifier namespaces prevents
//! cross-namespace confusion attacks where an attacker substitutes one kind
//! of identifier for another. Validated constructors reject empty and
//! all-zero inputs at the boundary, so downstream code never re-checks.

use serde::{Deserialize, Serialize};

use crate::digest::{parse_hex32, to_hex};
use crate::error::CoreError;

/// Identity of an actor in the system: a payer, an authorized agent, or the
/// administrative authority.
///
/// The inner string is opaque to the core — it may be a chain address, a
/// service-account name, or any stable identity string. Construction rejects
/// empty input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(String);

impl ActorId {
    /// Create an actor identity. Rejects empty strings.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier(
                "actor identity must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Access the inner identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor:{}", self.0)
    }
}

/// Identifier for the token a payment is denominated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(String);

impl TokenId {
    /// Create a token identifier. Rejects empty strings.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier(
                "token identifier must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Access the inner token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

/// Opaque recipient reference.
///
/// May be a privacy-preserving hash rather than a raw address — the core
/// never interprets it. Construction rejects empty input and all-zero
/// placeholder values (`""`, `"0x0000…"`), which the ledger treats as
/// malformed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientRef(String);

impl RecipientRef {
    /// Create a recipient reference. Rejects empty and all-zero input.
    pub fn new(reference: impl Into<String>) -> Result<Self, CoreError> {
        let reference = reference.into();
        if reference.trim().is_empty() {
            return Err(CoreError::InvalidRecipientRef(
                "recipient reference must not be empty".into(),
            ));
        }
        let stripped = reference.strip_prefix("0x").unwrap_or(&reference);
        if !stripped.is_empty() && stripped.chars().all(|c| c == '0') {
            return Err(CoreError::InvalidRecipientRef(
                "recipient reference must not be all-zero".into(),
            ));
        }
        Ok(Self(reference))
    }

    /// Access the inner reference string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecipientRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-derived payment identifier.
///
/// A 32-byte digest over the payment's immutable fields plus a per-ledger
/// sequence counter and random salt. Unique and collision-free for the
/// lifetime of the ledger; the derivation lives in `veilpay-ledger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub [u8; 32]);

impl PaymentId {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse from a 64-character hex string (optionally `0x`-prefixed).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        Ok(Self(parse_hex32(s)?))
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "payment:{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_id_rejects_empty() {
        assert!(ActorId::new("").is_err());
        assert!(ActorId::new("   ").is_err());
    }

    #[test]
    fn actor_id_display() {
        let id = ActorId::new("0xpayer").unwrap();
        assert_eq!(id.to_string(), "actor:0xpayer");
    }

    #[test]
    fn token_id_rejects_empty() {
        assert!(TokenId::new("").is_err());
    }

    #[test]
    fn recipient_ref_rejects_empty_and_zero() {
        assert!(RecipientRef::new("").is_err());
        assert!(RecipientRef::new("0x0000000000000000").is_err());
        assert!(RecipientRef::new("000000").is_err());
    }

    #[test]
    fn recipient_ref_accepts_hash_like_values() {
        assert!(RecipientRef::new("0xabcdef01").is_ok());
        assert!(RecipientRef::new("recipient-hash-7f3a").is_ok());
    }

    #[test]
    fn payment_id_hex_roundtrip() {
        let id = PaymentId::from_bytes([0x5a; 32]);
        let parsed = PaymentId::parse(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn payment_id_display_prefix() {
        let id = PaymentId::from_bytes([0; 32]);
        assert!(id.to_string().starts_with("payment:"));
    }

    #[test]
    fn payment_id_serde_roundtrip() {
        let id = PaymentId::from_bytes([7; 32]);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
