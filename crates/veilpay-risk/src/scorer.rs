// SPDX-License-Identifier: BUSL-1.1
//! # Risk Scorer Capability
//!
//! Boundary contract with the external risk-scoring service. The service
//! receives the transaction context a payer supplied out-of-band and
//! returns a score in `[0, 100]` plus optional human-readable factors.
//!
//! The service may fail (network, auth). Failure handling belongs to the
//! orchestrator, which applies [`RiskScore::FALLBACK`] rather than blocking
//! settlement on an unreachable scorer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilpay_core::{ActorId, RecipientRef, RiskScore};

/// Transaction context handed to the scoring service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionContext {
    /// The sending payer.
    pub sender: ActorId,
    /// Opaque recipient reference.
    pub recipient_ref: RecipientRef,
    /// Cleartext amount, as supplied to the scorer out-of-band.
    pub amount: u64,
    /// Cleartext metadata key/value pairs, as supplied out-of-band.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Result of a scoring call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    /// The assessed score.
    pub score: RiskScore,
    /// Human-readable factors behind the score, if the service provides
    /// them (e.g. "amount anomaly", "unusual hour").
    pub factors: Vec<String>,
}

impl ScoreReport {
    /// A report carrying just a score, no factors.
    pub fn bare(score: RiskScore) -> Self {
        Self {
            score,
            factors: Vec::new(),
        }
    }
}

/// Errors from the external scoring service.
#[derive(Error, Debug)]
pub enum ScorerError {
    /// The service was unreachable or timed out. Transient — the
    /// orchestrator retries with backoff, then falls back.
    #[error("scoring service unavailable: {0}")]
    Unavailable(String),

    /// The service rejected the request. Permanent — not retried.
    #[error("scoring request rejected: {0}")]
    Rejected(String),
}

/// Capability trait for the external risk-scoring service.
///
/// Implementations wrap whatever transport they need; from the settlement
/// core's point of view a call either yields a bounded score or fails.
pub trait RiskScorer: Send + Sync {
    /// Score a transaction context.
    fn score(&self, ctx: &TransactionContext) -> Result<ScoreReport, ScorerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer(u8);

    impl RiskScorer for FixedScorer {
        fn score(&self, _ctx: &TransactionContext) -> Result<ScoreReport, ScorerError> {
            Ok(ScoreReport::bare(RiskScore::new(self.0).unwrap()))
        }
    }

    fn context() -> TransactionContext {
        TransactionContext {
            sender: ActorId::new("0xsender").unwrap(),
            recipient_ref: RecipientRef::new("0xabcdef").unwrap(),
            amount: 100,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn scorer_trait_is_object_safe() {
        let scorer: Box<dyn RiskScorer> = Box::new(FixedScorer(42));
        let report = scorer.score(&context()).unwrap();
        assert_eq!(report.score.value(), 42);
        assert!(report.factors.is_empty());
    }

    #[test]
    fn context_serde_roundtrip() {
        let mut metadata = serde_json::Map::new();
        metadata.insert("purpose".into(), "invoice payment".into());
        let ctx = TransactionContext {
            metadata,
            ..context()
        };
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: TransactionContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.amount, 100);
        assert_eq!(parsed.metadata["purpose"], "invoice payment");
    }
}
