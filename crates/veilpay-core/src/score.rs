// SPDX-License-Identifier: BUSL-1.1
//! # Risk Score — Validated 0–100 Integer
//!
//! The risk score is produced by an external assessor and consumed by the
//! settlement core to decide between `Verified` and `Flagged`. The newtype
//! makes an out-of-range score unrepresentable past the boundary.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A risk score in `[0, 100]`.
///
/// Higher is riskier. Scores at or above a payer's policy threshold flag the
/// payment; scores below it verify it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    /// The maximum representable score.
    pub const MAX: RiskScore = RiskScore(100);

    /// The minimum representable score.
    pub const MIN: RiskScore = RiskScore(0);

    /// Conservative medium-risk fallback applied by the orchestrator when
    /// the external scoring service fails rather than blocking settlement.
    pub const FALLBACK: RiskScore = RiskScore(50);

    /// Default per-payer flagging threshold when no policy is stored.
    pub const DEFAULT_THRESHOLD: RiskScore = RiskScore(75);

    /// Create a score. Rejects values above 100.
    pub fn new(value: u8) -> Result<Self, CoreError> {
        if value > 100 {
            return Err(CoreError::InvalidScore(value));
        }
        Ok(Self(value))
    }

    /// Access the raw score value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Absolute difference between two scores, in points.
    pub fn abs_diff(&self, other: RiskScore) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<u8> for RiskScore {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> u8 {
        score.0
    }
}

impl std::fmt::Display for RiskScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
