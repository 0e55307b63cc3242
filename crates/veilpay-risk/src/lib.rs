// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-risk — Risk Assessment Gate
//!
//! Pure validation and delegation between external risk assessors and the
//! payment ledger. The gate checks assessor authorization and score bounds
//! before forwarding, suppresses insignificant re-scores (noise from
//! repeated assessment), and treats re-assessment of a terminal payment as
//! an idempotent no-op rather than an error.
//!
//! The scoring algorithm itself lives behind the [`RiskScorer`] capability
//! trait — this crate consumes scores, it never computes them.

pub mod gate;
pub mod scorer;

pub use gate::{RiskAssessmentGate, RiskGateError};
pub use scorer::{RiskScorer, ScoreReport, ScorerError, TransactionContext};
