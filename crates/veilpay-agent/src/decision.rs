// SPDX-License-Identifier: BUSL-1.1
//! # Decision Helpers
//!
//! Pattern checks the orchestrator applies on top of the external scorer's
//! output. A transaction matching a critical pattern is forced to the
//! maximum score — and therefore `Flagged` — regardless of what the scorer
//! returned.

use veilpay_core::RiskScore;
use veilpay_risk::{ScoreReport, TransactionContext};

/// Default amount cap above which a payment is flagged outright.
pub const CRITICAL_AMOUNT_CAP: u64 = 100_000;

/// Metadata keywords that force an immediate flag.
const SUSPICIOUS_KEYWORDS: [&str; 4] = ["exploit", "hack", "drain", "rug"];

/// Whether the transaction matches a critical risk pattern.
///
/// Two patterns: an amount above the cap, or a suspicious keyword anywhere
/// in the cleartext metadata values.
pub fn check_critical_patterns(ctx: &TransactionContext, amount_cap: u64) -> bool {
    if ctx.amount > amount_cap {
        return true;
    }

    let metadata_text = serde_json::Value::Object(ctx.metadata.clone())
        .to_string()
        .to_lowercase();
    SUSPICIOUS_KEYWORDS
        .iter()
        .any(|keyword| metadata_text.contains(keyword))
}

/// The score the orchestrator submits: the scorer's output, overridden to
/// the maximum when a critical pattern matches.
pub fn effective_score(report: &ScoreReport, ctx: &TransactionContext, amount_cap: u64) -> RiskScore {
    if check_critical_patterns(ctx, amount_cap) {
        RiskScore::MAX
    } else {
        report.score
    }
}
