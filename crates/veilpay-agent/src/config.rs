// SPDX-License-Identifier: BUSL-1.1
//! # Orchestrator Configuration
//!
//! Intervals and backoff for the polling workers. Serde-deserializable with
//! defaults, so a deployment can override only what it needs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the settlement orchestrator's workers.
///
/// Intervals are in milliseconds; accessor methods return `Duration`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// How often the assessment worker scans `Pending` payments.
    pub assess_interval_ms: u64,
    /// How often the proof-linkage worker scans decided attestations.
    pub proof_link_interval_ms: u64,
    /// How often the expiry worker sweeps overdue `Pending` payments.
    pub expiry_interval_ms: u64,
    /// Base delay applied after a cycle that saw errors; doubles per
    /// consecutive failing cycle up to [`Self::max_backoff_ms`].
    pub error_backoff_ms: u64,
    /// Ceiling for the error backoff.
    pub max_backoff_ms: u64,
    /// Retry attempts against the scoring service before falling back to
    /// the conservative default score.
    pub scorer_retries: u32,
    /// Amounts above this cap trigger the critical-pattern flag regardless
    /// of the scorer's output.
    pub critical_amount_cap: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            assess_interval_ms: 5_000,
            proof_link_interval_ms: 5_000,
            expiry_interval_ms: 30_000,
            error_backoff_ms: 200,
            max_backoff_ms: 5_000,
            scorer_retries: 3,
            critical_amount_cap: 100_000,
        }
    }
}

impl OrchestratorConfig {
    /// Assessment scan interval.
    pub fn assess_interval(&self) -> Duration {
        Duration::from_millis(self.assess_interval_ms)
    }

    /// Proof-linkage scan interval.
    pub fn proof_link_interval(&self) -> Duration {
        Duration::from_millis(self.proof_link_interval_ms)
    }

    /// Expiry sweep interval.
    pub fn expiry_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_interval_ms)
    }

    /// Backoff delay for the given consecutive-failure count, doubling from
    /// the base and saturating at the ceiling.
    pub fn backoff_for(&self, consecutive_failures: u32) -> Duration {
        let exp = consecutive_failures.saturating_sub(1).min(16);
        let delay = self
            .error_backoff_ms
            .saturating_mul(1u64 << exp)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}
