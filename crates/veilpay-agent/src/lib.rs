// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-agent — Settlement Orchestrator
//!
//! The off-chain agent loop: polls the ledger for payments needing action
//! and drives transitions through the ledger's public operation contract
//! only. Each concern — risk assessment, proof linkage, expiry refunds —
//! runs as an independently scheduled worker with its own interval and
//! isolated failure handling; there is no shared mutable loop state.
//!
//! Every scan-and-act cycle is idempotent: re-processing an
//! already-`Verified` payment is a safe no-op (the gate's significance
//! delta and terminal no-op guarantee it), and an error on one payment
//! never aborts the cycle for the rest.

pub mod config;
pub mod decision;
pub mod orchestrator;

pub use config::OrchestratorConfig;
pub use decision::{check_critical_patterns, effective_score, CRITICAL_AMOUNT_CAP};
pub use orchestrator::{CycleOutcome, OrchestratorError, SettlementOrchestrator};
