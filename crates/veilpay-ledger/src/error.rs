// SPDX-License-Identifier: BUSL-1.1
//! # Ledger Error Taxonomy
//!
//! All ledger errors are local, synchronous, and non-retryable by the core
//! itself — retry policy belongs to the caller. A single payment's failure
//! never corrupts ledger-wide invariants.

use thiserror::Error;

use veilpay_core::{ActorId, PaymentId};

use crate::status::PaymentStatus;

/// Errors from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or zero-valued arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown payment or proof identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks the role this operation requires.
    #[error("{caller} is not authorized to {action}")]
    Unauthorized {
        /// The rejected caller identity.
        caller: ActorId,
        /// The action that was attempted.
        action: String,
    },

    /// The operation is not valid for the payment's current status.
    #[error("payment {payment} in status {status}: {reason}")]
    InvalidState {
        /// The payment involved.
        payment: PaymentId,
        /// Its current status.
        status: PaymentStatus,
        /// Why the operation was rejected.
        reason: String,
    },

    /// Write-once violation on the payment record.
    #[error("conflict on payment {payment}: {reason}")]
    Conflict {
        /// The payment involved.
        payment: PaymentId,
        /// What was attempted twice.
        reason: String,
    },

    /// Mutation attempted on a terminal record.
    #[error("payment {payment} is in terminal state {status}")]
    AlreadyTerminal {
        /// The payment involved.
        payment: PaymentId,
        /// The terminal status it holds.
        status: PaymentStatus,
    },
}
