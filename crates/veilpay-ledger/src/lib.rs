// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-ledger — The Authoritative Payment Ledger
//!
//! The ledger owns every payment record exclusively. All status mutation —
//! risk transitions, proof attachment, completion, refund — goes through the
//! ledger's operation API, which enforces the lifecycle state machine and
//! actor authorization on every transition. Sibling components (the risk
//! gate, the attestation registry) hold payment identifiers, never payment
//! state, so there is exactly one view of any payment's status.
//!
//! ## Concurrency
//!
//! Records live in a `DashMap`; every read-modify-write runs under the
//! entry's write lock, so a precondition check and its status write can
//! never interleave with another transition on the same record
//! (linearizable single-writer-per-record). No operation blocks on external
//! computation — proof verification results arrive as separate calls.

pub mod error;
pub mod event;
pub mod ledger;
pub mod payment;
pub mod status;

pub use error::LedgerError;
pub use event::PaymentEvent;
pub use ledger::PaymentLedger;
pub use payment::{CreatePaymentRequest, Payment, PaymentView, TransitionRecord};
pub use status::PaymentStatus;
