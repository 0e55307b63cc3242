// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-core — Foundational Types for the VeilPay Settlement Core
//!
//! This crate is the bedrock of the VeilPay workspace. It defines the
//! type-system primitives that every other crate builds on. It depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `ActorId`, `TokenId`,
//!    `RecipientRef`, `PaymentId` — all newtypes with validated constructors.
//!    No bare strings for identifiers.
//!
//! 2. **Domain-separated digests.** All derived identifiers flow through
//!    [`Sha256Accumulator`] with an explicit domain tag, so a payment
//!    identifier can never collide with a proof fingerprint computed over
//!    the same bytes.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] enforces UTC with Z suffix and
//!    seconds precision. Non-UTC inputs are rejected at construction.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `veilpay-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug`, `Clone`, and implement
//!   `Serialize`/`Deserialize`.

pub mod digest;
pub mod error;
pub mod identity;
pub mod score;
pub mod temporal;

pub use digest::{parse_hex32, to_hex, Sha256Accumulator};
pub use error::CoreError;
pub use identity::{ActorId, PaymentId, RecipientRef, TokenId};
pub use score::RiskScore;
pub use temporal::Timestamp;
