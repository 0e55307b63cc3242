// SPDX-License-Identifier: BUSL-1.1
//! # Error Types — Core Validation Failures
//!
//! Errors raised by validated constructors in this crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations and
//! carry enough context to diagnose the rejected input.

use thiserror::Error;

/// Validation errors for core domain primitives.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An actor or token identifier failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A recipient reference was empty or all-zero.
    #[error("invalid recipient reference: {0}")]
    InvalidRecipientRef(String),

    /// A timestamp string failed to parse or used a non-UTC offset.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A hex string failed to decode into the expected width.
    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    /// A risk score was outside `[0, 100]`.
    #[error("risk score out of range: {0} (max 100)")]
    InvalidScore(u8),
}
