// SPDX-License-Identifier: BUSL-1.1
//! # veilpay-crypto — Encryption Boundary
//!
//! The settlement core treats payment payloads as opaque ciphertext: it
//! stores, forwards, and audits encrypted blobs without ever interpreting
//! their content. This crate defines that boundary — the [`EncryptedBlob`]
//! type and the [`EnvelopeCipher`] capability trait a real cipher
//! implementation plugs into at integration time.
//!
//! The `mock` feature (default on) ships a transparent development cipher
//! that provides **no confidentiality** and exists only so the rest of the
//! workspace can be exercised end-to-end without a production cipher.

pub mod cipher;

#[cfg(feature = "mock")]
pub mod mock;

pub use cipher::{CipherError, EncryptedBlob, EnvelopeCipher};
