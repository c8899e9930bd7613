// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cryptographic engine for the Wizard's Toolkit.
//!
//! This crate is the dependency-free-of-process-state core: byte buffers,
//! streaming hash and HMAC contexts, a hash-chained random source, an
//! entropy (compression) coder, and a block-cipher engine with hand-rolled
//! mode drivers. It holds no on-disk state and performs no I/O beyond the
//! random source's optional entropy-pool file reads; the session keyring,
//! secret authenticator, keyring file format, and passphrase prompt live one
//! layer up in `wizardtk`, built on top of these primitives.

pub mod error;
pub mod services;
pub mod value_objects;

pub use error::{Result, WizardError};
pub use services::{
    clear_secret_key, set_secret_key, CipherContext, CipherMode, CipherType, EntropyAlgorithm,
    EntropyContext, HashAlgorithm, HashContext, HashPhase, HmacContext, RandomContext, RandomMode,
};
pub use value_objects::ByteBuffer;
