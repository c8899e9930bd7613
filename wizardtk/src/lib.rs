// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Wizard's Toolkit — Key Management
//!
//! The key-management plane built on top of [`wizardtk_core`]'s
//! cryptographic engine: an in-memory session [`Keyring`], a passphrase-based
//! [`SecretAuthenticator`], the on-disk [`KeyringFileService`] the
//! authenticator persists records through, and the platform adapters
//! (terminal passphrase prompting, logging, environment-driven path
//! resolution) that tie them to a real process.
//!
//! Every fallible operation here returns [`wizardtk_core::error::WizardError`]
//! — this crate does not define a second error type, since its failure modes
//! (missing id, bad passphrase, unreadable keyring file) all already fit one
//! of that enum's variants.

pub mod application;
pub mod infrastructure;

pub use application::{Keyring, SecretAuthenticator};
pub use infrastructure::{KeyringFileService, KeyringRecord};
pub use wizardtk_core::error::{Result, WizardError};
