// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Channel
//!
//! A single, typed error enum shared by every fallible operation in the
//! cryptographic engine. Each variant corresponds to one of the disjoint
//! error kinds named by the toolkit's design: `AllocationError`, `HashError`,
//! `MACError`, `CipherError`, `EntropyError`, `RandomError`, `KeyError`,
//! `KeymapError`, `KeyringError`, `AuthenticateError`, `PassphraseError`,
//! `FileError`, `ConfigureError`, `OptionError`, `StringError`,
//! `ResourceError`, `BlobError`, `ParseError`.
//!
//! Every error message form avoids echoing secrets: keys, passphrases,
//! plaintext, and nonces never appear in an error string.

use thiserror::Error;

/// Errors produced by the cryptographic engine and the key-management plane
/// built on top of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("allocation error: {0}")]
    AllocationError(String),

    #[error("hash error: {0}")]
    HashError(String),

    #[error("MAC error: {0}")]
    MacError(String),

    #[error("cipher error: {0}")]
    CipherError(String),

    #[error("entropy error: {0}")]
    EntropyError(String),

    #[error("random error: {0}")]
    RandomError(String),

    #[error("key error: {0}")]
    KeyError(String),

    #[error("keymap error: {0}")]
    KeymapError(String),

    #[error("keyring error: {0}")]
    KeyringError(String),

    #[error("authenticate error: {0}")]
    AuthenticateError(String),

    #[error("passphrase error: {0}")]
    PassphraseError(String),

    #[error("file error: {0}")]
    FileError(String),

    #[error("configure error: {0}")]
    ConfigureError(String),

    #[error("option error: {0}")]
    OptionError(String),

    #[error("string error: {0}")]
    StringError(String),

    #[error("resource error: {0}")]
    ResourceError(String),

    #[error("blob error: {0}")]
    BlobError(String),

    #[error("parse error: {0}")]
    ParseError(String),
}

impl WizardError {
    pub fn hash(msg: impl Into<String>) -> Self {
        Self::HashError(msg.into())
    }

    pub fn mac(msg: impl Into<String>) -> Self {
        Self::MacError(msg.into())
    }

    pub fn cipher(msg: impl Into<String>) -> Self {
        Self::CipherError(msg.into())
    }

    pub fn entropy(msg: impl Into<String>) -> Self {
        Self::EntropyError(msg.into())
    }

    pub fn random(msg: impl Into<String>) -> Self {
        Self::RandomError(msg.into())
    }

    pub fn key(msg: impl Into<String>) -> Self {
        Self::KeyError(msg.into())
    }

    pub fn keyring(msg: impl Into<String>) -> Self {
        Self::KeyringError(msg.into())
    }

    pub fn authenticate(msg: impl Into<String>) -> Self {
        Self::AuthenticateError(msg.into())
    }

    pub fn passphrase(msg: impl Into<String>) -> Self {
        Self::PassphraseError(msg.into())
    }

    pub fn file(msg: impl Into<String>) -> Self {
        Self::FileError(msg.into())
    }

    /// Allocation failures are the one fatal category (§7): the process
    /// cannot usefully continue with partial key material.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WizardError::AllocationError(_))
    }

    /// Category label, used for structured logging (never the message body,
    /// which may be influenced by caller-supplied context but never contains
    /// secrets).
    pub fn category(&self) -> &'static str {
        match self {
            WizardError::AllocationError(_) => "allocation",
            WizardError::HashError(_) => "hash",
            WizardError::MacError(_) => "mac",
            WizardError::CipherError(_) => "cipher",
            WizardError::EntropyError(_) => "entropy",
            WizardError::RandomError(_) => "random",
            WizardError::KeyError(_) => "key",
            WizardError::KeymapError(_) => "keymap",
            WizardError::KeyringError(_) => "keyring",
            WizardError::AuthenticateError(_) => "authenticate",
            WizardError::PassphraseError(_) => "passphrase",
            WizardError::FileError(_) => "file",
            WizardError::ConfigureError(_) => "configure",
            WizardError::OptionError(_) => "option",
            WizardError::StringError(_) => "string",
            WizardError::ResourceError(_) => "resource",
            WizardError::BlobError(_) => "blob",
            WizardError::ParseError(_) => "parse",
        }
    }
}

impl From<std::io::Error> for WizardError {
    fn from(err: std::io::Error) -> Self {
        WizardError::FileError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
