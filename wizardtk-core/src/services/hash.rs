// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Hash Engine
//!
//! A streaming hash context dispatched over one of eleven algorithms (plus
//! the "none" placeholder), built directly on the RustCrypto digest crates.
//! The context carries its own lifecycle state so callers get a `HashError`
//! instead of a panic when they update after finalising.

use digest::Digest as _;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::error::{Result, WizardError};
use crate::value_objects::ByteBuffer;

const CRC64_ECMA: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

/// The hash family a [`HashContext`] is acquired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Crc64,
    Md5,
    Sha1,
    Sha2_224,
    Sha2_256,
    Sha2_384,
    Sha2_512,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    /// Placeholder hash: zero-length digest, accepts any input.
    None,
}

impl HashAlgorithm {
    pub fn block_size(&self) -> usize {
        match self {
            HashAlgorithm::Crc64 => 8,
            HashAlgorithm::Md5 | HashAlgorithm::Sha1 | HashAlgorithm::Sha2_224 | HashAlgorithm::Sha2_256 => 64,
            HashAlgorithm::Sha2_384 | HashAlgorithm::Sha2_512 => 128,
            HashAlgorithm::Sha3_224 => 144,
            HashAlgorithm::Sha3_256 => 136,
            HashAlgorithm::Sha3_384 => 104,
            HashAlgorithm::Sha3_512 => 72,
            HashAlgorithm::None => 0,
        }
    }

    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Crc64 => 8,
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha2_224 | HashAlgorithm::Sha3_224 => 28,
            HashAlgorithm::Sha2_256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha2_384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha2_512 | HashAlgorithm::Sha3_512 => 64,
            HashAlgorithm::None => 0,
        }
    }

    /// HMAC is defined only over algorithms that behave as a Merkle-Damgard
    /// or sponge construction with a meaningful block size; CRC-64 and the
    /// placeholder are excluded.
    pub fn supports_hmac(&self) -> bool {
        !matches!(self, HashAlgorithm::Crc64 | HashAlgorithm::None)
    }
}

/// Lifecycle state of a [`HashContext`], mirrored explicitly rather than
/// encoded in the type so the context can sit uniformly inside HMAC and the
/// authenticator regardless of which transition it is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashPhase {
    Uninitialised,
    Initialised,
    Updated,
    Finalised,
}

enum Engine {
    Crc64(crc::Digest<'static, u64>),
    Md5(Box<Md5>),
    Sha1(Box<Sha1>),
    Sha224(Box<Sha224>),
    Sha256(Box<Sha256>),
    Sha384(Box<Sha384>),
    Sha512(Box<Sha512>),
    Sha3_224(Box<Sha3_224>),
    Sha3_256(Box<Sha3_256>),
    Sha3_384(Box<Sha3_384>),
    Sha3_512(Box<Sha3_512>),
    None,
}

impl Engine {
    fn new(algo: HashAlgorithm) -> Self {
        match algo {
            HashAlgorithm::Crc64 => Engine::Crc64(CRC64_ECMA.digest()),
            HashAlgorithm::Md5 => Engine::Md5(Box::new(Md5::new())),
            HashAlgorithm::Sha1 => Engine::Sha1(Box::new(Sha1::new())),
            HashAlgorithm::Sha2_224 => Engine::Sha224(Box::new(Sha224::new())),
            HashAlgorithm::Sha2_256 => Engine::Sha256(Box::new(Sha256::new())),
            HashAlgorithm::Sha2_384 => Engine::Sha384(Box::new(Sha384::new())),
            HashAlgorithm::Sha2_512 => Engine::Sha512(Box::new(Sha512::new())),
            HashAlgorithm::Sha3_224 => Engine::Sha3_224(Box::new(Sha3_224::new())),
            HashAlgorithm::Sha3_256 => Engine::Sha3_256(Box::new(Sha3_256::new())),
            HashAlgorithm::Sha3_384 => Engine::Sha3_384(Box::new(Sha3_384::new())),
            HashAlgorithm::Sha3_512 => Engine::Sha3_512(Box::new(Sha3_512::new())),
            HashAlgorithm::None => Engine::None,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Engine::Crc64(digest) => digest.update(bytes),
            Engine::Md5(h) => h.update(bytes),
            Engine::Sha1(h) => h.update(bytes),
            Engine::Sha224(h) => h.update(bytes),
            Engine::Sha256(h) => h.update(bytes),
            Engine::Sha384(h) => h.update(bytes),
            Engine::Sha512(h) => h.update(bytes),
            Engine::Sha3_224(h) => h.update(bytes),
            Engine::Sha3_256(h) => h.update(bytes),
            Engine::Sha3_384(h) => h.update(bytes),
            Engine::Sha3_512(h) => h.update(bytes),
            Engine::None => {}
        }
    }

    fn finalise(self) -> Vec<u8> {
        match self {
            Engine::Crc64(digest) => digest.finalize().to_be_bytes().to_vec(),
            Engine::Md5(h) => h.finalize().to_vec(),
            Engine::Sha1(h) => h.finalize().to_vec(),
            Engine::Sha224(h) => h.finalize().to_vec(),
            Engine::Sha256(h) => h.finalize().to_vec(),
            Engine::Sha384(h) => h.finalize().to_vec(),
            Engine::Sha512(h) => h.finalize().to_vec(),
            Engine::Sha3_224(h) => h.finalize().to_vec(),
            Engine::Sha3_256(h) => h.finalize().to_vec(),
            Engine::Sha3_384(h) => h.finalize().to_vec(),
            Engine::Sha3_512(h) => h.finalize().to_vec(),
            Engine::None => Vec::new(),
        }
    }
}

/// A streaming hash computation over one [`HashAlgorithm`].
pub struct HashContext {
    algorithm: HashAlgorithm,
    phase: HashPhase,
    engine: Option<Engine>,
    digest: Option<ByteBuffer>,
}

impl HashContext {
    /// Acquires a context in [`HashPhase::Uninitialised`].
    pub fn acquire(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            phase: HashPhase::Uninitialised,
            engine: None,
            digest: None,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn phase(&self) -> HashPhase {
        self.phase
    }

    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    pub fn digest_size(&self) -> usize {
        self.algorithm.digest_size()
    }

    /// Uninitialised/Finalised → Initialised, resetting any prior digest.
    pub fn initialise(&mut self) {
        self.engine = Some(Engine::new(self.algorithm));
        self.digest = None;
        self.phase = HashPhase::Initialised;
    }

    /// Feeds bytes into the running hash. Valid from Initialised or Updated.
    pub fn update(&mut self, bytes: &[u8]) -> Result<()> {
        match self.phase {
            HashPhase::Finalised => Err(WizardError::hash("update after finalise")),
            HashPhase::Uninitialised => Err(WizardError::hash("update before initialise")),
            HashPhase::Initialised | HashPhase::Updated => {
                self.engine
                    .as_mut()
                    .expect("initialised context always holds an engine")
                    .update(bytes);
                self.phase = HashPhase::Updated;
                Ok(())
            }
        }
    }

    /// Updated/Initialised → Finalised; the digest becomes readable.
    pub fn finalise(&mut self) -> Result<()> {
        match self.phase {
            HashPhase::Uninitialised => Err(WizardError::hash("finalise before initialise")),
            HashPhase::Finalised => Err(WizardError::hash("already finalised")),
            HashPhase::Initialised | HashPhase::Updated => {
                let engine = self
                    .engine
                    .take()
                    .expect("initialised context always holds an engine");
                self.digest = Some(ByteBuffer::from_vec(engine.finalise()));
                self.phase = HashPhase::Finalised;
                Ok(())
            }
        }
    }

    /// Read-only view of the digest; requires [`HashPhase::Finalised`].
    pub fn digest(&self) -> Result<&ByteBuffer> {
        self.digest
            .as_ref()
            .ok_or_else(|| WizardError::hash("digest read before finalise"))
    }

    /// One-shot convenience: initialise, update, finalise, return digest.
    pub fn digest_of(algorithm: HashAlgorithm, bytes: &[u8]) -> Result<ByteBuffer> {
        let mut ctx = Self::acquire(algorithm);
        ctx.initialise();
        ctx.update(bytes)?;
        ctx.finalise()?;
        Ok(ctx.digest()?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_abc_matches_published_vector() {
        let digest = HashContext::digest_of(HashAlgorithm::Sha2_256, b"abc").unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn chunk_boundaries_do_not_affect_digest() {
        let message = b"the quick brown fox jumps over the lazy dog, repeatedly, many times over";
        let whole = HashContext::digest_of(HashAlgorithm::Sha2_256, message).unwrap();

        let mut chunked = HashContext::acquire(HashAlgorithm::Sha2_256);
        chunked.initialise();
        for chunk in message.chunks(7) {
            chunked.update(chunk).unwrap();
        }
        chunked.finalise().unwrap();

        assert_eq!(whole, *chunked.digest().unwrap());
    }

    #[test]
    fn update_after_finalise_is_an_error() {
        let mut ctx = HashContext::acquire(HashAlgorithm::Md5);
        ctx.initialise();
        ctx.update(b"x").unwrap();
        ctx.finalise().unwrap();
        assert!(ctx.update(b"y").is_err());
    }

    #[test]
    fn none_algorithm_yields_empty_digest() {
        let digest = HashContext::digest_of(HashAlgorithm::None, b"anything").unwrap();
        assert_eq!(digest.len(), 0);
    }

    #[test]
    fn crc64_digest_size_is_eight_bytes() {
        let digest = HashContext::digest_of(HashAlgorithm::Crc64, b"123456789").unwrap();
        assert_eq!(digest.len(), 8);
        assert_eq!(digest.to_hex(), "6c40df5f0b497347");
    }

    proptest::proptest! {
        #[test]
        fn chunking_is_always_invariant(message in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..512),
                                          chunk_size in 1usize..64) {
            let whole = HashContext::digest_of(HashAlgorithm::Sha2_256, &message).unwrap();
            let mut ctx = HashContext::acquire(HashAlgorithm::Sha2_256);
            ctx.initialise();
            for chunk in message.chunks(chunk_size) {
                ctx.update(chunk).unwrap();
            }
            ctx.finalise().unwrap();
            proptest::prop_assert_eq!(whole, ctx.digest().unwrap().clone());
        }
    }
}
