// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # HMAC Engine
//!
//! RFC 2104 keyed hashing built directly on [`HashContext`] rather than the
//! generic `hmac` crate: the keyring and authenticator need an HMAC whose
//! underlying hash is chosen at runtime from the same [`HashAlgorithm`]
//! enumeration the rest of the engine dispatches on, and need `reset` to
//! reuse the derived pads without re-deriving them from the key.

use crate::error::{Result, WizardError};
use crate::services::hash::{HashAlgorithm, HashContext};
use crate::value_objects::ByteBuffer;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// A keyed hash over one [`HashAlgorithm`], per RFC 2104.
pub struct HmacContext {
    algorithm: HashAlgorithm,
    ipad: Vec<u8>,
    opad: Vec<u8>,
    inner: HashContext,
    digest: Option<ByteBuffer>,
}

impl HmacContext {
    /// Acquires and primes the context against `key`. `algorithm` must
    /// support HMAC (not CRC-64 or the placeholder "none" hash).
    pub fn initialise(algorithm: HashAlgorithm, key: &[u8]) -> Result<Self> {
        if !algorithm.supports_hmac() {
            return Err(WizardError::mac(format!(
                "{algorithm:?} does not support HMAC"
            )));
        }
        let block_size = algorithm.block_size();

        let mut key_block = if key.len() > block_size {
            HashContext::digest_of(algorithm, key)?.into_vec()
        } else {
            key.to_vec()
        };
        key_block.resize(block_size, 0);

        let ipad: Vec<u8> = key_block.iter().map(|b| b ^ IPAD).collect();
        let opad: Vec<u8> = key_block.iter().map(|b| b ^ OPAD).collect();
        key_block.zeroize_in_place();

        let mut inner = HashContext::acquire(algorithm);
        inner.initialise();
        inner.update(&ipad)?;

        Ok(Self {
            algorithm,
            ipad,
            opad,
            inner,
            digest: None,
        })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Feeds message bytes into the inner hash.
    pub fn update(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.update(bytes)
    }

    /// Completes the construction: `digest = H(opad ‖ H(ipad ‖ message))`.
    pub fn finalise(&mut self) -> Result<()> {
        let mut inner = std::mem::replace(&mut self.inner, HashContext::acquire(self.algorithm));
        inner.finalise()?;
        let inner_digest = inner.digest()?.clone();

        let mut outer = HashContext::acquire(self.algorithm);
        outer.initialise();
        outer.update(&self.opad)?;
        outer.update(inner_digest.as_bytes())?;
        outer.finalise()?;

        self.digest = Some(outer.digest()?.clone());
        Ok(())
    }

    pub fn digest(&self) -> Result<&ByteBuffer> {
        self.digest
            .as_ref()
            .ok_or_else(|| WizardError::mac("digest read before finalise"))
    }

    /// Returns to the post-initialise state, reusing the derived pads
    /// without re-deriving them from the key.
    pub fn reset(&mut self) -> Result<()> {
        let mut inner = HashContext::acquire(self.algorithm);
        inner.initialise();
        inner.update(&self.ipad)?;
        self.inner = inner;
        self.digest = None;
        Ok(())
    }

    /// One-shot equivalent of initialise + update + finalise.
    pub fn construct(algorithm: HashAlgorithm, key: &[u8], message: &[u8]) -> Result<ByteBuffer> {
        let mut ctx = Self::initialise(algorithm, key)?;
        ctx.update(message)?;
        ctx.finalise()?;
        Ok(ctx.digest()?.clone())
    }
}

impl Drop for HmacContext {
    fn drop(&mut self) {
        self.ipad.zeroize_in_place();
        self.opad.zeroize_in_place();
    }
}

trait ZeroizeInPlace {
    fn zeroize_in_place(&mut self);
}

impl ZeroizeInPlace for Vec<u8> {
    fn zeroize_in_place(&mut self) {
        use zeroize::Zeroize;
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc4231_case_1_matches_published_vector() {
        let key = [0x0bu8; 20];
        let digest = HmacContext::construct(HashAlgorithm::Sha2_256, &key, b"Hi There").unwrap();
        assert_eq!(
            digest.to_hex(),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    #[test]
    fn construct_matches_manual_nested_hash() {
        let key = b"a reasonably long key, well over one block in most hashes, to exercise the hash-down branch of RFC 2104";
        let message = b"the message body";
        let via_construct = HmacContext::construct(HashAlgorithm::Sha2_256, key, message).unwrap();

        let block_size = HashAlgorithm::Sha2_256.block_size();
        let mut key_block = HashContext::digest_of(HashAlgorithm::Sha2_256, key)
            .unwrap()
            .into_vec();
        key_block.resize(block_size, 0);
        let ipad: Vec<u8> = key_block.iter().map(|b| b ^ IPAD).collect();
        let opad: Vec<u8> = key_block.iter().map(|b| b ^ OPAD).collect();

        let mut inner_bytes = ipad.clone();
        inner_bytes.extend_from_slice(message);
        let inner_digest = HashContext::digest_of(HashAlgorithm::Sha2_256, &inner_bytes).unwrap();

        let mut outer_bytes = opad.clone();
        outer_bytes.extend_from_slice(inner_digest.as_bytes());
        let expected = HashContext::digest_of(HashAlgorithm::Sha2_256, &outer_bytes).unwrap();

        assert_eq!(via_construct, expected);
    }

    #[test]
    fn reset_reuses_pads_for_a_second_construction() {
        let key = b"reset-key";
        let mut ctx = HmacContext::initialise(HashAlgorithm::Sha2_256, key).unwrap();
        ctx.update(b"first message").unwrap();
        ctx.finalise().unwrap();
        let first = ctx.digest().unwrap().clone();

        ctx.reset().unwrap();
        ctx.update(b"first message").unwrap();
        ctx.finalise().unwrap();
        let second = ctx.digest().unwrap().clone();

        assert_eq!(first, second);
    }

    #[test]
    fn rejects_crc64_and_none() {
        assert!(HmacContext::initialise(HashAlgorithm::Crc64, b"k").is_err());
        assert!(HmacContext::initialise(HashAlgorithm::None, b"k").is_err());
    }
}
