// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # ByteBuffer
//!
//! `ByteBuffer` is the owned byte sequence every other service in the
//! cryptographic engine is built on: keys, nonces, digests, plaintext and
//! ciphertext chunks, and keyring entries all pass through it. It carries a
//! diagnostic `path` tag (no semantic effect beyond logging/debugging) and
//! zeroizes its contents on drop so key material never survives past its
//! owner's scope.
//!
//! Equality and ordering are length-and-content comparisons performed in
//! constant time with respect to the buffers' content, which matters for
//! every key-bearing comparison in the keyring and authenticator (an
//! early-exit comparison would let a timing side channel leak how many
//! leading bytes of a guessed key or id were correct).

use std::cmp::Ordering;
use std::fmt;

use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use crate::error::{Result, WizardError};

pub(crate) const CRC64_ECMA: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

/// An owned, length-tagged, zeroizing byte sequence.
#[derive(Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    path: Option<String>,
}

impl ByteBuffer {
    /// Allocates a zero-initialised buffer of `length` bytes.
    pub fn new(length: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(length)
            .map_err(|e| WizardError::AllocationError(e.to_string()))?;
        data.resize(length, 0);
        Ok(Self { data, path: None })
    }

    /// Wraps an existing byte slice verbatim.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            path: None,
        }
    }

    /// Takes ownership of an existing `Vec<u8>` verbatim.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, path: None }
    }

    /// Copies a string's UTF-8 bytes verbatim (no trailing NUL).
    pub fn from_string(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// Decodes two hex digits per byte; ASCII whitespace is ignored.
    pub fn from_hex(text: &str) -> Result<Self> {
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let data = hex::decode(&cleaned).map_err(|e| WizardError::ParseError(e.to_string()))?;
        Ok(Self { data, path: None })
    }

    /// Renders the buffer as lowercase hex, two digits per byte.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        // `self` is about to be consumed without running `Drop::drop` on the
        // moved-out Vec; the caller now owns (and is responsible for
        // zeroizing) the bytes.
        let mut this = std::mem::ManuallyDrop::new(self);
        this.path.take();
        std::mem::take(&mut this.data)
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Truncates or extends (with zero bytes) to exactly `length` bytes.
    pub fn set_length(&mut self, length: usize) {
        self.data.resize(length, 0);
    }

    /// Overwrites every byte with zero without changing the length.
    pub fn reset(&mut self) {
        self.data.zeroize();
    }

    /// CRC-64 (ECMA-182 polynomial) over the buffer's content.
    pub fn crc(&self) -> u64 {
        CRC64_ECMA.checksum(&self.data)
    }

    /// Length-and-content comparison, constant-time with respect to content
    /// for buffers of equal length: every byte is inspected regardless of
    /// where buffers first differ, so two equal-length buffers that differ
    /// in one byte take the same time as two that differ in every byte.
    pub fn compare(a: &ByteBuffer, b: &ByteBuffer) -> Ordering {
        if a.data.len() != b.data.len() {
            return a.data.len().cmp(&b.data.len());
        }
        let mut lt = Choice::from(0u8);
        let mut gt = Choice::from(0u8);
        let mut decided = Choice::from(0u8);
        for (x, y) in a.data.iter().zip(b.data.iter()) {
            let eq = x.ct_eq(y);
            let byte_lt = Choice::from((x < y) as u8);
            let undecided = !decided;
            lt |= byte_lt & undecided;
            gt |= (!eq & !byte_lt) & undecided;
            decided |= !eq;
        }
        if !bool::from(decided) {
            Ordering::Equal
        } else if bool::from(lt) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl Drop for ByteBuffer {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl PartialEq for ByteBuffer {
    fn eq(&self, other: &Self) -> bool {
        Self::compare(self, other) == Ordering::Equal
    }
}

impl Eq for ByteBuffer {}

impl PartialOrd for ByteBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(Self::compare(self, other))
    }
}

impl Ord for ByteBuffer {
    fn cmp(&self, other: &Self) -> Ordering {
        Self::compare(self, other)
    }
}

impl std::hash::Hash for ByteBuffer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for ByteBuffer {
    /// Never renders content: buffers frequently carry key material.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("length", &self.data.len())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hex() {
        let buf = ByteBuffer::from_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(buf.to_hex(), "deadbeef");
        let parsed = ByteBuffer::from_hex("de ad be ef").unwrap();
        assert_eq!(parsed, buf);
    }

    #[test]
    fn set_length_pads_with_zero() {
        let mut buf = ByteBuffer::from_bytes(b"abc");
        buf.set_length(5);
        assert_eq!(buf.as_bytes(), b"abc\0\0");
        buf.set_length(2);
        assert_eq!(buf.as_bytes(), b"ab");
    }

    #[test]
    fn reset_zeroes_without_changing_length() {
        let mut buf = ByteBuffer::from_bytes(b"abc");
        buf.reset();
        assert_eq!(buf.as_bytes(), [0, 0, 0]);
    }

    #[test]
    fn compare_matches_equality_and_ordering() {
        let a = ByteBuffer::from_bytes(b"abc");
        let b = ByteBuffer::from_bytes(b"abd");
        let c = ByteBuffer::from_bytes(b"abc");
        assert_eq!(ByteBuffer::compare(&a, &b), Ordering::Less);
        assert_eq!(ByteBuffer::compare(&b, &a), Ordering::Greater);
        assert_eq!(ByteBuffer::compare(&a, &c), Ordering::Equal);
        assert_eq!(a, c);
    }

    #[test]
    fn crc64_ecma_is_stable() {
        let buf = ByteBuffer::from_bytes(b"123456789");
        // Canonical check value for the CRC-64/ECMA-182 parameter set
        // (non-reflected, zero init/xorout) per the `crc` crate's catalog.
        assert_eq!(buf.crc(), 0x6c40_df5f_0b49_7347);
    }

    proptest::proptest! {
        #[test]
        fn compare_is_reflexive_and_antisymmetric(a in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
                                                    b in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let ba = ByteBuffer::from_bytes(&a);
            let bb = ByteBuffer::from_bytes(&b);
            let fwd = ByteBuffer::compare(&ba, &bb);
            let rev = ByteBuffer::compare(&bb, &ba);
            proptest::prop_assert_eq!(fwd, rev.reverse());
        }
    }
}
