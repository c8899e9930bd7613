// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entropy Coder
//!
//! A uniform compress/decompress contract over three real codecs (BZIP,
//! LZMA, raw DEFLATE) plus a "none" passthrough, so the keyring file service
//! and callers storing large blobs never need to branch on which codec
//! produced a given stream.

use std::io::{Read, Write};

use crate::error::{Result, WizardError};
use crate::value_objects::ByteBuffer;

/// Compression codec selected for an [`EntropyContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntropyAlgorithm {
    Bzip,
    Lzma,
    Zip,
    None,
}

/// A compress/decompress handle over one [`EntropyAlgorithm`] and level.
pub struct EntropyContext {
    algorithm: EntropyAlgorithm,
    level: u32,
    chaos: ByteBuffer,
}

impl EntropyContext {
    pub fn acquire(algorithm: EntropyAlgorithm, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(WizardError::entropy(format!(
                "level {level} is outside 0..=9"
            )));
        }
        Ok(Self {
            algorithm,
            level,
            chaos: ByteBuffer::from_vec(Vec::new()),
        })
    }

    pub fn algorithm(&self) -> EntropyAlgorithm {
        self.algorithm
    }

    /// Holds compressed output after [`Self::increase_entropy`], or
    /// plaintext after [`Self::restore_entropy`].
    pub fn chaos(&self) -> &ByteBuffer {
        &self.chaos
    }

    /// Compresses `plaintext`; the result is readable via [`Self::chaos`].
    pub fn increase_entropy(&mut self, plaintext: &[u8]) -> Result<()> {
        let compressed = match self.algorithm {
            EntropyAlgorithm::Bzip => {
                // bzip2 has no "no compression" level; 0 maps to its lowest
                // real block size rather than a rejected input.
                let level = bzip2::Compression::new(self.level.max(1));
                let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), level);
                encoder
                    .write_all(plaintext)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| WizardError::entropy(e.to_string()))?
            }
            EntropyAlgorithm::Lzma => {
                let mut encoder = xz2::write::XzEncoder::new(Vec::new(), self.level);
                encoder
                    .write_all(plaintext)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| WizardError::entropy(e.to_string()))?
            }
            EntropyAlgorithm::Zip => {
                // Raw DEFLATE (window=15), no gzip header, per the container
                // expectations of the on-disk entropy streams.
                let level = flate2::Compression::new(self.level);
                let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), level);
                encoder
                    .write_all(plaintext)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| WizardError::entropy(e.to_string()))?
            }
            EntropyAlgorithm::None => plaintext.to_vec(),
        };
        self.chaos = ByteBuffer::from_vec(compressed);
        Ok(())
    }

    /// Decompresses `chaos`, failing unless the result is exactly
    /// `expected_length` bytes.
    pub fn restore_entropy(&mut self, expected_length: usize, chaos: &[u8]) -> Result<()> {
        let plaintext = match self.algorithm {
            EntropyAlgorithm::Bzip => {
                let mut decoder = bzip2::read::BzDecoder::new(chaos);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                out
            }
            EntropyAlgorithm::Lzma => {
                let mut decoder = xz2::read::XzDecoder::new(chaos);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                out
            }
            EntropyAlgorithm::Zip => {
                let mut decoder = flate2::read::DeflateDecoder::new(chaos);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| WizardError::entropy(e.to_string()))?;
                out
            }
            EntropyAlgorithm::None => chaos.to_vec(),
        };
        if plaintext.len() != expected_length {
            return Err(WizardError::entropy(format!(
                "decompressed to {} bytes, expected {expected_length}",
                plaintext.len()
            )));
        }
        self.chaos = ByteBuffer::from_vec(plaintext);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(algorithm: EntropyAlgorithm, level: u32, plaintext: &[u8]) {
        let mut ctx = EntropyContext::acquire(algorithm, level).unwrap();
        ctx.increase_entropy(plaintext).unwrap();
        let compressed = ctx.chaos().as_bytes().to_vec();

        let mut restore_ctx = EntropyContext::acquire(algorithm, level).unwrap();
        restore_ctx
            .restore_entropy(plaintext.len(), &compressed)
            .unwrap();
        assert_eq!(restore_ctx.chaos().as_bytes(), plaintext);
    }

    #[test]
    fn zip_round_trips() {
        round_trip(EntropyAlgorithm::Zip, 6, b"the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn bzip_round_trips() {
        round_trip(EntropyAlgorithm::Bzip, 9, b"the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn lzma_round_trips() {
        round_trip(EntropyAlgorithm::Lzma, 6, b"the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn none_is_a_passthrough() {
        round_trip(EntropyAlgorithm::None, 0, b"uncompressed bytes");
    }

    #[test]
    fn restore_rejects_length_mismatch() {
        let mut ctx = EntropyContext::acquire(EntropyAlgorithm::Zip, 6).unwrap();
        ctx.increase_entropy(b"some plaintext").unwrap();
        let compressed = ctx.chaos().as_bytes().to_vec();
        let mut restore_ctx = EntropyContext::acquire(EntropyAlgorithm::Zip, 6).unwrap();
        assert!(restore_ctx.restore_entropy(999, &compressed).is_err());
    }

    #[test]
    fn level_out_of_range_is_rejected() {
        assert!(EntropyContext::acquire(EntropyAlgorithm::Zip, 10).is_err());
    }
}
