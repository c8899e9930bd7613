// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Cipher Engine
//!
//! A key schedule plus block transform for {AES, Serpent, Twofish, Chacha},
//! and a mode driver for {ECB, CBC, CFB, OFB, CTR} that enciphers/deciphers
//! arbitrary-length buffers in place.
//!
//! The mode drivers are hand-rolled rather than built on the `cbc`/`cfb-mode`
//! /`ofb`/`ctr`/`ecb` crates: those crates assume PKCS#7 padding or reject
//! non-block-aligned input outright, while every mode here must instead
//! absorb a trailing short block by reusing (ECB) or re-enciphering (CBC) the
//! previous block as an ad hoc keystream, and CFB/OFB/CTR must tolerate
//! arbitrary lengths by truncating the final keystream block. Chacha has no
//! block transform to drive through a mode at all — it is its own
//! self-contained stream cipher, so `mode` is accepted but ignored for it.

use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use generic_array::GenericArray;

use crate::error::{Result, WizardError};
use crate::services::random::RandomContext;
use crate::value_objects::ByteBuffer;

/// Symmetric algorithm a [`CipherContext`] is acquired against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherType {
    Aes,
    Serpent,
    Twofish,
    Chacha,
    None,
}

impl CipherType {
    /// Block size in bytes for the block ciphers; for Chacha this is its
    /// nonce length (12 bytes, RFC 8439) since it has no block transform.
    pub fn block_size(&self) -> usize {
        match self {
            CipherType::Aes | CipherType::Serpent | CipherType::Twofish => 16,
            CipherType::Chacha => 12,
            CipherType::None => 0,
        }
    }

    pub fn key_lengths(&self) -> &'static [usize] {
        match self {
            CipherType::Aes | CipherType::Serpent | CipherType::Twofish => &[16, 24, 32],
            CipherType::Chacha => &[32],
            CipherType::None => &[],
        }
    }
}

/// Block-processing mode driving a block cipher over an arbitrary-length
/// buffer. Unused when [`CipherType::Chacha`] or [`CipherType::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Ecb,
    Cbc,
    Cfb,
    Ofb,
    Ctr,
}

enum BlockEngine {
    Aes128(Box<aes::Aes128>),
    Aes192(Box<aes::Aes192>),
    Aes256(Box<aes::Aes256>),
    Serpent128(Box<serpent::Serpent128>),
    Serpent192(Box<serpent::Serpent192>),
    Serpent256(Box<serpent::Serpent256>),
    Twofish128(Box<twofish::Twofish128>),
    Twofish192(Box<twofish::Twofish192>),
    Twofish256(Box<twofish::Twofish256>),
}

impl BlockEngine {
    fn new(cipher_type: CipherType, key: &[u8]) -> Result<Self> {
        use BlockEngine::*;
        Ok(match (cipher_type, key.len()) {
            (CipherType::Aes, 16) => Aes128(Box::new(aes::Aes128::new(GenericArray::from_slice(key)))),
            (CipherType::Aes, 24) => Aes192(Box::new(aes::Aes192::new(GenericArray::from_slice(key)))),
            (CipherType::Aes, 32) => Aes256(Box::new(aes::Aes256::new(GenericArray::from_slice(key)))),
            (CipherType::Serpent, 16) => {
                Serpent128(Box::new(serpent::Serpent128::new(GenericArray::from_slice(key))))
            }
            (CipherType::Serpent, 24) => {
                Serpent192(Box::new(serpent::Serpent192::new(GenericArray::from_slice(key))))
            }
            (CipherType::Serpent, 32) => {
                Serpent256(Box::new(serpent::Serpent256::new(GenericArray::from_slice(key))))
            }
            (CipherType::Twofish, 16) => {
                Twofish128(Box::new(twofish::Twofish128::new(GenericArray::from_slice(key))))
            }
            (CipherType::Twofish, 24) => {
                Twofish192(Box::new(twofish::Twofish192::new(GenericArray::from_slice(key))))
            }
            (CipherType::Twofish, 32) => {
                Twofish256(Box::new(twofish::Twofish256::new(GenericArray::from_slice(key))))
            }
            _ => {
                return Err(WizardError::cipher(format!(
                    "unsupported key length {} for {cipher_type:?}",
                    key.len()
                )))
            }
        })
    }

    fn encrypt_block(&self, block: &mut [u8]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            BlockEngine::Aes128(c) => c.encrypt_block(ga),
            BlockEngine::Aes192(c) => c.encrypt_block(ga),
            BlockEngine::Aes256(c) => c.encrypt_block(ga),
            BlockEngine::Serpent128(c) => c.encrypt_block(ga),
            BlockEngine::Serpent192(c) => c.encrypt_block(ga),
            BlockEngine::Serpent256(c) => c.encrypt_block(ga),
            BlockEngine::Twofish128(c) => c.encrypt_block(ga),
            BlockEngine::Twofish192(c) => c.encrypt_block(ga),
            BlockEngine::Twofish256(c) => c.encrypt_block(ga),
        }
    }

    fn decrypt_block(&self, block: &mut [u8]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            BlockEngine::Aes128(c) => c.decrypt_block(ga),
            BlockEngine::Aes192(c) => c.decrypt_block(ga),
            BlockEngine::Aes256(c) => c.decrypt_block(ga),
            BlockEngine::Serpent128(c) => c.decrypt_block(ga),
            BlockEngine::Serpent192(c) => c.decrypt_block(ga),
            BlockEngine::Serpent256(c) => c.decrypt_block(ga),
            BlockEngine::Twofish128(c) => c.decrypt_block(ga),
            BlockEngine::Twofish192(c) => c.decrypt_block(ga),
            BlockEngine::Twofish256(c) => c.decrypt_block(ga),
        }
    }
}

fn split_tail(len: usize, block_size: usize) -> (usize, usize) {
    (len / block_size, len % block_size)
}

fn ecb_encipher(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let (full_blocks, tail_len) = split_tail(data.len(), block_size);
    let mut last_cipher = [0u8; 16];
    let mut have_last = false;
    for i in 0..full_blocks {
        let start = i * block_size;
        let block = &mut data[start..start + block_size];
        engine.encrypt_block(block);
        last_cipher[..block_size].copy_from_slice(block);
        have_last = true;
    }
    if tail_len > 0 {
        let keystream = if have_last {
            last_cipher
        } else {
            let mut iv_block = [0u8; 16];
            iv_block[..block_size].copy_from_slice(&nonce[..block_size]);
            engine.encrypt_block(&mut iv_block[..block_size]);
            iv_block
        };
        let tail_start = full_blocks * block_size;
        for j in 0..tail_len {
            data[tail_start + j] ^= keystream[j];
        }
    }
}

fn ecb_decipher(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let (full_blocks, tail_len) = split_tail(data.len(), block_size);
    let mut last_cipher = [0u8; 16];
    let mut have_last = false;
    if full_blocks > 0 {
        let start = (full_blocks - 1) * block_size;
        last_cipher[..block_size].copy_from_slice(&data[start..start + block_size]);
        have_last = true;
    }
    for i in 0..full_blocks {
        let start = i * block_size;
        let block = &mut data[start..start + block_size];
        engine.decrypt_block(block);
    }
    if tail_len > 0 {
        let keystream = if have_last {
            last_cipher
        } else {
            let mut iv_block = [0u8; 16];
            iv_block[..block_size].copy_from_slice(&nonce[..block_size]);
            engine.encrypt_block(&mut iv_block[..block_size]);
            iv_block
        };
        let tail_start = full_blocks * block_size;
        for j in 0..tail_len {
            data[tail_start + j] ^= keystream[j];
        }
    }
}

fn cbc_encipher(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let mut prev = [0u8; 16];
    prev[..block_size].copy_from_slice(&nonce[..block_size]);
    let (full_blocks, tail_len) = split_tail(data.len(), block_size);
    for i in 0..full_blocks {
        let start = i * block_size;
        for j in 0..block_size {
            data[start + j] ^= prev[j];
        }
        let block = &mut data[start..start + block_size];
        engine.encrypt_block(block);
        prev[..block_size].copy_from_slice(block);
    }
    if tail_len > 0 {
        let mut keystream = prev;
        engine.encrypt_block(&mut keystream[..block_size]);
        let tail_start = full_blocks * block_size;
        for j in 0..tail_len {
            data[tail_start + j] ^= keystream[j];
        }
    }
}

fn cbc_decipher(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let mut prev = [0u8; 16];
    prev[..block_size].copy_from_slice(&nonce[..block_size]);
    let (full_blocks, tail_len) = split_tail(data.len(), block_size);
    for i in 0..full_blocks {
        let start = i * block_size;
        let mut this_cipher = [0u8; 16];
        this_cipher[..block_size].copy_from_slice(&data[start..start + block_size]);
        let block = &mut data[start..start + block_size];
        engine.decrypt_block(block);
        for j in 0..block_size {
            data[start + j] ^= prev[j];
        }
        prev = this_cipher;
    }
    if tail_len > 0 {
        let mut keystream = prev;
        engine.encrypt_block(&mut keystream[..block_size]);
        let tail_start = full_blocks * block_size;
        for j in 0..tail_len {
            data[tail_start + j] ^= keystream[j];
        }
    }
}

fn cfb_transform(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8], encrypting: bool) {
    let mut prev = [0u8; 16];
    prev[..block_size].copy_from_slice(&nonce[..block_size]);
    let mut offset = 0;
    while offset < data.len() {
        let take = block_size.min(data.len() - offset);
        let mut keystream = prev;
        engine.encrypt_block(&mut keystream[..block_size]);
        let chunk = &mut data[offset..offset + take];
        if encrypting {
            for j in 0..take {
                chunk[j] ^= keystream[j];
            }
            prev[..take].copy_from_slice(chunk);
        } else {
            let mut cipher_chunk = [0u8; 16];
            cipher_chunk[..take].copy_from_slice(chunk);
            for j in 0..take {
                chunk[j] ^= keystream[j];
            }
            prev[..take].copy_from_slice(&cipher_chunk[..take]);
        }
        offset += take;
    }
}

fn ofb_transform(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let mut state = [0u8; 16];
    state[..block_size].copy_from_slice(&nonce[..block_size]);
    let mut offset = 0;
    while offset < data.len() {
        engine.encrypt_block(&mut state[..block_size]);
        let take = block_size.min(data.len() - offset);
        for j in 0..take {
            data[offset + j] ^= state[j];
        }
        offset += take;
    }
}

fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

fn ctr_transform(engine: &BlockEngine, block_size: usize, nonce: &[u8], data: &mut [u8]) {
    let mut counter = [0u8; 16];
    counter[..block_size].copy_from_slice(&nonce[..block_size]);
    let mut offset = 0;
    while offset < data.len() {
        let mut keystream = counter;
        engine.encrypt_block(&mut keystream[..block_size]);
        let take = block_size.min(data.len() - offset);
        for j in 0..take {
            data[offset + j] ^= keystream[j];
        }
        offset += take;
        increment_be(&mut counter[..block_size]);
    }
}

fn chacha_transform(key: &[u8], nonce: &[u8], data: &mut [u8]) -> Result<()> {
    use chacha20::cipher::{KeyIvInit, StreamCipher};
    let mut stream = chacha20::ChaCha20::new_from_slices(key, nonce)
        .map_err(|e| WizardError::cipher(e.to_string()))?;
    stream.apply_keystream(data);
    Ok(())
}

/// A key-scheduled, nonce-bound cipher, ready to encipher/decipher
/// arbitrary-length buffers under its configured mode.
pub struct CipherContext {
    cipher_type: CipherType,
    mode: CipherMode,
    key: Option<ByteBuffer>,
    block_engine: Option<BlockEngine>,
    nonce: Option<ByteBuffer>,
    generated_nonce: Option<ByteBuffer>,
}

impl CipherContext {
    pub fn acquire(cipher_type: CipherType, mode: CipherMode) -> Self {
        Self {
            cipher_type,
            mode,
            key: None,
            block_engine: None,
            nonce: None,
            generated_nonce: None,
        }
    }

    pub fn cipher_type(&self) -> CipherType {
        self.cipher_type
    }

    pub fn mode(&self) -> CipherMode {
        self.mode
    }

    pub fn block_size(&self) -> usize {
        self.cipher_type.block_size()
    }

    /// Runs the algorithm's key schedule; `key` is copied, never retained by
    /// reference, per §4.6.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        if !self.cipher_type.key_lengths().contains(&key.len()) {
            return Err(WizardError::cipher(format!(
                "key length {} unsupported for {:?}",
                key.len(),
                self.cipher_type
            )));
        }
        if !matches!(self.cipher_type, CipherType::Chacha | CipherType::None) {
            self.block_engine = Some(BlockEngine::new(self.cipher_type, key)?);
        }
        self.key = Some(ByteBuffer::from_bytes(key));
        Ok(())
    }

    /// Draws a fresh, block-sized nonce from `random` and installs it.
    pub fn generate_nonce(&mut self, random: &mut RandomContext) -> Result<()> {
        let nonce = random.get_key(self.cipher_type.block_size())?;
        self.generated_nonce = Some(nonce.clone());
        self.nonce = Some(nonce);
        Ok(())
    }

    /// Installs a caller-supplied nonce; its length must equal `block_size`.
    pub fn set_nonce(&mut self, nonce: &[u8]) -> Result<()> {
        let expected = self.cipher_type.block_size();
        if nonce.len() != expected {
            return Err(WizardError::cipher(format!(
                "nonce must be {expected} bytes, got {}",
                nonce.len()
            )));
        }
        let buf = ByteBuffer::from_bytes(nonce);
        self.generated_nonce = Some(buf.clone());
        self.nonce = Some(buf);
        Ok(())
    }

    /// Restores the nonce most recently generated or set: `encipher` then
    /// `reset_nonce` then `decipher` recovers the original plaintext.
    pub fn reset_nonce(&mut self) -> Result<()> {
        let restore = self
            .generated_nonce
            .clone()
            .ok_or_else(|| WizardError::cipher("no nonce has been generated or set"))?;
        self.nonce = Some(restore);
        Ok(())
    }

    pub fn get_nonce(&self) -> Option<&ByteBuffer> {
        self.nonce.as_ref()
    }

    pub fn encipher(&self, buf: &mut ByteBuffer) -> Result<()> {
        self.transform(buf, true)
    }

    pub fn decipher(&self, buf: &mut ByteBuffer) -> Result<()> {
        self.transform(buf, false)
    }

    fn transform(&self, buf: &mut ByteBuffer, encrypting: bool) -> Result<()> {
        if buf.is_empty() || self.cipher_type == CipherType::None {
            return Ok(());
        }
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| WizardError::cipher("key not set"))?;
        let nonce = self
            .nonce
            .as_ref()
            .ok_or_else(|| WizardError::cipher("nonce not set"))?;
        let data = buf.as_mut_bytes();

        if self.cipher_type == CipherType::Chacha {
            return chacha_transform(key.as_bytes(), nonce.as_bytes(), data);
        }

        let engine = self
            .block_engine
            .as_ref()
            .ok_or_else(|| WizardError::cipher("key not set"))?;
        let block_size = self.cipher_type.block_size();
        match self.mode {
            CipherMode::Ecb if encrypting => ecb_encipher(engine, block_size, nonce.as_bytes(), data),
            CipherMode::Ecb => ecb_decipher(engine, block_size, nonce.as_bytes(), data),
            CipherMode::Cbc if encrypting => cbc_encipher(engine, block_size, nonce.as_bytes(), data),
            CipherMode::Cbc => cbc_decipher(engine, block_size, nonce.as_bytes(), data),
            CipherMode::Cfb => cfb_transform(engine, block_size, nonce.as_bytes(), data, encrypting),
            CipherMode::Ofb => ofb_transform(engine, block_size, nonce.as_bytes(), data),
            CipherMode::Ctr => ctr_transform(engine, block_size, nonce.as_bytes(), data),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aes128_cbc_zero_vector_matches_published_ciphertext() {
        let mut ctx = CipherContext::acquire(CipherType::Aes, CipherMode::Cbc);
        ctx.set_key(&[0u8; 16]).unwrap();
        ctx.set_nonce(&[0u8; 16]).unwrap();
        let mut buf = ByteBuffer::from_bytes(&[0u8; 16]);
        ctx.encipher(&mut buf).unwrap();
        assert_eq!(
            buf.to_hex(),
            "66e94bd4ef8a2c3b884cfa59ca342b2e"
        );
        ctx.reset_nonce().unwrap();
        ctx.decipher(&mut buf).unwrap();
        assert_eq!(buf.as_bytes(), [0u8; 16]);
    }

    #[test]
    fn aes128_ctr_round_trips_a_non_block_aligned_plaintext() {
        let mut key = [0u8; 16];
        key[..7].copy_from_slice(b"FakeKey");
        let plaintext = b"1234567890abcde"; // 15 bytes
        let mut ctx = CipherContext::acquire(CipherType::Aes, CipherMode::Ctr);
        ctx.set_key(&key).unwrap();
        ctx.set_nonce(&[0u8; 16]).unwrap();
        let mut buf = ByteBuffer::from_bytes(plaintext);
        ctx.encipher(&mut buf).unwrap();
        assert_eq!(buf.len(), 15);
        ctx.reset_nonce().unwrap();
        ctx.decipher(&mut buf).unwrap();
        assert_eq!(buf.as_bytes(), plaintext);
    }

    fn round_trip(cipher_type: CipherType, mode: CipherMode, key: &[u8], nonce: &[u8], plaintext: &[u8]) {
        let mut ctx = CipherContext::acquire(cipher_type, mode);
        ctx.set_key(key).unwrap();
        ctx.set_nonce(nonce).unwrap();
        let mut buf = ByteBuffer::from_bytes(plaintext);
        ctx.encipher(&mut buf).unwrap();
        ctx.reset_nonce().unwrap();
        ctx.decipher(&mut buf).unwrap();
        assert_eq!(buf.as_bytes(), plaintext, "{cipher_type:?}/{mode:?} round trip failed");
    }

    #[test]
    fn every_mode_round_trips_short_and_unaligned_lengths() {
        let key = [0x42u8; 16];
        let nonce = [0x24u8; 16];
        for mode in [
            CipherMode::Ecb,
            CipherMode::Cbc,
            CipherMode::Cfb,
            CipherMode::Ofb,
            CipherMode::Ctr,
        ] {
            for len in [0usize, 1, 15, 16, 17, 31, 32, 33] {
                let plaintext: Vec<u8> = (0..len as u8).collect();
                round_trip(CipherType::Aes, mode, &key, &nonce, &plaintext);
            }
        }
    }

    #[test]
    fn chacha_round_trips_and_ignores_mode() {
        let key = [0x11u8; 32];
        let nonce = [0x22u8; 12];
        round_trip(CipherType::Chacha, CipherMode::Ctr, &key, &nonce, b"chacha stream test payload");
    }

    #[test]
    fn rejects_unsupported_key_length() {
        let mut ctx = CipherContext::acquire(CipherType::Aes, CipherMode::Cbc);
        assert!(ctx.set_key(&[0u8; 20]).is_err());
    }

    #[test]
    fn requires_key_and_nonce_before_transform() {
        let ctx = CipherContext::acquire(CipherType::Aes, CipherMode::Cbc);
        let mut buf = ByteBuffer::from_bytes(b"abc");
        assert!(ctx.encipher(&mut buf).is_err());
    }
}
