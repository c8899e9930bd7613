// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Session Keyring
//!
//! A per-process `id -> key` map whose every entry except one is stored
//! AES-CTR-enveloped under a process-unique session key. Application code
//! never sees the session key directly, only the ids it generates and the
//! plaintext keys `get` hands back after transparently unwrapping them.

use indexmap::IndexMap;
use parking_lot::Mutex;

use wizardtk_core::error::{Result, WizardError};
use wizardtk_core::services::{CipherContext, CipherMode, CipherType, HashAlgorithm, HmacContext, RandomContext};
use wizardtk_core::value_objects::ByteBuffer;

const SESSION_KEY_LEN: usize = 32;
const SESSION_NONCE_LEN: usize = 16;

/// The in-memory, mutex-protected session keyring.
pub struct Keyring {
    session_id: ByteBuffer,
    entries: Mutex<IndexMap<ByteBuffer, ByteBuffer>>,
    cipher: Mutex<CipherContext>,
    random: Mutex<RandomContext>,
}

impl Keyring {
    /// Generates a fresh session key and nonce and installs the session
    /// entry (`session_id -> session_key`, stored in the clear).
    pub fn acquire() -> Result<Self> {
        let mut random = RandomContext::acquire(HashAlgorithm::Sha2_256)?;
        let session_key = random.get_key(SESSION_KEY_LEN)?;
        let session_nonce = random.get_key(SESSION_NONCE_LEN)?;
        let mac_key = random.get_key(SESSION_KEY_LEN)?;
        let session_id = HmacContext::construct(HashAlgorithm::Sha2_256, mac_key.as_bytes(), session_key.as_bytes())?;

        let mut cipher = CipherContext::acquire(CipherType::Aes, CipherMode::Ctr);
        cipher.set_key(session_key.as_bytes())?;
        cipher.set_nonce(session_nonce.as_bytes())?;

        let mut entries = IndexMap::new();
        entries.insert(session_id.clone(), session_key);

        Ok(Self {
            session_id,
            entries: Mutex::new(entries),
            cipher: Mutex::new(cipher),
            random: Mutex::new(random),
        })
    }

    pub fn session_id(&self) -> &ByteBuffer {
        &self.session_id
    }

    /// Draws a fresh random key of `key_length_bytes`, derives its id via
    /// `HMAC_SHA256(mac_key, key)` under a disposable mac key, installs
    /// `id -> wrap(key)`, and returns the id.
    pub fn generate_session_key(&self, key_length_bytes: usize) -> Result<ByteBuffer> {
        let (key, mac_key) = {
            let mut random = self.random.lock();
            let key = random.get_key(key_length_bytes)?;
            let mac_key = random.get_key(key_length_bytes)?;
            (key, mac_key)
        };
        let id = HmacContext::construct(HashAlgorithm::Sha2_256, mac_key.as_bytes(), key.as_bytes())?;
        self.set(&id, &key)?;
        Ok(id)
    }

    /// Wraps and stores `key` under `id`.
    pub fn set(&self, id: &ByteBuffer, key: &ByteBuffer) -> Result<()> {
        let wrapped = self.wrap(key)?;
        self.entries.lock().insert(id.clone(), wrapped);
        Ok(())
    }

    /// Looks up `id` and unwraps the stored key; the distinguished session
    /// entry is returned as-is, since it is never wrapped.
    pub fn get(&self, id: &ByteBuffer) -> Result<ByteBuffer> {
        let stored = {
            let entries = self.entries.lock();
            entries
                .get(id)
                .cloned()
                .ok_or_else(|| WizardError::key("id not found in keyring"))?
        };
        if *id == self.session_id {
            Ok(stored)
        } else {
            self.unwrap(&stored)
        }
    }

    /// Number of entries currently held, including the session entry.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Zeroes the session key, every wrapped value, and the map storage.
    /// `ByteBuffer`'s own destructor already does this on drop; `destroy`
    /// exists so callers can retire a keyring explicitly rather than rely
    /// on scope exit.
    pub fn destroy(self) {
        drop(self);
    }

    fn wrap(&self, plaintext: &ByteBuffer) -> Result<ByteBuffer> {
        let mut buf = plaintext.clone();
        self.cipher.lock().encipher(&mut buf)?;
        Ok(buf)
    }

    fn unwrap(&self, wrapped: &ByteBuffer) -> Result<ByteBuffer> {
        let mut buf = wrapped.clone();
        self.cipher.lock().decipher(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_generated_entry() {
        let keyring = Keyring::acquire().unwrap();
        let id = keyring.generate_session_key(32).unwrap();
        let key = keyring.get(&id).unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn set_then_get_recovers_the_same_key() {
        let keyring = Keyring::acquire().unwrap();
        let id = HashSha256FakeId::of("FakeID");
        let mut key_bytes = b"FakeKey".to_vec();
        key_bytes.resize(32, 0);
        let key = ByteBuffer::from_bytes(&key_bytes);
        keyring.set(&id, &key).unwrap();
        assert_eq!(keyring.get(&id).unwrap(), key);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let keyring = Keyring::acquire().unwrap();
        let missing = ByteBuffer::from_bytes(b"nonexistent-id");
        assert!(keyring.get(&missing).is_err());
    }

    #[test]
    fn session_entry_is_returned_unwrapped() {
        let keyring = Keyring::acquire().unwrap();
        let session_id = keyring.session_id().clone();
        // The session entry must round-trip even though it was never
        // routed through `wrap`/`unwrap` at insertion time.
        assert!(keyring.get(&session_id).is_ok());
    }

    /// Test-only helper matching the literal `SHA-256("FakeID")` id used by
    /// the keyring round-trip scenario.
    struct HashSha256FakeId;
    impl HashSha256FakeId {
        fn of(s: &str) -> ByteBuffer {
            wizardtk_core::services::HashContext::digest_of(HashAlgorithm::Sha2_256, s.as_bytes()).unwrap()
        }
    }
}
