// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Random Source
//!
//! A hash-chained pseudo-random generator. Each draw hashes the current
//! reservoir forward to produce output and separately folds it forward to
//! the next reservoir, so observing output bytes never reveals the
//! reservoir that produced them. A process-wide secret seed, installed via
//! [`set_secret_key`], switches every subsequently acquired context into a
//! deterministic mode whose output is a pure function of the seed — used by
//! tests that need reproducible key/nonce material across runs.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::{rngs::OsRng, TryRngCore};

use crate::error::{Result, WizardError};
use crate::services::hash::{HashAlgorithm, HashContext};
use crate::value_objects::ByteBuffer;

/// Environment variables whose file contents are folded into the entropy
/// pool on first draw, alongside OS entropy, a timestamp, and the process
/// id. Unset or unreadable entries are skipped.
const ENTROPY_PATH_VARS: [&str; 6] = [
    "WIZARD_RANDOM_PATH_1",
    "WIZARD_RANDOM_PATH_2",
    "WIZARD_RANDOM_PATH_3",
    "WIZARD_RANDOM_PATH_4",
    "WIZARD_RANDOM_PATH_5",
    "WIZARD_RANDOM_PATH_6",
];

static SECRET_SEED: OnceLock<Mutex<Option<u64>>> = OnceLock::new();

fn secret_seed_cell() -> &'static Mutex<Option<u64>> {
    SECRET_SEED.get_or_init(|| Mutex::new(None))
}

/// Installs a process-wide fixed seed: every [`RandomContext`] acquired
/// afterwards draws a byte-identical sequence across runs and processes.
pub fn set_secret_key(seed: u64) {
    *secret_seed_cell().lock() = Some(seed);
}

/// Clears a previously installed secret key, returning new contexts to
/// OS-entropy-backed nondeterministic mode.
pub fn clear_secret_key() {
    *secret_seed_cell().lock() = None;
}

fn current_secret_key() -> Option<u64> {
    *secret_seed_cell().lock()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomMode {
    Nondeterministic,
    Seeded,
}

/// A hash-chained random byte source.
pub struct RandomContext {
    hash_algorithm: HashAlgorithm,
    reservoir: ByteBuffer,
    counter: u64,
    seed: Option<u64>,
}

impl RandomContext {
    /// Acquires a context primed against the current process-wide secret
    /// key (if any), or OS entropy otherwise. Defaults callers to SHA-256
    /// when no particular hash algorithm is required.
    pub fn acquire(hash_algorithm: HashAlgorithm) -> Result<Self> {
        let seed = current_secret_key();
        let reservoir = Self::prime_reservoir(hash_algorithm, seed)?;
        Ok(Self {
            hash_algorithm,
            reservoir,
            counter: 0,
            seed,
        })
    }

    pub fn mode(&self) -> RandomMode {
        if self.seed.is_some() {
            RandomMode::Seeded
        } else {
            RandomMode::Nondeterministic
        }
    }

    fn prime_reservoir(hash_algorithm: HashAlgorithm, seed: Option<u64>) -> Result<ByteBuffer> {
        match seed {
            Some(seed) => HashContext::digest_of(hash_algorithm, &seed.to_le_bytes()),
            None => {
                let mut pool = Vec::new();
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or(0);
                pool.extend_from_slice(&nanos.to_le_bytes());
                pool.extend_from_slice(&(std::process::id() as u64).to_le_bytes());
                if let Ok(hostname) =
                    std::env::var("HOSTNAME").or_else(|_| std::env::var("COMPUTERNAME"))
                {
                    pool.extend_from_slice(hostname.as_bytes());
                }

                let mut os_entropy = vec![0u8; 32];
                OsRng
                    .try_fill_bytes(&mut os_entropy)
                    .map_err(|_| WizardError::random("OS entropy unavailable"))?;
                pool.extend_from_slice(&os_entropy);

                for var in ENTROPY_PATH_VARS {
                    if let Some(path) = std::env::var_os(var) {
                        if let Ok(contents) = std::fs::read(&path) {
                            pool.extend_from_slice(&contents);
                        }
                    }
                }

                HashContext::digest_of(hash_algorithm, &pool)
            }
        }
    }

    /// Draws one digest-sized block and advances the reservoir.
    fn next_block(&mut self) -> Result<Vec<u8>> {
        let mut input = self.reservoir.as_bytes().to_vec();
        input.extend_from_slice(&self.counter.to_be_bytes());
        self.counter = self.counter.wrapping_add(1);
        let block = HashContext::digest_of(self.hash_algorithm, &input)?;

        let mut next_reservoir = self.reservoir.as_bytes().to_vec();
        next_reservoir.extend_from_slice(block.as_bytes());
        self.reservoir = HashContext::digest_of(self.hash_algorithm, &next_reservoir)?;

        Ok(block.into_vec())
    }

    /// Produces a fresh key of exactly `n_bytes`.
    pub fn get_key(&mut self, n_bytes: usize) -> Result<ByteBuffer> {
        let mut out = Vec::with_capacity(n_bytes);
        while out.len() < n_bytes {
            let block = self.next_block()?;
            let take = (n_bytes - out.len()).min(block.len());
            out.extend_from_slice(&block[..take]);
        }
        Ok(ByteBuffer::from_vec(out))
    }

    /// Fills a fixed-size caller buffer in place.
    pub fn set_key(&mut self, output: &mut [u8]) -> Result<()> {
        let drawn = self.get_key(output.len())?;
        output.copy_from_slice(drawn.as_bytes());
        Ok(())
    }

    /// A uniform `f64` in `[0, 1)` built from a 53-bit mantissa assembled
    /// out of two 32-bit slices of freshly drawn bytes.
    pub fn get_value(&mut self) -> Result<f64> {
        let bytes = self.get_key(8)?;
        let raw = bytes.as_bytes();
        let hi = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let lo = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        let mantissa = ((hi >> 5) as u64) << 26 | (lo >> 6) as u64;
        Ok(mantissa as f64 / (1u64 << 53) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `set_secret_key`/`clear_secret_key` mutate the process-global
    // `SECRET_SEED`, and cargo runs a crate's tests concurrently within one
    // binary. Every test below holds this guard for its whole body so the
    // global-state assertions can't interleave with another thread's
    // set/clear pair.
    static SEED_TEST_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn seeded_mode_is_deterministic_across_independent_contexts() {
        let _guard = SEED_TEST_GUARD.lock();
        set_secret_key(0x5eed_c0de);
        let mut a = RandomContext::acquire(HashAlgorithm::Sha2_256).unwrap();
        let mut b = RandomContext::acquire(HashAlgorithm::Sha2_256).unwrap();
        assert_eq!(a.mode(), RandomMode::Seeded);
        let key_a = a.get_key(40).unwrap();
        let key_b = b.get_key(40).unwrap();
        assert_eq!(key_a, key_b);
        clear_secret_key();
    }

    #[test]
    fn output_never_repeats_a_prior_reservoir_byte_for_byte() {
        let _guard = SEED_TEST_GUARD.lock();
        set_secret_key(7);
        let mut ctx = RandomContext::acquire(HashAlgorithm::Sha2_256).unwrap();
        let first = ctx.get_key(32).unwrap();
        let second = ctx.get_key(32).unwrap();
        assert_ne!(first, second);
        clear_secret_key();
    }

    #[test]
    fn get_value_is_within_unit_interval() {
        let _guard = SEED_TEST_GUARD.lock();
        set_secret_key(99);
        let mut ctx = RandomContext::acquire(HashAlgorithm::Sha2_256).unwrap();
        for _ in 0..64 {
            let v = ctx.get_value().unwrap();
            assert!((0.0..1.0).contains(&v));
        }
        clear_secret_key();
    }

    #[test]
    fn nondeterministic_mode_is_reported_without_a_seed() {
        let _guard = SEED_TEST_GUARD.lock();
        clear_secret_key();
        let ctx = RandomContext::acquire(HashAlgorithm::Sha2_256).unwrap();
        assert_eq!(ctx.mode(), RandomMode::Nondeterministic);
    }
}
