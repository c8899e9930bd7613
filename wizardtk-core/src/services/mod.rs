//! The cryptographic engine's streaming services: hashing, HMAC, the random
//! source, the entropy (compression) coder, and the block-cipher engine.

pub mod cipher;
pub mod entropy;
pub mod hash;
pub mod hmac;
pub mod random;

pub use cipher::{CipherContext, CipherMode, CipherType};
pub use entropy::{EntropyAlgorithm, EntropyContext};
pub use hash::{HashAlgorithm, HashContext, HashPhase};
pub use hmac::HmacContext;
pub use random::{clear_secret_key, set_secret_key, RandomContext, RandomMode};
