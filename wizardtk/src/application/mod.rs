//! Key-management operations built on the cryptographic engine: the
//! in-process session keyring and the passphrase-backed secret authenticator.

mod authenticator;
mod keyring;

pub use authenticator::SecretAuthenticator;
pub use keyring::Keyring;
