//! Platform-facing adapters: the on-disk keyring file format, TTY-aware
//! passphrase input, structured logging, and environment-driven path
//! resolution.

pub mod config;
pub mod keyring_file;
pub mod logging;
pub mod passphrase;

pub use keyring_file::{KeyringFileService, KeyringRecord};
