// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Keyring File Service
//!
//! A versioned, little-endian binary container of `{version, id, nonce,
//! wrapped_key}` records, concatenated one after another. Readers scan
//! linearly for a matching id rather than indexing — files are expected to
//! hold at most a handful of secrets, so an index would be premature.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use wizardtk_core::error::{Result, WizardError};
use wizardtk_core::value_objects::ByteBuffer;

const FORMAT_VERSION: u16 = 0x0001;

/// One decoded on-disk record.
#[derive(Debug, Clone)]
pub struct KeyringRecord {
    pub id: Vec<u8>,
    pub nonce: Vec<u8>,
    pub wrapped_key: Vec<u8>,
}

/// Reads and appends keyring records at a fixed path.
pub struct KeyringFileService {
    path: PathBuf,
}

impl KeyringFileService {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `{version, id, nonce, wrapped_key}` to the file, creating it
    /// with mode 0600 if it does not yet exist.
    pub fn import(&self, id: &ByteBuffer, nonce: &[u8], wrapped_key: &[u8]) -> Result<()> {
        let mut record = Vec::with_capacity(2 + 4 * 3 + id.len() + nonce.len() + wrapped_key.len());
        record.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        record.extend_from_slice(&(id.len() as u32).to_le_bytes());
        record.extend_from_slice(id.as_bytes());
        record.extend_from_slice(&(nonce.len() as u32).to_le_bytes());
        record.extend_from_slice(nonce);
        record.extend_from_slice(&(wrapped_key.len() as u32).to_le_bytes());
        record.extend_from_slice(wrapped_key);

        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&self.path)?;
        file.write_all(&record)?;
        Ok(())
    }

    /// Scans the file for a record whose id equals `id`.
    pub fn export(&self, id: &ByteBuffer) -> Result<KeyringRecord> {
        let contents = std::fs::read(&self.path)
            .map_err(|e| WizardError::key(format!("keyring file unreadable: {e}")))?;

        let mut cursor = 0usize;
        while cursor < contents.len() {
            let record = Self::read_record(&contents, &mut cursor)?;
            if record.id == id.as_bytes() {
                return Ok(record);
            }
        }
        Err(WizardError::key("id not found in keyring file"))
    }

    /// Human-readable listing of every record's id and lengths, for
    /// diagnostics. Never renders key material.
    pub fn print_properties(&self) -> Result<String> {
        let contents = std::fs::read(&self.path)
            .map_err(|e| WizardError::key(format!("keyring file unreadable: {e}")))?;
        let mut cursor = 0usize;
        let mut out = String::new();
        let mut count = 0usize;
        while cursor < contents.len() {
            let record = Self::read_record(&contents, &mut cursor)?;
            out.push_str(&format!(
                "record {count}: id={} nonce_len={} key_len={}\n",
                hex::encode(&record.id),
                record.nonce.len(),
                record.wrapped_key.len()
            ));
            count += 1;
        }
        Ok(out)
    }

    fn read_record(contents: &[u8], cursor: &mut usize) -> Result<KeyringRecord> {
        let _version = Self::read_u16(contents, cursor)?;
        let id_len = Self::read_u32(contents, cursor)? as usize;
        let id = Self::read_bytes(contents, cursor, id_len)?;
        let nonce_len = Self::read_u32(contents, cursor)? as usize;
        let nonce = Self::read_bytes(contents, cursor, nonce_len)?;
        let key_len = Self::read_u32(contents, cursor)? as usize;
        let wrapped_key = Self::read_bytes(contents, cursor, key_len)?;
        Ok(KeyringRecord { id, nonce, wrapped_key })
    }

    fn read_u16(contents: &[u8], cursor: &mut usize) -> Result<u16> {
        let bytes = Self::read_bytes(contents, cursor, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(contents: &[u8], cursor: &mut usize) -> Result<u32> {
        let bytes = Self::read_bytes(contents, cursor, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_bytes(contents: &[u8], cursor: &mut usize, len: usize) -> Result<Vec<u8>> {
        let end = cursor
            .checked_add(len)
            .filter(|end| *end <= contents.len())
            .ok_or_else(|| WizardError::key("keyring file record is truncated"))?;
        let slice = contents[*cursor..end].to_vec();
        *cursor = end;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_then_export_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let service = KeyringFileService::new(dir.path().join("keyring.bin"));
        let id = ByteBuffer::from_bytes(b"an-id");
        service.import(&id, b"0123456789abcdef", b"wrapped-key-bytes").unwrap();

        let record = service.export(&id).unwrap();
        assert_eq!(record.id, b"an-id");
        assert_eq!(record.nonce, b"0123456789abcdef");
        assert_eq!(record.wrapped_key, b"wrapped-key-bytes");
    }

    #[test]
    fn export_scans_past_non_matching_records() {
        let dir = tempfile::tempdir().unwrap();
        let service = KeyringFileService::new(dir.path().join("keyring.bin"));
        for i in 0..5u8 {
            let id = ByteBuffer::from_bytes(&[i; 4]);
            service.import(&id, &[0u8; 16], &[i; 8]).unwrap();
        }
        let target = ByteBuffer::from_bytes(&[3u8; 4]);
        let record = service.export(&target).unwrap();
        assert_eq!(record.wrapped_key, vec![3u8; 8]);
    }

    #[test]
    fn export_on_missing_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = KeyringFileService::new(dir.path().join("keyring.bin"));
        service
            .import(&ByteBuffer::from_bytes(b"other"), &[0u8; 16], b"x")
            .unwrap();
        assert!(service.export(&ByteBuffer::from_bytes(b"missing")).is_err());
    }

    #[test]
    fn export_on_nonexistent_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = KeyringFileService::new(dir.path().join("does-not-exist.bin"));
        assert!(service.export(&ByteBuffer::from_bytes(b"id")).is_err());
    }
}
