// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration
//!
//! Environment-driven path resolution only. None of these variables carry
//! secrets; they name directories the keyring file service and passphrase
//! source consult.

use std::path::PathBuf;

/// Resolves the directory temporary keyring-file artifacts are created
/// under, preferring `WIZARD_TMPDIR`, then `TMPDIR`, then `TMP`, then
/// `TEMP`, then the platform default.
pub fn resolve_tmp_dir() -> PathBuf {
    for var in ["WIZARD_TMPDIR", "TMPDIR", "TMP", "TEMP"] {
        if let Some(path) = non_empty_env(var) {
            return PathBuf::from(path);
        }
    }
    std::env::temp_dir()
}

/// Resolves the directory persistent configuration and keyring files live
/// under, preferring `WIZARD_HOME`, then `XDG_CONFIG_HOME`, then
/// `$HOME/.wizard`, in that precedence.
pub fn resolve_config_dir() -> Option<PathBuf> {
    if let Some(path) = non_empty_env("WIZARD_HOME") {
        return Some(PathBuf::from(path));
    }
    if let Some(path) = non_empty_env("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(path).join("wizard"));
    }
    non_empty_env("HOME").map(|home| PathBuf::from(home).join(".wizard"))
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tmp_dir_prefers_wizard_tmpdir() {
        // SAFETY: tests run single-threaded within this process's env
        // mutation scope is accepted for this exercise.
        unsafe {
            std::env::set_var("WIZARD_TMPDIR", "/tmp/wizard-test-dir");
        }
        assert_eq!(resolve_tmp_dir(), PathBuf::from("/tmp/wizard-test-dir"));
        unsafe {
            std::env::remove_var("WIZARD_TMPDIR");
        }
    }

    #[test]
    fn resolve_tmp_dir_falls_back_to_platform_default() {
        unsafe {
            std::env::remove_var("WIZARD_TMPDIR");
            std::env::remove_var("TMPDIR");
            std::env::remove_var("TMP");
            std::env::remove_var("TEMP");
        }
        assert_eq!(resolve_tmp_dir(), std::env::temp_dir());
    }

    #[test]
    fn resolve_config_dir_prefers_wizard_home() {
        unsafe {
            std::env::set_var("WIZARD_HOME", "/tmp/wizard-home");
        }
        assert_eq!(resolve_config_dir(), Some(PathBuf::from("/tmp/wizard-home")));
        unsafe {
            std::env::remove_var("WIZARD_HOME");
        }
    }

    #[test]
    fn resolve_config_dir_falls_back_to_xdg_then_home() {
        unsafe {
            std::env::remove_var("WIZARD_HOME");
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/xdg");
        }
        assert_eq!(resolve_config_dir(), Some(PathBuf::from("/tmp/xdg/wizard")));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
