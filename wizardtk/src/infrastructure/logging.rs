// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Initializes a process-wide [`tracing`] subscriber. Verbosity is driven by
//! `WIZARD_LOG` (falling back to `RUST_LOG`), matching the rest of the
//! ecosystem's `EnvFilter` convention; callers that want a fixed level
//! instead of environment-driven filtering can use [`init_with_level`].

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,wizardtk=info,wizardtk_core=info";

/// Installs the global subscriber from `WIZARD_LOG`/`RUST_LOG`, defaulting
/// to [`DEFAULT_FILTER`] when neither is set. Safe to call more than once;
/// later calls are no-ops.
pub fn init() {
    let filter = std::env::var("WIZARD_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    install(EnvFilter::new(filter));
}

/// Installs the global subscriber at a fixed level, ignoring environment
/// variables. Intended for tests and embedders that manage verbosity
/// themselves.
pub fn init_with_level(level: tracing::Level) {
    install(EnvFilter::new(level.to_string()));
}

fn install(filter: EnvFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    // `set_global_default` fails if a subscriber is already installed;
    // that's expected when init() runs more than once in a process.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }

    #[test]
    fn init_with_level_does_not_panic() {
        init_with_level(tracing::Level::DEBUG);
    }
}
