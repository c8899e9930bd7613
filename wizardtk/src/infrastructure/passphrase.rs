// /////////////////////////////////////////////////////////////////////////////
// Wizard's Toolkit
// Copyright (c) 2025 A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Passphrase Input
//!
//! A TTY-aware passphrase prompt: disables terminal echo via POSIX termios,
//! confirms the passphrase by prompting twice, and restores terminal state
//! on every exit path — including delivery of a signal that would otherwise
//! leave the controlling terminal echo-less. Built directly on `libc`
//! syscalls rather than a `termios`/`nix` crate, matching how this
//! workspace's other platform-facing code reaches for `libc` directly
//! instead of a higher-level POSIX wrapper.

use wizardtk_core::error::{Result, WizardError};
use wizardtk_core::value_objects::ByteBuffer;

const PROMPT_FIRST: &str = "Enter passphrase: ";
const PROMPT_SECOND: &str = "Enter same passphrase again: ";
const MISMATCH_MESSAGE: &str = "Passphrases are different.  Try again.";
const MAX_PASSPHRASE_LEN: usize = 1024;

/// Prompts twice and confirms the two entries match, retrying on mismatch.
pub fn get_passphrase() -> Result<ByteBuffer> {
    loop {
        let first = get_phrase(PROMPT_FIRST)?;
        let second = get_phrase(PROMPT_SECOND)?;
        if first == second {
            return Ok(first);
        }
        eprintln!("{MISMATCH_MESSAGE}");
    }
}

/// Reads one line from the controlling terminal with echo disabled, or
/// falls back to standard input (with a visible warning) when no TTY is
/// available.
#[cfg(unix)]
pub fn get_phrase(prompt: &str) -> Result<ByteBuffer> {
    unix::get_phrase(prompt)
}

#[cfg(not(unix))]
pub fn get_phrase(prompt: &str) -> Result<ByteBuffer> {
    fallback::get_phrase(prompt)
}

#[cfg(unix)]
mod unix {
    use std::io::Write;
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::*;

    static SIGNAL_NUMBER: AtomicI32 = AtomicI32::new(0);

    const WATCHED_SIGNALS: [libc::c_int; 9] = [
        libc::SIGALRM,
        libc::SIGHUP,
        libc::SIGINT,
        libc::SIGPIPE,
        libc::SIGQUIT,
        libc::SIGTERM,
        libc::SIGTSTP,
        libc::SIGTTIN,
        libc::SIGTTOU,
    ];

    extern "C" fn record_signal(signal: libc::c_int) {
        // Async-signal-safe: a single atomic store, nothing else.
        SIGNAL_NUMBER.store(signal, Ordering::SeqCst);
    }

    struct SignalGuard {
        previous: Vec<(libc::c_int, libc::sigaction)>,
    }

    impl SignalGuard {
        fn install() -> Self {
            let mut previous = Vec::with_capacity(WATCHED_SIGNALS.len());
            let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
            action.sa_sigaction = record_signal as usize;
            unsafe {
                libc::sigemptyset(&mut action.sa_mask);
            }
            action.sa_flags = 0;

            for &signal in &WATCHED_SIGNALS {
                let mut old: libc::sigaction = unsafe { std::mem::zeroed() };
                unsafe {
                    libc::sigaction(signal, &action, &mut old);
                }
                previous.push((signal, old));
            }
            Self { previous }
        }

        fn pending(&self) -> libc::c_int {
            SIGNAL_NUMBER.load(Ordering::SeqCst)
        }
    }

    impl Drop for SignalGuard {
        fn drop(&mut self) {
            for (signal, old) in &self.previous {
                unsafe {
                    libc::sigaction(*signal, old, std::ptr::null_mut());
                }
            }
        }
    }

    struct TerminalGuard {
        fd: libc::c_int,
        owns_fd: bool,
        original: libc::termios,
    }

    impl TerminalGuard {
        fn open() -> Result<Self> {
            let path = std::ffi::CString::new("/dev/tty").expect("no interior NUL");
            let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR) };
            let (fd, owns_fd) = if fd >= 0 {
                (fd, true)
            } else {
                (libc::STDIN_FILENO, false)
            };

            let mut original: libc::termios = unsafe { std::mem::zeroed() };
            if unsafe { libc::tcgetattr(fd, &mut original) } != 0 {
                if owns_fd {
                    unsafe {
                        libc::close(fd);
                    }
                }
                return Err(WizardError::passphrase(
                    "no controlling terminal available for echo-off input",
                ));
            }

            let mut silenced = original;
            silenced.c_lflag &= !(libc::ECHO | libc::ECHONL);
            if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, &silenced) } != 0 {
                if owns_fd {
                    unsafe {
                        libc::close(fd);
                    }
                }
                return Err(WizardError::passphrase("failed to disable terminal echo"));
            }

            Ok(Self { fd, owns_fd, original })
        }

        fn read_line(&self) -> Result<Vec<u8>> {
            let mut bytes = Vec::new();
            let mut byte = [0u8; 1];
            loop {
                let n = unsafe { libc::read(self.fd, byte.as_mut_ptr() as *mut libc::c_void, 1) };
                if n <= 0 {
                    break;
                }
                if byte[0] == b'\n' || byte[0] == b'\r' {
                    break;
                }
                bytes.push(byte[0]);
                if bytes.len() >= MAX_PASSPHRASE_LEN {
                    break;
                }
            }
            Ok(bytes)
        }
    }

    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            unsafe {
                libc::tcsetattr(self.fd, libc::TCSAFLUSH, &self.original);
            }
            if self.owns_fd {
                unsafe {
                    libc::close(self.fd);
                }
            }
        }
    }

    pub fn get_phrase(prompt: &str) -> Result<ByteBuffer> {
        print!("{prompt}");
        std::io::stdout()
            .flush()
            .map_err(|e| WizardError::passphrase(e.to_string()))?;

        let signals = SignalGuard::install();
        let terminal = TerminalGuard::open();

        let terminal = match terminal {
            Ok(t) => t,
            Err(e) => {
                drop(signals);
                return Err(e);
            }
        };

        let bytes = terminal.read_line();
        // Drop order matters: restore the terminal before the signal
        // handlers so a re-raised signal's default action doesn't fire
        // against an echo-disabled terminal.
        let pending = signals.pending();
        drop(terminal);
        drop(signals);
        println!();

        if pending != 0 {
            unsafe {
                libc::raise(pending);
            }
            if matches!(pending, libc::SIGTSTP | libc::SIGTTIN | libc::SIGTTOU) {
                // The process has resumed: retry the prompt from scratch.
                return get_phrase(prompt);
            }
        }

        Ok(ByteBuffer::from_vec(bytes?))
    }
}

#[cfg(not(unix))]
mod fallback {
    use std::io::{BufRead, Write};

    use super::*;

    pub fn get_phrase(prompt: &str) -> Result<ByteBuffer> {
        eprintln!("warning: terminal echo suppression is unavailable on this platform");
        print!("{prompt}");
        std::io::stdout()
            .flush()
            .map_err(|e| WizardError::passphrase(e.to_string()))?;
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| WizardError::passphrase(e.to_string()))?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(ByteBuffer::from_string(trimmed))
    }
}
