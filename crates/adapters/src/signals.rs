// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal handling: translates SIGINT/SIGTERM/SIGQUIT into the supervisor's
//! stop flag and shutdown-mode intent, entirely through `signal-hook`'s safe
//! registration API so no `unsafe` signal handler is written here.
//!
//! SIGPIPE is left to its default disposition at the OS level by simply
//! never registering it — the Stats Protocol Client already treats a write
//! failure on a dead peer as an ordinary I/O error, so there's nothing for a
//! handler to do. SIGSEGV is deliberately not intercepted either: best-effort
//! cleanup from a handler running after memory corruption is not something a
//! safe Rust program can express, so a SIGSEGV takes the process down the
//! default way and the next launch's adopt-pid path picks the instances back up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;

use sv_engine::ShutdownMode;

/// Spawns a background thread that waits on SIGINT/SIGTERM/SIGQUIT and, on
/// the first one received, sets `stop` and stores the resulting shutdown
/// mode. Further signals are ignored once `stop` is set.
pub fn install(stop: Arc<AtomicBool>, mode: Arc<parking_lot::Mutex<ShutdownMode>>) -> std::io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGQUIT])?;
    std::thread::spawn(move || {
        for signal in signals.forever() {
            if stop.load(Ordering::SeqCst) {
                continue;
            }
            let chosen = match signal {
                SIGQUIT => ShutdownMode::Adopt,
                _ => ShutdownMode::TerminateAll,
            };
            *mode.lock() = chosen;
            stop.store(true, Ordering::SeqCst);
        }
    });
    Ok(())
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
