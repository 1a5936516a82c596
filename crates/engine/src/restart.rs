// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restart Governor (component C): decides whether a stopped, enabled
//! instance should be (re)started this tick, and disables instances that
//! restart too often inside a rolling-but-hard-reset 60 second window.

use std::time::Duration;

use sv_core::{Clock, Instance};

/// What the governor decided to do with a stopped, enabled instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Start it: either the window had elapsed (reset) or we're still
    /// under the per-window limit.
    Start,
    /// The window's restart budget is exhausted; the instance has been
    /// disabled (caller still needs to persist that).
    LimitReached,
}

/// Evaluate one enabled, non-running instance and update its window
/// bookkeeping in place. Mirrors the original hard-reset window: once 60s
/// have passed since the window started, the counter resets to zero rather
/// than sliding.
pub fn evaluate(instance: &mut Instance, clock: &dyn Clock, window: Duration) -> RestartDecision {
    let now = clock.now();

    let within_window = instance
        .restart_window_start
        .is_some_and(|start| now.duration_since(start) <= window);

    if !within_window {
        instance.restart_window_start = Some(now);
        instance.restarts_in_window = 0;
        return RestartDecision::Start;
    }

    instance.restarts_in_window += 1;
    if instance.restarts_in_window >= instance.max_restarts_per_minute {
        instance.enabled = false;
        RestartDecision::LimitReached
    } else {
        RestartDecision::Start
    }
}

#[cfg(test)]
#[path = "restart_tests.rs"]
mod tests;
