// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-level tunables (component J), overridable via environment
//! variables. These govern the engine's own timing, not the instance config
//! tree, which remains an external (H) concern.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_u32(var: &str) -> Option<u32> {
    std::env::var(var).ok().and_then(|s| s.parse::<u32>().ok())
}

/// Reconciliation tick period (default: 1500ms).
pub fn tick_period() -> Duration {
    parse_duration_ms("SV_TICK_MS").unwrap_or(Duration::from_millis(1500))
}

/// Grace window between SIGINT and SIGKILL (default: 500ms).
pub fn grace_period() -> Duration {
    parse_duration_ms("SV_GRACE_MS").unwrap_or(Duration::from_millis(500))
}

/// Dial back-off cadence in ticks (default: 30).
pub fn dial_period_ticks() -> u32 {
    parse_u32("SV_DIAL_PERIOD_TICKS").unwrap_or(30)
}

/// Number of non-blocking retry attempts per protocol send/recv (default: 3).
pub fn protocol_retries() -> u32 {
    parse_u32("SV_PROTOCOL_RETRIES").unwrap_or(3)
}

/// Sleep between non-blocking retry attempts (default: 25ms).
pub fn protocol_retry_interval() -> Duration {
    parse_duration_ms("SV_PROTOCOL_RETRY_MS").unwrap_or(Duration::from_millis(25))
}

/// Restart-rate-limit window (default: 60s, hard-reset not sliding).
pub fn restart_window() -> Duration {
    parse_duration_ms("SV_RESTART_WINDOW_MS").unwrap_or(Duration::from_secs(60))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
