// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate (component
//! J, the daemon-level half: paths, as opposed to [`sv_engine::env`]'s tick
//! timing tunables).

use std::path::PathBuf;

/// Resolve the state directory: `SV_STATE_DIR` > `XDG_STATE_HOME/sv` >
/// the platform state dir (`dirs::state_dir()`) joined with `sv`.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SV_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("sv"));
    }
    dirs::state_dir().map(|d| d.join("sv"))
}

/// Resolve the static instance-config document path: `SV_CONFIG_PATH`, or
/// `<state_dir>/config.toml` otherwise.
pub fn config_path(state_dir: &std::path::Path) -> PathBuf {
    std::env::var("SV_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir.join("config.toml"))
}
