// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service-Socket Dialer (component E): back-off-gated connection attempts
//! to each running instance's control socket.

use std::os::unix::net::UnixStream;
use std::path::Path;

use sv_core::Instance;

/// Derives the well-known control-socket path for a pid, matching the
/// `service_<pid>` naming the instance side binds to.
pub fn socket_path(socket_dir: &Path, pid: i32) -> std::path::PathBuf {
    socket_dir.join(format!("service_{pid}"))
}

/// Dials one instance's control socket, gated by `N_reconnect`. Returns the
/// freshly connected stream on success so the caller (Stats Protocol
/// Client) can reuse it without reopening; `Ok(None)` means not eligible or
/// not this tick; `Err` carries the connect failure reason for logging.
pub fn maybe_dial(
    instance: &mut Instance,
    socket_dir: &Path,
    reconnect_period: u32,
) -> Result<Option<UnixStream>, String> {
    let eligible = !instance.service_connected && instance.running && instance.interface_count() > 0;
    if !eligible {
        return Ok(None);
    }

    instance.service_dial_tick += 1;
    if instance.service_dial_tick % reconnect_period != 1 {
        return Ok(None);
    }

    let Some(pid) = instance.pid else {
        instance.service_connected = false;
        return Ok(None);
    };

    match UnixStream::connect(socket_path(socket_dir, pid)) {
        Ok(stream) => {
            instance.service_connected = true;
            instance.service_dial_tick = 0;
            Ok(Some(stream))
        }
        Err(e) => {
            instance.service_connected = false;
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "dialer_tests.rs"]
mod tests;
