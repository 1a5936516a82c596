// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Manager (component B): fork/exec, signal escalation, reaping,
//! and liveness probing for non-child (adopted) instances.

use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use sv_core::registry::InstancePath;
use sv_core::{Clock, Instance};

use crate::error::EngineError;

/// Owns the `std::process::Child` handles for instances this supervisor
/// forked itself, keyed by [`InstancePath`]. `Instance` stays plain data
/// with no owned OS resources (per the design notes on static/owned
/// buffers); this side-table is where the actual handle lives.
#[derive(Default)]
pub struct ProcessManager {
    children: std::collections::HashMap<InstancePath, Child>,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start(instance) per 4.B: pre-open stdout/stderr log files, fork+exec
    /// with a detached session so parent-directed signals don't reach the
    /// child, and record the resulting pid on success.
    pub fn start(
        &mut self,
        path: &InstancePath,
        instance: &mut Instance,
        executable: &Path,
        logs_dir: &Path,
        clock: &dyn Clock,
    ) -> Result<(), EngineError> {
        let instances_dir = logs_dir.join("instances");
        if let Err(e) = std::fs::create_dir_all(&instances_dir) {
            return Err(EngineError::Spawn {
                path: path.to_string(),
                source: e,
            });
        }

        let stdout_path = instances_dir.join(format!("{}_stdout", instance.name));
        let stderr_path = instances_dir.join(format!("{}_stderr", instance.name));

        let stdout = open_append(&stdout_path).map_err(|e| EngineError::Spawn {
            path: path.to_string(),
            source: e,
        })?;
        let stderr = open_append(&stderr_path).map_err(|e| EngineError::Spawn {
            path: path.to_string(),
            source: e,
        })?;

        let args: Vec<&String> = instance.exec_argv.iter().skip(1).collect();

        // process_group(0) detaches into a new session/process group, the
        // safe-code equivalent of the original's setsid() call: signals
        // targeted at the supervisor's own group no longer reach the child.
        let mut command = Command::new(executable);
        command.args(args).stdout(stdout).stderr(stderr);
        command.process_group(0);

        match command.spawn() {
            Ok(child) => {
                let pid = child.id() as i32;
                instance.pid = Some(pid);
                instance.is_our_child = true;
                instance.running = true;
                instance.last_start_time = Some(clock.now());
                instance.sigint_sent_at = None;
                self.children.insert(path.clone(), child);
                Ok(())
            }
            Err(e) => Err(EngineError::Spawn {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// SignalPhaseA (4.B): graceful SIGINT for live, disabled instances that
    /// haven't been signalled yet this stop sequence.
    pub fn signal_phase_a(
        &self,
        path: &InstancePath,
        instance: &mut Instance,
        clock: &dyn Clock,
    ) -> Result<bool, EngineError> {
        if !(instance.is_live() && !instance.enabled) || instance.sigint_sent_at.is_some() {
            return Ok(false);
        }
        let pid = instance.pid.expect("is_live() guarantees pid.is_some()");
        send_signal(path, pid, Signal::SIGINT)?;
        instance.sigint_sent_at = Some(clock.now());
        Ok(true)
    }

    /// SignalPhaseB (4.B): forceful SIGKILL once the grace window has
    /// elapsed since SIGINT was sent and the instance is still live.
    pub fn signal_phase_b(
        &self,
        path: &InstancePath,
        instance: &mut Instance,
        clock: &dyn Clock,
        grace: std::time::Duration,
    ) -> Result<bool, EngineError> {
        let Some(sent_at) = instance.sigint_sent_at else {
            return Ok(false);
        };
        if !instance.is_live() || clock.now().duration_since(sent_at) < grace {
            return Ok(false);
        }
        let pid = instance.pid.expect("is_live() guarantees pid.is_some()");
        send_signal(path, pid, Signal::SIGKILL)?;
        Ok(true)
    }

    /// LivenessRefresh (4.B): reap our own children non-blockingly; probe
    /// adopted (non-child) instances with `kill(pid, 0)`.
    pub fn refresh_liveness(&mut self, path: &InstancePath, instance: &mut Instance) -> bool {
        let Some(pid) = instance.pid else {
            return false;
        };

        if instance.is_our_child {
            if let Some(child) = self.children.get_mut(path) {
                match child.try_wait() {
                    Ok(Some(_status)) => {
                        self.children.remove(path);
                        instance.running = false;
                        instance.pid = None;
                        instance.service_connected = false;
                        return true;
                    }
                    Ok(None) => return false,
                    Err(_) => return false,
                }
            }
            // Our own child but no handle (e.g. after a restart within the
            // same process) - fall through to the waitpid-based probe.
            match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(_) => false,
                Ok(_) => {
                    instance.running = false;
                    instance.pid = None;
                    instance.service_connected = false;
                    true
                }
            }
        } else {
            match kill(Pid::from_raw(pid), None) {
                Ok(()) => false,
                Err(nix::Error::ESRCH) => {
                    instance.running = false;
                    instance.pid = None;
                    instance.service_connected = false;
                    true
                }
                Err(_) => false,
            }
        }
    }
}

fn send_signal(_path: &InstancePath, pid: i32, signal: Signal) -> Result<(), EngineError> {
    kill(Pid::from_raw(pid), signal).map_err(|source| EngineError::Signal { pid, source })
}

fn open_append(path: &PathBuf) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
