// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Group -> Module -> Instance configuration/observation tree.
//!
//! Ownership is nested (Group owns Modules owns Instances) rather than
//! pointer-linked, so there is no back-reference from an Instance to its
//! Module or a Module to its Group. Code that needs a parent's attributes
//! (e.g. "is my group enabled?") walks down from the `Registry` instead of
//! following a stored pointer.

use std::path::PathBuf;
use std::time::Instant;

use indexmap::IndexMap;

/// One configured input interface of a worker instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputInterface {
    pub id: String,
    pub ifc_type: u8,
    pub ifc_state: u8,
    pub recv_msg: u64,
    pub recv_buf: u64,
}

impl InputInterface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// One configured output interface of a worker instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputInterface {
    pub id: String,
    pub ifc_type: u8,
    pub sent_msg: u64,
    pub sent_buf: u64,
    pub dropped_msg: u64,
    pub autoflush: u64,
    pub num_clients: u32,
}

impl OutputInterface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// A worker instance: one running copy of a `Module`'s executable.
#[derive(Debug, Clone)]
pub struct Instance {
    pub name: String,
    /// argv for exec; argv[0] is conventionally the instance name.
    pub exec_argv: Vec<String>,
    /// Desired run state, as configured.
    pub enabled: bool,
    pub max_restarts_per_minute: u32,

    // --- Process Manager state (component B) ---
    pub is_our_child: bool,
    pub pid: Option<i32>,
    pub running: bool,
    pub last_start_time: Option<Instant>,
    pub sigint_sent_at: Option<Instant>,

    // --- Restart Governor state (component C) ---
    pub restart_window_start: Option<Instant>,
    pub restarts_in_window: u32,

    // --- configured interfaces ---
    pub input_interfaces: Vec<InputInterface>,
    pub output_interfaces: Vec<OutputInterface>,

    // --- Service-Socket Dialer / Stats Protocol Client state (D/E/F) ---
    pub service_connected: bool,
    pub service_dial_tick: u32,

    // --- Resource Sampler state (component D) ---
    pub cpu_user_ticks: u64,
    pub cpu_kernel_ticks: u64,
    pub cpu_pct_user: u64,
    pub cpu_pct_kernel: u64,
    pub mem_vms: u64,
    pub mem_rss: u64,
}

impl Instance {
    pub fn new(name: impl Into<String>, exec_argv: Vec<String>) -> Self {
        Self {
            name: name.into(),
            exec_argv,
            enabled: false,
            max_restarts_per_minute: 10,
            is_our_child: false,
            pid: None,
            running: false,
            last_start_time: None,
            sigint_sent_at: None,
            restart_window_start: None,
            restarts_in_window: 0,
            input_interfaces: Vec::new(),
            output_interfaces: Vec::new(),
            service_connected: false,
            service_dial_tick: 0,
            cpu_user_ticks: 0,
            cpu_kernel_ticks: 0,
            cpu_pct_user: 0,
            cpu_pct_kernel: 0,
            mem_vms: 0,
            mem_rss: 0,
        }
    }

    /// Number of configured interfaces (in + out); used to gate dialing (4.E)
    /// and to validate stats responses (4.F / invariant I3).
    pub fn interface_count(&self) -> usize {
        self.input_interfaces.len() + self.output_interfaces.len()
    }

    /// Invariant I1: running implies a positive pid.
    pub fn is_live(&self) -> bool {
        self.running && self.pid.is_some()
    }
}

/// One executable definition; owns the instances running copies of it.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub executable: PathBuf,
    pub instances: IndexMap<String, Instance>,
}

impl Module {
    pub fn new(name: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            executable: executable.into(),
            instances: IndexMap::new(),
        }
    }
}

/// A named, independently enable/disable-able collection of modules.
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub enabled: bool,
    pub modules: IndexMap<String, Module>,
}

impl Group {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
            modules: IndexMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
