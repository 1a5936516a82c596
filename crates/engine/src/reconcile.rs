// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation Loop (component G): the single-threaded tick that
//! orchestrates the Process Manager, Restart Governor, Resource Sampler,
//! Service-Socket Dialer and Stats Protocol Client under the config lock.

use std::collections::HashMap;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use sv_core::registry::InstancePath;
use sv_core::{Clock, ConfigAdapter, InstanceEvent, Registry};

use crate::dialer;
use crate::process::ProcessManager;
use crate::resources::ResourceSampler;
use crate::restart::{self, RestartDecision};
use crate::stats_client;

/// Tunables the loop needs every tick; gathered once at construction from
/// [`crate::env`] so a single tick doesn't re-read environment variables.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub tick_period: Duration,
    pub grace_period: Duration,
    pub restart_window: Duration,
    pub dial_period_ticks: u32,
    pub protocol_retries: u32,
    pub protocol_retry_interval: Duration,
    pub sockets_dir: PathBuf,
    pub logs_dir: PathBuf,
}

/// What to do with live instances when the loop is asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Signal everything to exit (normal shutdown).
    TerminateAll,
    /// Leave instances running and persist their pids for the next
    /// supervisor incarnation to adopt (the SIGQUIT path).
    Adopt,
}

pub struct Supervisor {
    registry: Arc<Mutex<Registry>>,
    adapter: Box<dyn ConfigAdapter>,
    process: ProcessManager,
    sampler: ResourceSampler,
    clock: Box<dyn Clock>,
    sockets: HashMap<InstancePath, UnixStream>,
    config: SupervisorConfig,
    stop: Arc<AtomicBool>,
    shutdown_mode: Arc<Mutex<ShutdownMode>>,
}

impl Supervisor {
    pub fn new(
        adapter: Box<dyn ConfigAdapter>,
        clock: Box<dyn Clock>,
        config: SupervisorConfig,
    ) -> Result<Self, sv_core::ConfigError> {
        let registry = Arc::new(Mutex::new(adapter.load_initial()?));

        // H mutates A asynchronously: the adapter's change notifications
        // (a datastore watch thread, typically) apply under the same lock
        // the Reconciliation Loop holds during a tick (invariant I5).
        let callback_registry = Arc::clone(&registry);
        adapter.subscribe_changes(Box::new(move |delta: sv_core::ConfigDelta| {
            callback_registry.lock().apply_delta(delta);
        }))?;

        Ok(Self {
            registry,
            adapter,
            process: ProcessManager::new(),
            sampler: ResourceSampler::new(),
            clock,
            sockets: HashMap::new(),
            config,
            stop: Arc::new(AtomicBool::new(false)),
            shutdown_mode: Arc::new(Mutex::new(ShutdownMode::TerminateAll)),
        })
    }

    /// A clone-able handle a signal handler can flip to ask the loop to stop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// A clone-able handle a signal handler uses to record which shutdown
    /// mode it observed (terminate on SIGINT/SIGTERM, adopt on SIGQUIT)
    /// before flipping the stop handle. Defaults to [`ShutdownMode::TerminateAll`]
    /// if the stop handle is ever set without a mode being recorded first.
    pub fn shutdown_mode_handle(&self) -> Arc<Mutex<ShutdownMode>> {
        Arc::clone(&self.shutdown_mode)
    }

    /// Runs ticks until `stop_handle()` is set, sleeping `tick_period`
    /// between them, then shuts down using whatever mode was last recorded
    /// on `shutdown_mode_handle()`.
    pub fn run_until_stopped(&mut self) {
        while !self.stop.load(Ordering::SeqCst) {
            self.tick();
            std::thread::sleep(self.config.tick_period);
        }
        let mode = *self.shutdown_mode.lock();
        self.shutdown(mode);
    }

    /// One reconciliation pass: B (start/stop), C (restart governor), D
    /// (resource sampling), E (dial), F (stats), all under the config lock.
    pub fn tick(&mut self) {
        tracing::debug!("tick start");
        let mut registry = self.registry.lock();
        let diff_total_cpu = self.sampler.begin_tick();

        let process = &mut self.process;
        let sampler = &mut self.sampler;
        let sockets = &mut self.sockets;
        let clock: &dyn Clock = &*self.clock;
        let grace = self.config.grace_period;
        let window = self.config.restart_window;
        let dial_period = self.config.dial_period_ticks;
        let sockets_dir = &self.config.sockets_dir;
        let logs_dir = &self.config.logs_dir;
        let retries = self.config.protocol_retries;
        let retry_interval = self.config.protocol_retry_interval;

        registry.for_each_instance_mut_with_executable(|path, group_enabled, instance, exe| {
            let should_run = group_enabled && instance.enabled;

            if should_run && !instance.running {
                match restart::evaluate(instance, clock, window) {
                    RestartDecision::Start => {
                        match process.start(path, instance, exe, logs_dir, clock) {
                            Ok(()) => {
                                tracing::info!(target: "instances_events", event = %InstanceEvent::started(path, instance.pid.unwrap_or(0)).to_log_line());
                            }
                            Err(e) => {
                                tracing::warn!(target: "instances_events", event = %InstanceEvent::fork_failed(path, e.to_string()).to_log_line());
                            }
                        }
                    }
                    RestartDecision::LimitReached => {
                        tracing::warn!(target: "instances_events", event = %InstanceEvent::restart_limit_reached(path).to_log_line());
                    }
                }
            }

            if !should_run && instance.is_live() {
                if process.signal_phase_a(path, instance, clock).unwrap_or(false) {
                    tracing::info!(target: "instances_events", event = %InstanceEvent::sigint_sent(path).to_log_line());
                }
                if process
                    .signal_phase_b(path, instance, clock, grace)
                    .unwrap_or(false)
                {
                    tracing::info!(target: "instances_events", event = %InstanceEvent::sigkill_sent(path).to_log_line());
                }
            }

            if process.refresh_liveness(path, instance) {
                sockets.remove(path);
                tracing::info!(target: "instances_events", event = %InstanceEvent::reaped(path).to_log_line());
            }

            if let Some(diff) = diff_total_cpu {
                sampler.sample(instance, diff);
            }

            match dialer::maybe_dial(instance, sockets_dir, dial_period) {
                Ok(Some(stream)) => {
                    sockets.insert(path.clone(), stream);
                    tracing::info!(target: "instances_events", event = %InstanceEvent::dialed(path).to_log_line());
                }
                Ok(None) => {}
                Err(reason) => {
                    tracing::warn!(target: "instances_events", event = %InstanceEvent::dial_failed(path, reason).to_log_line());
                }
            }
        });

        poll_stats(sockets, &mut registry, retries, retry_interval);
        tracing::debug!("tick end");
    }

    fn shutdown(&mut self, mode: ShutdownMode) {
        let mut registry = self.registry.lock();
        let process = &mut self.process;
        let adapter = self.adapter.as_ref();
        let clock: &dyn Clock = &*self.clock;

        registry.for_each_instance_mut(|path, _group_enabled, instance| {
            if !instance.is_live() {
                return;
            }
            match mode {
                ShutdownMode::TerminateAll => {
                    instance.enabled = false;
                    process.signal_phase_a(path, instance, clock).ok();
                }
                ShutdownMode::Adopt => {
                    if let Some(pid) = instance.pid {
                        match adapter.persist_pid(path, pid) {
                            Ok(()) => {
                                tracing::info!(event = %InstanceEvent::adopted(path, pid).to_log_line());
                            }
                            Err(e) => tracing::warn!(%path, error = %e, "failed to persist pid"),
                        }
                    }
                }
            }
        });

        if mode == ShutdownMode::Adopt {
            if let Err(e) = adapter.commit() {
                tracing::warn!("failed to commit persisted pids: {e}");
            }
        }
    }
}

/// Phase F, run as a genuine two-pass sweep over the connected-instance set:
/// every GET goes out before any reply is awaited, so a stall on one
/// instance's reply doesn't push back the send to the next one. Without
/// this, N connected instances under a stall would each pay the full retry
/// budget serially instead of amortizing it across the set.
fn poll_stats(
    sockets: &mut HashMap<InstancePath, UnixStream>,
    registry: &mut Registry,
    retries: u32,
    retry_interval: Duration,
) {
    let connected: Vec<InstancePath> = sockets
        .keys()
        .filter(|path| {
            registry
                .get_instance(path)
                .is_some_and(|i| i.service_connected)
        })
        .cloned()
        .collect();

    let mut awaiting = Vec::with_capacity(connected.len());
    for path in connected {
        let Some(stream) = sockets.get_mut(&path) else {
            continue;
        };
        match stats_client::send_get(stream, &path.to_string(), retries, retry_interval) {
            Ok(()) => awaiting.push(path),
            Err(e) => {
                tracing::warn!(target: "instances_events", event = %InstanceEvent::disconnected(&path, e.to_string()).to_log_line());
                if let Some(instance) = registry.get_instance_mut(&path) {
                    instance.service_connected = false;
                }
                sockets.remove(&path);
            }
        }
    }

    for path in awaiting {
        let Some(stream) = sockets.get_mut(&path) else {
            continue;
        };
        let disconnect = match stats_client::recv_stats(stream, &path.to_string(), retries, retry_interval) {
            Ok(payload) => match registry.get_instance_mut(&path) {
                Some(instance) => match sv_core::stats::apply_stats(instance, &payload) {
                    Ok(()) => {
                        tracing::info!(
                            target: "instances_stats",
                            %path,
                            payload = %serde_json::to_string(&payload).unwrap_or_default(),
                            "stats applied"
                        );
                        false
                    }
                    Err(e) => {
                        tracing::warn!(%path, error = %e, "rejected stats payload");
                        true
                    }
                },
                None => false,
            },
            Err(e) => {
                tracing::warn!(target: "instances_events", event = %InstanceEvent::disconnected(&path, e.to_string()).to_log_line());
                true
            }
        };
        if disconnect {
            if let Some(instance) = registry.get_instance_mut(&path) {
                instance.service_connected = false;
            }
            sockets.remove(&path);
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
