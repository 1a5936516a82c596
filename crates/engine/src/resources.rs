// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource Sampler (component D): reads `/proc/stat` and per-pid
//! `/proc/[pid]/stat` + `/proc/[pid]/status` to derive CPU percentage and
//! memory figures for live instances, without any external crate or
//! `unsafe` access to the procfs ABI.

use std::path::Path;

use sv_core::Instance;

/// Total jiffies spent across all CPUs since boot, summed from the `cpu`
/// line of `/proc/stat`. Tracked across ticks so CPU usage can be expressed
/// as a percentage of the delta rather than an absolute tick count.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceSampler {
    last_total_cpu: u64,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample every live instance's CPU and memory figures for this tick.
    /// Unreadable proc entries (already-exited pid, permission, container
    /// boundary) are skipped silently, matching the best-effort sampling of
    /// the source system: a stats miss here never aborts the tick.
    pub fn sample_all<'a>(&mut self, instances: impl Iterator<Item = &'a mut Instance>) {
        let Some(diff_total_cpu) = self.begin_tick() else {
            return;
        };
        for instance in instances {
            self.sample(instance, diff_total_cpu);
        }
    }

    /// Reads `/proc/stat` once for this tick and returns the jiffy delta
    /// since the last tick, or `None` if it's unreadable or unchanged.
    /// Callers that can't gather a flat `&mut Instance` iterator (the
    /// Registry's nested tree) call this once, then [`Self::sample`] per
    /// instance inside their own traversal.
    pub fn begin_tick(&mut self) -> Option<u64> {
        let new_total_cpu = read_total_cpu_usage(Path::new("/proc/stat"))?;
        let diff_total_cpu = new_total_cpu.saturating_sub(self.last_total_cpu);
        self.last_total_cpu = new_total_cpu;
        if diff_total_cpu == 0 {
            None
        } else {
            Some(diff_total_cpu)
        }
    }

    /// Sample one instance given this tick's jiffy delta (from [`Self::begin_tick`]).
    pub fn sample(&mut self, instance: &mut Instance, diff_total_cpu: u64) {
        if !instance.running {
            return;
        }
        let Some(pid) = instance.pid else { return };
        sample_one(instance, pid, diff_total_cpu);
    }
}

fn sample_one(instance: &mut Instance, pid: i32, diff_total_cpu: u64) {
    if let Some((user_ticks, kernel_ticks, vms)) =
        read_proc_pid_stat(&format!("/proc/{pid}/stat"))
    {
        instance.cpu_pct_user = cpu_pct(user_ticks, instance.cpu_user_ticks, diff_total_cpu);
        instance.cpu_user_ticks = user_ticks;
        instance.cpu_pct_kernel = cpu_pct(kernel_ticks, instance.cpu_kernel_ticks, diff_total_cpu);
        instance.cpu_kernel_ticks = kernel_ticks;
        instance.mem_vms = vms;
    }

    if let Some(rss_kb) = read_vmrss(&format!("/proc/{pid}/status")) {
        instance.mem_rss = rss_kb;
    }
}

fn cpu_pct(new_ticks: u64, last_ticks: u64, diff_total_cpu: u64) -> u64 {
    let delta = new_ticks.saturating_sub(last_ticks);
    ((100u128 * delta as u128) / diff_total_cpu as u128) as u64
}

/// Sums every numeric field on the `cpu` line (user, nice, system, idle, ...).
fn read_total_cpu_usage(path: &Path) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    let line = content.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    Some(fields.filter_map(|f| f.parse::<u64>().ok()).sum())
}

/// Returns (utime, stime, vsize) at fields 14/15/23 of the whitespace-split
/// stat line. The comm field (2nd column) can itself contain spaces inside
/// parens, so we split on the closing paren first and index from there.
fn read_proc_pid_stat(path: &str) -> Option<(u64, u64, u64)> {
    let content = std::fs::read_to_string(path).ok()?;
    let after_comm = content.rsplit_once(')')?.1;
    // `after_comm` starts with the state field, which is column 3 overall;
    // fields[0] here corresponds to stat-file column 3.
    let fields: Vec<&str> = after_comm.split_whitespace().collect();
    let utime = fields.get(14usize.checked_sub(3)?)?.parse().ok()?;
    let stime = fields.get(15usize.checked_sub(3)?)?.parse().ok()?;
    let vsize = fields.get(23usize.checked_sub(3)?)?.parse().ok()?;
    Some((utime, stime, vsize))
}

/// Reads the VmRSS line of `/proc/[pid]/status`, in kilobytes.
fn read_vmrss(path: &str) -> Option<u64> {
    let content = std::fs::read_to_string(path).ok()?;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            return rest.split_whitespace().next()?.parse().ok();
        }
    }
    None
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
