// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `ConfigAdapter` fake (component H), for tests: lets a test
//! push config deltas and read back persisted pids through the same trait
//! surface a real datastore adapter would use.

use parking_lot::Mutex;

use sv_core::config_adapter::{ChangeCallback, ConfigAdapter, ConfigDelta, ConfigError};
use sv_core::registry::InstancePath;
use sv_core::Registry;

pub struct FakeConfigAdapter {
    initial: Mutex<Registry>,
    callback: Mutex<Option<ChangeCallback>>,
    persisted_pids: Mutex<Vec<(InstancePath, i32)>>,
    commits: Mutex<u32>,
}

impl FakeConfigAdapter {
    pub fn new(initial: Registry) -> Self {
        Self {
            initial: Mutex::new(initial),
            callback: Mutex::new(None),
            persisted_pids: Mutex::new(Vec::new()),
            commits: Mutex::new(0),
        }
    }

    /// Drives a registered callback with `delta`, as a real adapter's watch
    /// thread would on a change notification.
    pub fn push(&self, delta: ConfigDelta) {
        if let Some(cb) = self.callback.lock().as_ref() {
            cb(delta);
        }
    }

    pub fn persisted_pids(&self) -> Vec<(InstancePath, i32)> {
        self.persisted_pids.lock().clone()
    }

    pub fn commit_count(&self) -> u32 {
        *self.commits.lock()
    }
}

impl ConfigAdapter for FakeConfigAdapter {
    fn load_initial(&self) -> Result<Registry, ConfigError> {
        Ok(self.initial.lock().clone())
    }

    fn subscribe_changes(&self, cb: ChangeCallback) -> Result<(), ConfigError> {
        *self.callback.lock() = Some(cb);
        Ok(())
    }

    fn persist_pid(&self, path: &InstancePath, pid: i32) -> Result<(), ConfigError> {
        self.persisted_pids.lock().push((path.clone(), pid));
        Ok(())
    }

    fn commit(&self) -> Result<(), ConfigError> {
        *self.commits.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_config_tests.rs"]
mod tests;
