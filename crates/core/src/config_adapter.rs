// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External Config Adapter contract (component H), consumed-only: the
//! datastore that owns the group/module/instance tree is an external
//! collaborator. This module defines only the narrow interface the
//! Reconciliation Loop calls into it through.
//!
//! `ProvideStats` from the specification — the adapter serving a
//! read-subscription back out to the datastore — is the *adapter's own*
//! external-facing surface, not something the core calls, so it is not part
//! of this trait. A concrete adapter implements it however it needs to,
//! typically by holding a clone of the same locked registry handle the
//! Reconciliation Loop holds.

use thiserror::Error;

use crate::registry::{InstancePath, Registry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load initial configuration: {0}")]
    Load(String),
    #[error("failed to persist pid for {path}: {reason}")]
    PersistPid { path: String, reason: String },
    #[error("commit failed: {0}")]
    Commit(String),
}

/// A delta applied to the Registry under the config lock, as reported by a
/// change callback from the adapter.
#[derive(Debug, Clone)]
pub enum ConfigDelta {
    UpsertGroup(crate::model::Group),
    RemoveGroup(String),
    UpsertInstance {
        group: String,
        module: String,
        instance: crate::model::Instance,
    },
    RemoveInstance(InstancePath),
}

/// Invoked by the adapter, under the config lock, whenever the external
/// datastore reports a change. The adapter is responsible for taking the
/// lock before calling this — the core only describes the delta shape.
pub type ChangeCallback = Box<dyn Fn(ConfigDelta) + Send + Sync>;

/// The narrow interface the core consumes from the configuration source.
pub trait ConfigAdapter: Send + Sync {
    /// Populate the registry before the reconciliation loop starts.
    fn load_initial(&self) -> Result<Registry, ConfigError>;

    /// Register a callback to be invoked on every subsequent change. The
    /// adapter owns the notification mechanism (file watch, datastore
    /// subscription, ...); this call only hands it the delta shape to emit.
    fn subscribe_changes(&self, cb: ChangeCallback) -> Result<(), ConfigError>;

    /// Save `pid` as the last-known pid for `path`, for adoption by the next
    /// supervisor incarnation (the SIGQUIT path).
    fn persist_pid(&self, path: &InstancePath, pid: i32) -> Result<(), ConfigError>;

    /// Flush any pids persisted since the last commit.
    fn commit(&self) -> Result<(), ConfigError>;
}

#[cfg(test)]
#[path = "config_adapter_tests.rs"]
mod tests;
